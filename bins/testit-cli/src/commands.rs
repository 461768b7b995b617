// CLI commands driving the execution engine locally
use anyhow::{bail, Context, Result};
use std::fs;
use testit_common::types::{Language, TestCase, TestStatus};
use testit_engine::job::Job;
use testit_engine::workspace::Workspace;
use testit_engine::{batch, language, supervisor, EngineConfig};

fn parse_language(name: &str) -> Result<Language> {
    match Language::from_str(name) {
        Some(language) => Ok(language),
        None => bail!(
            "Unknown language '{}'. Valid options: java, python, javascript, cpp",
            name
        ),
    }
}

/// Execute a source file once, printing stdout/stderr and the exit status.
pub async fn run_once(
    file: &str,
    language_name: &str,
    stdin: Option<&str>,
    timeout_ms: u64,
) -> Result<()> {
    let language = parse_language(language_name)?;
    let code = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;

    let config = EngineConfig::from_env();
    let job = Job::new(language);
    let plan = language::resolve(language, &code);

    let workspace = Workspace::acquire(&config.scratch_root, job.id).await?;
    workspace.write_source(&plan.entry_filename, &code).await?;

    let output = match supervisor::execute(&plan, workspace.dir(), stdin, timeout_ms).await {
        Ok(output) => output,
        Err(e) => {
            workspace.release().await;
            return Err(e);
        }
    };
    workspace.release().await;

    if output.compile_failed {
        println!("✗ Compilation failed");
        println!("{}", output.stderr);
        std::process::exit(1);
    }

    if !output.stdout.is_empty() {
        print!("{}", output.stdout);
    }
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }

    if output.timed_out {
        println!("✗ Time limit exceeded after {}ms", output.execution_time_ms);
        std::process::exit(1);
    }

    println!(
        "→ Exited with code {:?} in {}ms",
        output.exit_code, output.execution_time_ms
    );
    if output.runtime_error() {
        std::process::exit(1);
    }
    Ok(())
}

/// Run a source file against a JSON test-case file and print verdicts.
pub async fn run_cases(file: &str, language_name: &str, cases_path: &str) -> Result<()> {
    let language = parse_language(language_name)?;
    let code = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;

    let content = fs::read_to_string(cases_path)
        .with_context(|| format!("Failed to read {}", cases_path))?;
    let cases: Vec<TestCase> =
        serde_json::from_str(&content).context("Failed to parse test cases JSON")?;
    if cases.is_empty() {
        bail!("Test case file is empty");
    }

    let config = EngineConfig::from_env();
    let results = batch::run_all(&config, &code, language, &cases).await;

    let mut passed = 0;
    for (idx, result) in results.iter().enumerate() {
        let marker = match result.status {
            TestStatus::Passed => {
                passed += 1;
                "✓"
            }
            TestStatus::Failed => "✗",
            TestStatus::Error => "✗",
            TestStatus::TimedOut => "⏱",
        };
        println!(
            "{} Test {} ({:?}, {}ms)",
            marker,
            idx + 1,
            result.status,
            result.execution_time
        );
        if result.status == TestStatus::Failed {
            println!("    Expected: {:?}", result.expected_output.trim());
            println!("    Got:      {:?}", result.actual_output.trim());
        }
        if !result.error_message.is_empty() {
            println!(
                "    {}",
                result.error_message.lines().next().unwrap_or_default()
            );
        }
    }

    println!();
    println!("→ {} / {} passed", passed, results.len());
    if passed != results.len() {
        std::process::exit(1);
    }
    Ok(())
}

pub fn list_languages() {
    for language in Language::all() {
        println!("{}", language);
    }
}
