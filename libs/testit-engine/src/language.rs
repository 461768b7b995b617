//! Language adapter: maps a language tag to an entry filename, an optional
//! compile command, and a run command. All commands are argv vectors executed
//! with the Job's workspace as working directory; nothing references a path
//! outside the workspace.

use lazy_static::lazy_static;
use regex::Regex;
use testit_common::types::Language;

lazy_static! {
    static ref JAVA_PUBLIC_CLASS: Regex =
        Regex::new(r"public\s+class\s+(\w+)").expect("valid class-name pattern");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub entry_filename: String,
    /// Present only for compiled languages; must succeed before `run` is
    /// ever spawned.
    pub compile: Option<Vec<String>>,
    pub run: Vec<String>,
}

/// Resolve a language + source text into a concrete command plan.
///
/// Never fails: an unresolvable Java class name degrades to `Main` rather
/// than failing the Job.
pub fn resolve(language: Language, source: &str) -> CommandPlan {
    match language {
        Language::Java => {
            let class = java_class_name(source);
            CommandPlan {
                entry_filename: format!("{}.java", class),
                compile: Some(argv(&["javac", &format!("{}.java", class)])),
                run: argv(&["java", "-cp", ".", &class]),
            }
        }
        Language::Python => CommandPlan {
            entry_filename: "Main.py".to_string(),
            compile: None,
            // -u keeps output unbuffered so interactive sessions stream live
            run: argv(&["python3", "-u", "Main.py"]),
        },
        Language::Javascript => CommandPlan {
            entry_filename: "Main.js".to_string(),
            compile: None,
            run: argv(&["node", "Main.js"]),
        },
        Language::Cpp => CommandPlan {
            entry_filename: "Main.cpp".to_string(),
            compile: Some(argv(&["g++", "Main.cpp", "-o", "Main"])),
            run: argv(&["./Main"]),
        },
    }
}

/// Best-effort extraction of the declared public class name. Java requires
/// the file to be named after it.
fn java_class_name(source: &str) -> String {
    JAVA_PUBLIC_CLASS
        .captures(source)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "Main".to_string())
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
