mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "testit-cli")]
#[command(about = "TestIt CLI - Run programs and test cases through the execution engine locally", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a source file once and print its output
    Run {
        /// Path to the source file
        #[arg(short, long)]
        file: String,

        /// Language (java, python, javascript, cpp)
        #[arg(short, long)]
        language: String,

        /// String to feed the program on stdin
        #[arg(short, long)]
        stdin: Option<String>,

        /// Wall-clock timeout in milliseconds
        #[arg(short, long, default_value = "3000")]
        timeout: u64,
    },

    /// Run a source file against a JSON file of test cases
    Test {
        /// Path to the source file
        #[arg(short, long)]
        file: String,

        /// Language (java, python, javascript, cpp)
        #[arg(short, long)]
        language: String,

        /// Path to a JSON array of {"input", "expectedOutput"} objects
        #[arg(short, long)]
        cases: String,
    },

    /// List supported languages
    Langs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            language,
            stdin,
            timeout,
        } => {
            commands::run_once(&file, &language, stdin.as_deref(), timeout).await?;
        }
        Commands::Test {
            file,
            language,
            cases,
        } => {
            commands::run_cases(&file, &language, &cases).await?;
        }
        Commands::Langs => {
            commands::list_languages();
        }
    }

    Ok(())
}
