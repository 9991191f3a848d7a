mod commands;

use anyhow::Result;
use arbiter_common::RunMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arbiter-cli")]
#[command(about = "Arbiter CLI - Evaluate submissions and inspect generated harnesses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a source file against a problem using the configured engine
    Run {
        /// Problem reference (id in the problems file)
        #[arg(short, long)]
        problem: String,

        /// Language name (e.g., python, java, cpp)
        #[arg(short, long)]
        language: String,

        /// Path to the source file
        #[arg(short, long)]
        source: PathBuf,

        /// Evaluate every test case instead of the samples only
        #[arg(long, default_value = "false")]
        submit: bool,

        /// Print the verdict as JSON
        #[arg(long, default_value = "false")]
        json: bool,

        /// Problems file (defaults to PROBLEMS_PATH or config/problems.json)
        #[arg(long)]
        problems: Option<PathBuf>,
    },

    /// Print the program generated for one input
    Harness {
        /// Language name
        #[arg(short, long)]
        language: String,

        /// Function or method to call
        #[arg(short, long)]
        entry: String,

        /// Raw input literal (e.g., "[1,2,3], 4")
        #[arg(short, long)]
        input: String,

        /// Path to the source file
        #[arg(short, long)]
        source: PathBuf,
    },

    /// List supported languages and their engine ids
    Langs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            problem,
            language,
            source,
            submit,
            json,
            problems,
        } => {
            let mode = if submit { RunMode::Submit } else { RunMode::Run };
            commands::run_submission(&problem, &language, &source, mode, json, problems.as_deref())
                .await?;
        }
        Commands::Harness {
            language,
            entry,
            input,
            source,
        } => {
            commands::print_harness(&language, &entry, &input, &source)?;
        }
        Commands::Langs => {
            commands::list_languages();
        }
    }

    Ok(())
}
