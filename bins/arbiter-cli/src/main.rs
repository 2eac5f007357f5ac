mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arbiter-cli")]
#[command(about = "Arbiter CLI - Evaluate submissions locally and manage problems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a source file against a problem file
    Run {
        /// Problem JSON file (one problem or an array)
        #[arg(short, long)]
        problem: PathBuf,

        /// Problem id, required when the file holds several problems
        #[arg(long)]
        id: Option<String>,

        /// Source file to submit
        #[arg(short, long)]
        code: PathBuf,

        /// Language (e.g., python3, java, cpp17)
        #[arg(short, long, default_value = "python3")]
        language: String,

        /// Print the full report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Import problems from a JSON file into Redis
    Import {
        /// Problem JSON file (one problem or an array)
        #[arg(short, long)]
        problem: PathBuf,

        /// Redis URL
        #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
        redis_url: String,
    },

    /// Show the normalized form of some output, optionally comparing it
    Normalize {
        /// Raw output text
        text: String,

        /// Expected output to compare against
        #[arg(long)]
        expected: Option<String>,
    },

    /// List configured languages
    Languages {
        /// Language table
        #[arg(long, default_value = "config/languages.json")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            problem,
            id,
            code,
            language,
            json,
        } => {
            commands::run_submission(&problem, id.as_deref(), &code, &language, json).await?;
        }
        Commands::Import { problem, redis_url } => {
            commands::import_problems(&problem, &redis_url).await?;
        }
        Commands::Normalize { text, expected } => {
            commands::normalize_output(&text, expected.as_deref());
        }
        Commands::Languages { config } => {
            commands::list_languages(&config)?;
        }
    }

    Ok(())
}
