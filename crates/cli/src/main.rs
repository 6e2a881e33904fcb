//! FISO CLI
//!
//! A command-line tool for probing cloud providers, reading recommendations
//! and cost trends, and asking the optimizer questions.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{history, providers, status};

/// FISO multi-cloud cost optimizer CLI
#[derive(Parser)]
#[command(name = "fiso")]
#[command(author, version, about = "CLI for the FISO multi-cloud cost optimizer", long_about = None)]
pub struct Cli {
    /// API endpoint URL (falls back to ~/.config/fiso/config.json, then http://localhost:8080)
    #[arg(long, env = "FISO_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a probe round against every configured provider
    Probe,

    /// Show the recommended provider with all ranked options
    Recommend,

    /// Show cost trends over the retained history
    Trends,

    /// Show retained measurements
    History {
        /// Filter by provider (aws, azure, gcp)
        #[arg(long, short)]
        provider: Option<String>,

        /// Maximum number of entries
        #[arg(long, short, default_value_t = 20)]
        limit: usize,
    },

    /// Ask a question such as "which provider is cheapest?"
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show server health
    Health,
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;

    match cli.command {
        Commands::Probe => providers::probe(&client, cli.format).await?,
        Commands::Recommend => providers::recommend(&client, cli.format).await?,
        Commands::Trends => history::trends(&client, cli.format).await?,
        Commands::History { provider, limit } => {
            history::history(&client, provider, limit, cli.format).await?
        }
        Commands::Ask { question } => {
            providers::ask(&client, &question.join(" "), cli.format).await?
        }
        Commands::Health => status::health(&client, cli.format).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
