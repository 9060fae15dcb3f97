pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "practice")]
#[command(about = "Practice CLI - operator probes for a running Practice API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Probe the public and protected surface of a deployment")]
    Smoke {
        #[arg(long, env = "PRACTICE_API_URL", default_value = "http://localhost:3000", help = "API base URL")]
        base_url: String,
        #[arg(long, env = "PRACTICE_API_TOKEN", help = "Bearer token; protected routes must then return 200")]
        token: Option<String>,
    },

    #[command(about = "Print the API /health payload")]
    Health {
        #[arg(long, env = "PRACTICE_API_URL", default_value = "http://localhost:3000", help = "API base URL")]
        base_url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Smoke { base_url, token } => commands::smoke::handle(&base_url, token.as_deref(), output_format).await,
        Commands::Health { base_url } => commands::health::handle(&base_url, output_format).await,
    }
}
