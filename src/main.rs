mod backend_client;
mod cli;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::backend_client::BackendClient;
use crate::cli::session::SessionContext;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Message to send to the assistant without starting a session
    #[arg(short, long)]
    input: Option<String>,

    /// Base URL of the SugarSense backend (overrides SUGARSENSE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an assistant session
    Chat {
        /// Message to send to the assistant without starting a session
        #[arg(short, long)]
        input: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let verbose = match &cli.command {
        Some(Commands::Chat { verbose, .. }) => *verbose,
        None => cli.verbose,
    };

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Starting SugarSense CLI");

    let backend = match BackendClient::new(cli.api_url.as_deref()) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Failed to initialize backend client: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let input = match cli.command {
        Some(Commands::Chat { input, .. }) => input.or(cli.input),
        None => cli.input,
    };

    let mut session = SessionContext::new(backend, Box::new(io::stdout()), input, true);
    session.run().await
}
