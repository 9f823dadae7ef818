//! rlens - Repository insight CLI
//!
//! Fetches GitHub repository metadata and sequences AI narrative insights,
//! rendered as terminal text.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("rlens=info".parse()?)
                .add_directive("rlens_core=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = rlens_core::Config::load()?;

    // Execute command
    match cli.command {
        Commands::Report(args) => commands::report::execute(args, &config).await,
        Commands::Compare(args) => commands::compare::execute(args, &config).await,
        Commands::Doctor => commands::doctor::execute(&config).await,
        Commands::Version => {
            println!("rlens {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
