//! FounderFuel CLI: landing-page critiques and content repurposing from the
//! terminal.
//!
//! Shares pipelines and storage with `founderfuel-server`, so history written
//! by one is visible to the other.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
