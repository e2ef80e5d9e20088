mod cli;
mod commands;
mod ui;

use anyhow::Result;
use boxart_lib::logging::initialize_logging;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    initialize_logging();
    let cli = Cli::parse();
    cli.run().await
}
