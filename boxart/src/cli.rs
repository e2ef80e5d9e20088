use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{cache::CacheCommand, fetch::FetchCommand, path::PathCommand};

#[derive(Parser)]
#[command(name = "boxart")]
#[command(about = "Fetch and cache box art from a game-streaming host")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[derive(clap::Args, Clone)]
pub struct GlobalArgs {
    /// Use a different location for boxart's data, where the cache and settings are kept
    #[arg(long, global = true)]
    pub datadir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download box art for every app of a host
    Fetch(FetchCommand),

    /// Show where an app's box art is cached
    Path(PathCommand),

    /// Manage the box art cache
    Cache(CacheCommand),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Fetch(cmd) => cmd.run(self.global_args).await,
            Commands::Path(cmd) => cmd.run(self.global_args).await,
            Commands::Cache(cmd) => cmd.run(self.global_args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use clap::CommandFactory;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }
}
