use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Context, Result};
use boxart_lib::config::Config;
use clap::{Args, Subcommand};
use std::fs;
use std::path::Path;

#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    pub action: Option<CacheAction>,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show cache size and location
    Info,
    /// Delete all cached box art
    Clear,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CacheUsage {
    files: usize,
    bytes: u64,
}

impl CacheCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = Config::setup(global_args.datadir.as_deref())?;

        match self.action {
            Some(CacheAction::Clear) => clear_cache(&config.cache_dir)?,
            Some(CacheAction::Info) | None => show_cache_info(&config.cache_dir)?,
        }

        Ok(())
    }
}

fn clear_cache(cache_dir: &Path) -> Result<()> {
    let usage = cache_usage(cache_dir)?;
    if usage.files == 0 {
        ui::success("Cache is already empty");
        return Ok(());
    }

    ui::info(&format!(
        "Clearing {} box art files ({})...",
        usage.files,
        format_size(usage.bytes)
    ));

    for entry in fs::read_dir(cache_dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }

    ui::success("Cache cleared successfully");
    Ok(())
}

fn show_cache_info(cache_dir: &Path) -> Result<()> {
    ui::info(&format!("Cache location: {}", cache_dir.display()));

    let usage = cache_usage(cache_dir)?;
    if usage.files == 0 {
        ui::info("Cache is empty");
    } else {
        ui::info(&format!("Cache size: {}", format_size(usage.bytes)));
        ui::info(&format!("Cached box art: {}", usage.files));
        ui::tip("Run `boxart cache clear` to free up space");
    }

    Ok(())
}

fn cache_usage(cache_dir: &Path) -> Result<CacheUsage> {
    let mut usage = CacheUsage::default();
    if !cache_dir.exists() {
        return Ok(usage);
    }

    for entry in fs::read_dir(cache_dir)? {
        let path = entry?.path();
        if path.is_file() {
            usage.files += 1;
            usage.bytes += fs::metadata(&path)?.len();
        }
    }

    Ok(usage)
}

fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
