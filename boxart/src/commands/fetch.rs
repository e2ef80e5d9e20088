use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Context, Result};
use boxart_lib::cache_store::FsCacheStore;
use boxart_lib::config::Config;
use boxart_lib::http_fetcher::HttpAssetFetcher;
use boxart_lib::logging::retrieval_style;
use boxart_lib::manager::AssetManager;
use boxart_lib::model::{Application, Host};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::instrument;
use tracing_indicatif::span_ext::IndicatifSpanExt;

#[derive(Args)]
pub struct FetchCommand {
    /// JSON file describing the host and its apps
    pub host_file: PathBuf,

    /// Maximum number of downloads running at once (overrides settings.toml)
    #[arg(long, short = 'j')]
    pub max_concurrent: Option<usize>,
}

impl FetchCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let mut config = Config::setup(global_args.datadir.as_deref())?;
        if let Some(max) = self.max_concurrent {
            config.max_concurrent_fetches = max.max(1);
        }

        let host = Arc::new(load_host(&self.host_file)?);
        let total = host.apps.len();
        if total == 0 {
            ui::warning(&format!("{} lists no apps", self.host_file.display()));
            return Ok(());
        }

        let received = retrieve(&config, host.clone()).await?;

        if received == total {
            ui::success(&format!("Box art ready for all {total} apps"));
        } else {
            ui::warning(&format!(
                "Box art ready for {received} of {total} apps; the rest failed or were interrupted"
            ));
        }
        ui::info(&format!("Cache location: {}", config.cache_dir.display()));
        Ok(())
    }
}

#[instrument(skip_all)]
async fn retrieve(config: &Config, host: Arc<Host>) -> Result<usize> {
    let current_span = tracing::Span::current();
    current_span.pb_set_style(&retrieval_style()?);
    current_span.pb_set_length(host.apps.len() as u64);
    current_span.pb_set_message(&format!("Fetching box art from {}...", host_label(&host)));
    current_span.pb_set_finish_message("Fetching box art... Done");

    let received = Arc::new(AtomicUsize::new(0));
    let observer = {
        let received = received.clone();
        let span = current_span.clone();
        move |app: &Application| {
            tracing::debug!("Received box art for {}", app.id);
            received.fetch_add(1, Ordering::SeqCst);
            span.pb_inc(1);
        }
    };

    let fetcher = HttpAssetFetcher::new(config)?;
    let manager = AssetManager::new(config, fetcher, FsCacheStore, observer)?;
    let session = manager.start(host);

    tokio::select! {
        _ = session.drained() => {}
        _ = tokio::signal::ctrl_c() => {
            manager.stop();
            ui::warning("Interrupted, waiting for running downloads to finish...");
            session.drained().await;
        }
    }

    Ok(received.load(Ordering::SeqCst))
}

fn load_host(path: &Path) -> Result<Host> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read host file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid host description in {}", path.display()))
}

fn host_label(host: &Host) -> &str {
    if host.name.is_empty() {
        &host.address
    } else {
        &host.name
    }
}
