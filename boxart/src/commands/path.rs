use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::Result;
use boxart_lib::asset_path::box_art_path;
use boxart_lib::cache_store::{CacheStore, FsCacheStore};
use boxart_lib::config::Config;
use boxart_lib::model::Application;
use clap::Args;

#[derive(Args)]
pub struct PathCommand {
    /// Application id as reported by the host
    pub app_id: String,
}

impl PathCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = Config::setup(global_args.datadir.as_deref())?;
        let app = Application::new(&self.app_id, "");
        let path = box_art_path(&config.cache_dir, &app);

        ui::info(&path.display().to_string());
        if FsCacheStore.exists(&path).await {
            let bytes = FsCacheStore.read(&path).await?;
            ui::success(&format!("Cached ({} bytes)", bytes.len()));
        } else {
            ui::tip("Not cached yet. Run `boxart fetch <host.json>` to download it.");
        }

        Ok(())
    }
}
