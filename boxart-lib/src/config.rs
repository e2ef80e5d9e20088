use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ASSET_BYTES: u64 = 8 * 1024 * 1024;
pub const DEFAULT_CLIENT_ID: &str = "0123456789ABCDEF";

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for boxart data (cache, settings)
    pub data_dir: PathBuf,

    /// Directory where box art images are cached, one file per application
    pub cache_dir: PathBuf,

    /// Optional TOML file overriding the tunables below
    pub settings_file: PathBuf,

    /// Upper bound on box art downloads running at the same time.
    /// Kept small so a host's whole app list does not saturate the link.
    pub max_concurrent_fetches: usize,

    /// Per request timeout applied by the HTTP fetcher
    pub request_timeout: Duration,

    /// Downloads larger than this are rejected
    pub max_asset_bytes: u64,

    /// `uniqueid` presented to the host
    pub client_id: String,
}

/// `settings.toml` contents. Every key is optional.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub max_concurrent_fetches: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub max_asset_bytes: Option<u64>,
    pub client_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new_for_path(&Self::default_data_dir())
    }
}

impl Config {
    pub fn new_for_path(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            cache_dir: data_dir.join("boxart"),
            settings_file: data_dir.join("settings.toml"),
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
            client_id: DEFAULT_CLIENT_ID.to_string(),
        }
    }

    /// Sets up a new Config for the given data directory, creating it and
    /// applying `settings.toml` when present.
    /// See also [Self::default_data_dir].
    pub fn setup(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = data_dir
            .map(|d| d.to_path_buf())
            .unwrap_or_else(Self::default_data_dir);
        let mut config = Self::new_for_path(&data_dir);

        std::fs::create_dir_all(&config.cache_dir).with_context(|| {
            format!(
                "Failed to create cache directory {}",
                config.cache_dir.display()
            )
        })?;

        if config.settings_file.exists() {
            let settings = load_settings(&config.settings_file)?;
            config.apply(settings);
        }

        Ok(config)
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
            .join("boxart")
    }

    pub fn apply(&mut self, settings: Settings) {
        if let Some(max) = settings.max_concurrent_fetches {
            self.max_concurrent_fetches = max.max(1);
        }
        if let Some(secs) = settings.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = settings.max_asset_bytes {
            self.max_asset_bytes = bytes;
        }
        if let Some(client_id) = settings.client_id {
            self.client_id = client_id;
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
}
