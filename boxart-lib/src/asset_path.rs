use crate::model::Application;
use std::path::{Path, PathBuf};

const BOX_ART_EXTENSION: &str = "png";

/// Maps application ids to box art cache files.
///
/// The file name is the percent-encoded id, so every byte outside
/// `[A-Za-z0-9-_.~]` (including `%`, `/` and `\`) is escaped. Distinct ids
/// therefore never share a file, and the host an app was seen on plays no part.
#[derive(Debug, Clone)]
pub struct AssetPathResolver {
    cache_dir: PathBuf,
}

impl AssetPathResolver {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    pub fn resolve(&self, application_id: &str) -> PathBuf {
        let file_name = format!(
            "{}.{}",
            urlencoding::encode(application_id),
            BOX_ART_EXTENSION
        );
        self.cache_dir.join(file_name)
    }
}

/// Where the box art for `app` lives (or would live) under `cache_dir`.
pub fn box_art_path(cache_dir: &Path, app: &Application) -> PathBuf {
    AssetPathResolver::new(cache_dir).resolve(&app.id)
}
