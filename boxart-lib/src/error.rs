use std::path::PathBuf;
use thiserror::Error;

/// Failure to retrieve the box art of a single application from its host.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Host answered with status {0}")]
    Status(u16),

    #[error("Host returned an empty asset")]
    Empty,

    #[error("Asset exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("{0}")]
    Other(String),
}

/// Failure to read or write a cached asset.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No cached asset at {0:?}")]
    NotFound(PathBuf),

    #[error("Cache I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
