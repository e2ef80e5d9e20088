pub mod asset_fetcher;
pub mod asset_path;
pub mod cache_store;
pub mod config;
pub mod error;
pub mod http_fetcher;
pub mod logging;
pub mod manager;
pub mod model;
pub mod notifier;
mod scheduler;

#[cfg(test)]
pub mod test_helpers;
