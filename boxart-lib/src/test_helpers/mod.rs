pub mod mock_asset_fetcher;
pub mod mock_cache_store;
pub mod recording_observer;
