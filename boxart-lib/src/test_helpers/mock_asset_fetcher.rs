use crate::asset_fetcher::AssetFetcher;
use crate::error::FetchError;
use crate::model::{Application, Host};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FetchLog {
    requested: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Serves `png:<app id>` for every app except the ones marked as failing.
/// Clones share the request log.
#[derive(Clone, Default)]
pub struct MockAssetFetcher {
    failing: HashSet<String>,
    delay: Option<Duration>,
    log: Arc<FetchLog>,
}

impl MockAssetFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, app_id: &str) -> Self {
        self.failing.insert(app_id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// App ids in the order their fetch started.
    pub fn requested(&self) -> Vec<String> {
        self.log.requested.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.log.max_in_flight.load(Ordering::SeqCst)
    }

    pub async fn wait_for_requests(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.log.requested.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("timed out waiting for fetch requests");
    }
}

impl AssetFetcher for MockAssetFetcher {
    async fn fetch(&self, _host: &Host, app: &Application) -> Result<Vec<u8>, FetchError> {
        self.log.requested.lock().unwrap().push(app.id.clone());
        let now = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&app.id) {
            return Err(FetchError::Other(format!("no box art for {}", app.id)));
        }
        Ok(format!("png:{}", app.id).into_bytes())
    }
}
