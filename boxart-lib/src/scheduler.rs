use crate::asset_fetcher::AssetFetcher;
use crate::asset_path::AssetPathResolver;
use crate::cache_store::CacheStore;
use crate::model::{Application, Host};
use crate::notifier::{Completion, NotifierEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// One retrieval pass over a host's applications.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub id: u64,
    pub host: Arc<Host>,
    pub token: CancellationToken,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetrievalSummary {
    pub cache_hits: usize,
    pub fetched: usize,
    pub failed: usize,
    pub cancelled: bool,
}

enum FetchOutcome {
    Fetched,
    Failed,
    Dropped,
}

/// Decides cache hit vs. fetch for each application and runs the fetches
/// with at most `max_concurrent_fetches` in flight.
pub(crate) struct RetrievalScheduler<F, S> {
    fetcher: Arc<F>,
    store: Arc<S>,
    resolver: AssetPathResolver,
    max_concurrent_fetches: usize,
    completions: mpsc::UnboundedSender<NotifierEvent>,
}

impl<F, S> RetrievalScheduler<F, S>
where
    F: AssetFetcher + 'static,
    S: CacheStore + 'static,
{
    pub(crate) fn new(
        fetcher: F,
        store: S,
        resolver: AssetPathResolver,
        max_concurrent_fetches: usize,
        completions: mpsc::UnboundedSender<NotifierEvent>,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store: Arc::new(store),
            resolver,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
            completions,
        }
    }

    pub(crate) fn resolver(&self) -> &AssetPathResolver {
        &self.resolver
    }

    /// Announces every cache hit first, then fetches the misses in app order.
    /// Returns once every app is resolved, or once the session is cancelled
    /// and the fetches already started have drained.
    #[instrument(skip_all, fields(session = session.id, host = %session.host.uuid))]
    pub(crate) async fn run(self: Arc<Self>, session: Session) -> RetrievalSummary {
        let mut summary = RetrievalSummary::default();
        let permits = Arc::new(Semaphore::new(self.max_concurrent_fetches));
        let mut tasks = JoinSet::new();
        let host = session.host.clone();

        // Hits never wait behind a saturated fetch pool.
        let mut misses = Vec::new();
        for app in &host.apps {
            if session.token.is_cancelled() {
                break;
            }

            let path = self.resolver.resolve(&app.id);
            if self.store.exists(&path).await {
                debug!("Cache hit for {} at {}", app.id, path.display());
                summary.cache_hits += 1;
                self.notify(&session, app.clone());
            } else {
                misses.push((app, path));
            }
        }

        for (app, path) in misses {
            if session.token.is_cancelled() {
                break;
            }

            // FIFO: apps wait here, in order, until a fetch slot frees up.
            let permit = tokio::select! {
                biased;
                _ = session.token.cancelled() => break,
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            debug!("Fetching box art for {}", app.id);
            let this = self.clone();
            let session = session.clone();
            let app = app.clone();
            tasks.spawn(async move { this.fetch_one(&session, &app, path, permit).await });
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(FetchOutcome::Fetched) => summary.fetched += 1,
                Ok(FetchOutcome::Failed) => summary.failed += 1,
                Ok(FetchOutcome::Dropped) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!("Box art fetch task aborted: {}", e);
                }
            }
        }

        summary.cancelled = session.token.is_cancelled();
        info!(
            "Box art retrieval for {} finished: {} cached, {} fetched, {} failed{}",
            session.host.uuid,
            summary.cache_hits,
            summary.fetched,
            summary.failed,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        summary
    }

    async fn fetch_one(
        &self,
        session: &Session,
        app: &Application,
        path: PathBuf,
        _permit: OwnedSemaphorePermit,
    ) -> FetchOutcome {
        // Cancelled between dispatch and the task's first poll.
        if session.token.is_cancelled() {
            debug!("Session cancelled, not fetching {}", app.id);
            return FetchOutcome::Dropped;
        }

        let bytes = match self.fetcher.fetch(&session.host, app).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to fetch box art for {}: {}", app.id, e);
                return FetchOutcome::Failed;
            }
        };

        // Still cached after a cancel; only the notification is withheld.
        if let Err(e) = self.store.write(&path, &bytes).await {
            warn!("Failed to cache box art for {}: {}", app.id, e);
            return FetchOutcome::Failed;
        }

        if session.token.is_cancelled() {
            debug!("Session cancelled, not announcing {}", app.id);
            return FetchOutcome::Dropped;
        }
        self.notify(session, app.clone());
        FetchOutcome::Fetched
    }

    fn notify(&self, session: &Session, app: Application) {
        let completion = Completion {
            session_id: session.id,
            token: session.token.clone(),
            app,
        };
        if self.completions.send(NotifierEvent::Asset(completion)).is_err() {
            warn!("Notifier is gone, dropping completion");
        }
    }
}
