use crate::asset_fetcher::AssetFetcher;
use crate::asset_path::AssetPathResolver;
use crate::cache_store::CacheStore;
use crate::config::Config;
use crate::model::{Application, Host};
use crate::notifier::{AssetObserver, CompletionNotifier, DeliveryGate, NotifierEvent};
use crate::scheduler::{RetrievalScheduler, Session};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalState {
    /// No session, or the last one has fully drained.
    Idle,
    Retrieving,
    /// Cancelled; fetches that were already running are draining.
    Stopping,
}

/// Handle to one retrieval session, as returned by [`AssetManager::start`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: u64,
    token: CancellationToken,
    gate: DeliveryGate,
    drained: watch::Receiver<bool>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancels the session. No notification from it is delivered after this
    /// returns; running fetches finish in the background.
    pub fn cancel(&self) {
        self.gate.silence(&self.token);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once every application is resolved (or, after a cancel, the
    /// in-flight fetches have finished) and every notification it produced
    /// has been delivered.
    pub fn is_drained(&self) -> bool {
        *self.drained.borrow()
    }

    pub async fn drained(&self) {
        let mut drained = self.drained.clone();
        // An error means the session task is gone, which only happens after it drained.
        let _ = drained.wait_for(|done| *done).await;
    }
}

/// Retrieves and caches box art for one host at a time.
///
/// Starting a new host cancels the previous one; only the current session's
/// applications reach the observer.
pub struct AssetManager<F, S> {
    scheduler: Arc<RetrievalScheduler<F, S>>,
    notifier: CompletionNotifier,
    runtime: Handle,
    current: Mutex<Option<SessionHandle>>,
    next_session_id: AtomicU64,
}

impl<F, S> AssetManager<F, S>
where
    F: AssetFetcher + 'static,
    S: CacheStore + 'static,
{
    /// Must be called from within a tokio runtime; sessions are spawned on it.
    pub fn new(
        config: &Config,
        fetcher: F,
        store: S,
        observer: impl AssetObserver,
    ) -> Result<Self> {
        let runtime =
            Handle::try_current().context("AssetManager must be created inside a tokio runtime")?;
        let notifier = CompletionNotifier::spawn(Arc::new(observer))
            .context("Failed to start the box art notifier thread")?;
        let scheduler = RetrievalScheduler::new(
            fetcher,
            store,
            AssetPathResolver::new(&config.cache_dir),
            config.max_concurrent_fetches,
            notifier.sender(),
        );

        Ok(Self {
            scheduler: Arc::new(scheduler),
            notifier,
            runtime,
            current: Mutex::new(None),
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Starts retrieving box art for every app of `host`, cancelling the
    /// session that was running before.
    pub fn start(&self, host: Arc<Host>) -> SessionHandle {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let (drained_tx, drained_rx) = watch::channel(false);
        let handle = SessionHandle {
            id,
            token: token.clone(),
            gate: self.notifier.gate(),
            drained: drained_rx,
        };

        let previous = self.lock_current().replace(handle.clone());
        if let Some(previous) = previous {
            tracing::debug!("Superseding box art session {}", previous.id);
            previous.cancel();
        }

        tracing::info!(
            "Retrieving box art for {} apps from {}",
            host.apps.len(),
            host.uuid
        );
        let session = Session { id, host, token };
        let scheduler = self.scheduler.clone();
        let events = self.notifier.sender();
        self.runtime.spawn(async move {
            scheduler.run(session).await;
            if let Err(SendError(NotifierEvent::Drained(drained_tx))) =
                events.send(NotifierEvent::Drained(drained_tx))
            {
                drained_tx.send_replace(true);
            }
        });

        handle
    }

    /// Cancels the current session, if any. Does not wait for in-flight
    /// fetches; [`Self::state`] reports `Stopping` until they drain.
    pub fn stop(&self) {
        let current = self.lock_current().clone();
        if let Some(current) = current
            && !current.is_cancelled()
        {
            tracing::debug!("Stopping box art session {}", current.id);
            current.cancel();
        }
    }

    pub fn state(&self) -> RetrievalState {
        match self.lock_current().as_ref() {
            None => RetrievalState::Idle,
            Some(session) if session.is_drained() => RetrievalState::Idle,
            Some(session) if session.is_cancelled() => RetrievalState::Stopping,
            Some(_) => RetrievalState::Retrieving,
        }
    }

    /// Where the box art for `app` is (or will be) cached. Needs no session.
    pub fn box_art_path_for_app(&self, app: &Application) -> PathBuf {
        self.scheduler.resolver().resolve(&app.id)
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<SessionHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F, S> Drop for AssetManager<F, S> {
    fn drop(&mut self) {
        let current = self
            .current
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(current) = current {
            current.cancel();
        }
    }
}
