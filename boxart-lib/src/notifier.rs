use crate::model::Application;
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Receives box art as it becomes available.
///
/// Calls are never concurrent: they all happen on one dedicated notifier
/// thread. The observer may call back into the manager (`start`/`stop`).
pub trait AssetObserver: Send + Sync + 'static {
    fn received_asset(&self, app: &Application);
}

impl<F> AssetObserver for F
where
    F: Fn(&Application) + Send + Sync + 'static,
{
    fn received_asset(&self, app: &Application) {
        self(app)
    }
}

/// A retrieved or cache-hit application waiting to be delivered.
#[derive(Debug)]
pub(crate) struct Completion {
    pub session_id: u64,
    pub token: CancellationToken,
    pub app: Application,
}

#[derive(Debug)]
pub(crate) enum NotifierEvent {
    Asset(Completion),
    /// Sent after a session's last completion; flips its drain flag once
    /// everything queued before it has been delivered or dropped.
    Drained(watch::Sender<bool>),
}

thread_local! {
    /// Identity of the gate whose observer call is running on this thread, or 0.
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

/// Held by the notifier thread for the duration of each observer call, so
/// cancelling a session can wait out a delivery that already passed its check.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeliveryGate(Arc<Mutex<()>>);

impl DeliveryGate {
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Cancels `token`; once this returns the observer sees nothing more from it.
    pub(crate) fn silence(&self, token: &CancellationToken) {
        token.cancel();
        // Called from inside this gate's own observer: the in-progress call is
        // the caller itself and the next delivery re-checks the token.
        if DELIVERING.get() != self.id() {
            drop(self.lock());
        }
    }

    /// Runs one observer call, marking this thread as delivering for the gate.
    /// A panicking observer is contained so later deliveries still happen.
    fn deliver(&self, observer: &dyn AssetObserver, completion: &Completion) {
        DELIVERING.set(self.id());
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            observer.received_asset(&completion.app)
        }));
        DELIVERING.set(0);

        if let Err(payload) = result {
            tracing::warn!(
                session = completion.session_id,
                "Observer panicked while receiving box art for {}: {}",
                completion.app.id,
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Serializes completions from every session onto a single consumer thread.
#[derive(Debug)]
pub(crate) struct CompletionNotifier {
    sender: mpsc::UnboundedSender<NotifierEvent>,
    gate: DeliveryGate,
}

impl CompletionNotifier {
    /// Starts the consumer thread. It exits once every sender is dropped.
    pub(crate) fn spawn(observer: Arc<dyn AssetObserver>) -> std::io::Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<NotifierEvent>();
        let gate = DeliveryGate::default();
        let consumer_gate = gate.clone();

        thread::Builder::new()
            .name("boxart-notifier".to_string())
            .spawn(move || {
                while let Some(event) = receiver.blocking_recv() {
                    let completion = match event {
                        NotifierEvent::Asset(completion) => completion,
                        NotifierEvent::Drained(drained) => {
                            drained.send_replace(true);
                            continue;
                        }
                    };
                    let _guard = consumer_gate.lock();
                    if completion.token.is_cancelled() {
                        tracing::debug!(
                            session = completion.session_id,
                            "Dropping box art for {} from a stale session",
                            completion.app.id
                        );
                        continue;
                    }
                    consumer_gate.deliver(observer.as_ref(), &completion);
                }
            })?;

        Ok(Self { sender, gate })
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<NotifierEvent> {
        self.sender.clone()
    }

    pub(crate) fn gate(&self) -> DeliveryGate {
        self.gate.clone()
    }
}
