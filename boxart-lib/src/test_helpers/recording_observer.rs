use crate::model::Application;
use crate::notifier::AssetObserver;
use std::time::Duration;
use tokio::sync::mpsc;

/// Forwards every received app id to a [`Received`] queue.
pub struct RecordingObserver {
    sender: mpsc::UnboundedSender<String>,
}

pub struct Received {
    receiver: mpsc::UnboundedReceiver<String>,
}

impl RecordingObserver {
    pub fn new() -> (Self, Received) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, Received { receiver })
    }
}

impl AssetObserver for RecordingObserver {
    fn received_asset(&self, app: &Application) {
        let _ = self.sender.send(app.id.clone());
    }
}

impl Received {
    /// Waits for up to `count` ids, giving up after a few seconds.
    pub async fn take(&mut self, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);
        while ids.len() < count {
            match tokio::time::timeout(Duration::from_secs(5), self.receiver.recv()).await {
                Ok(Some(id)) => ids.push(id),
                _ => break,
            }
        }
        ids
    }

    /// Ids that have already arrived, without waiting.
    pub fn try_take(&mut self) -> Vec<String> {
        let mut ids = Vec::new();
        while let Ok(id) = self.receiver.try_recv() {
            ids.push(id);
        }
        ids
    }

    /// True when nothing arrives within `window`.
    pub async fn is_quiet(&mut self, window: Duration) -> bool {
        !matches!(
            tokio::time::timeout(window, self.receiver.recv()).await,
            Ok(Some(_))
        )
    }
}
