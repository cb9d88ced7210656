use crossbeam_channel::{Receiver, Sender};
use pluma_core::event::PluginEvent;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Dispatch point for plugin change events.
///
/// The registry calls `publish` after a store write has committed.
/// Implementations must not block on subscribers and must not fail the
/// caller; a durable or distributed bus can be swapped in here.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: PluginEvent);
}

/// In-process fan-out over unbounded crossbeam channels.
///
/// Every subscriber receives every event, in publish order. Subscribers
/// whose receiver has been dropped are pruned on the next publish.
pub struct ChangeNotifier {
    subscribers: Mutex<Vec<Sender<PluginEvent>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Receiver<PluginEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<PluginEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for ChangeNotifier {
    fn publish(&self, event: PluginEvent) {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        let pruned = before - subscribers.len();
        if pruned > 0 {
            warn!(pruned, "Dropped disconnected plugin event subscribers");
        }
        debug!(
            kind = event.kind(),
            plugin_id = event.plugin_id(),
            subscribers = subscribers.len(),
            "Published plugin event"
        );
    }
}
