//! Lifecycle event fan-out.

use tokio::sync::broadcast;
use tracing::debug;

use mezzo_models::LifecycleEvent;

/// Default buffer size for the event channel.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts lifecycle transitions to in-process subscribers.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and a lagging subscriber loses the oldest events rather
/// than stalling the pipeline. Consumers must tolerate both, which they
/// already do since delivery is at-least-once by contract.
#[derive(Clone)]
pub struct StateNotifier {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl StateNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Publish a transition. Fire-and-forget.
    pub fn publish(&self, event: LifecycleEvent) {
        debug!(
            media_id = %event.media_id,
            old_status = %event.old_status,
            new_status = %event.new_status,
            "Publishing lifecycle event"
        );
        metrics::counter!("mezzo_lifecycle_events_total").increment(1);
        // Err means no subscribers are listening right now
        let _ = self.tx.send(event);
    }
}

impl Default for StateNotifier {
    fn default() -> Self {
        Self::new()
    }
}
