//! Best-effort progress event publishing.
//!
//! The corpus pass publishes one [`ProgressEvent`] per processed file on a
//! bounded broadcast channel. Publishing never blocks the worker: with no
//! subscribers the event is dropped, and a subscriber that falls behind the
//! channel capacity loses the oldest events rather than applying
//! backpressure. Subscribers that join mid-pass miss earlier events.

use crate::pipeline::types::ProgressEvent;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Publisher handle for corpus pass progress.
pub struct ProgressReporter {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressReporter {
    /// Create a reporter with a bounded event buffer.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Register a new observer for subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn emit(&self, event: ProgressEvent) {
        tracing::debug!(
            file = %event.file_name,
            current = event.current,
            total = event.total,
            "Pass progress"
        );
        if self.sender.send(event).is_err() {
            tracing::trace!("No progress subscribers; event dropped");
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(current: usize) -> ProgressEvent {
        ProgressEvent {
            file_name: format!("file-{current}.txt"),
            current,
            total: 3,
        }
    }

    #[tokio::test]
    async fn delivers_events_to_subscribers() {
        let reporter = ProgressReporter::new();
        let mut receiver = reporter.subscribe();

        reporter.emit(event(1));
        reporter.emit(event(2));

        assert_eq!(receiver.recv().await.expect("event").current, 1);
        assert_eq!(receiver.recv().await.expect("event").current, 2);
    }

    #[tokio::test]
    async fn emitting_without_subscribers_does_not_panic() {
        let reporter = ProgressReporter::new();
        reporter.emit(event(1));
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let reporter = ProgressReporter::new();
        reporter.emit(event(1));

        let mut receiver = reporter.subscribe();
        reporter.emit(event(2));

        assert_eq!(receiver.recv().await.expect("event").current, 2);
    }
}
