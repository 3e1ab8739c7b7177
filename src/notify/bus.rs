//! In-process publish/subscribe channel for UI events

use tokio::sync::broadcast;

use super::events::UiEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcast bus for [`UiEvent`]s
///
/// Cloning the bus shares the same channel. Slow subscribers that fall more
/// than the channel capacity behind lose the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<UiEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Bus holding up to `capacity` undelivered events (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; returns how many subscribers received it
    pub fn publish(&self, event: UiEvent) -> usize {
        // Sending with no receivers is not a failure for a UI bus
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
