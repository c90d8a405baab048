//! Engine event bus.
//!
//! Input handling and the main loop live at different points of the frame;
//! events published during input are drained once per frame.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Events handled by the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Reload assets and repaint every resident chunk
    Reload,
    /// Save the game now
    Save,
}

/// Multi-producer event bus drained by the main loop.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<EngineEvent>,
    receiver: Receiver<EngineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Handle for publishing events.
    #[must_use]
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            sender: self.sender.clone(),
        }
    }

    /// Takes every pending event.
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Cloneable publishing side of an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: Sender<EngineEvent>,
}

impl EventPublisher {
    /// Publishes an event.
    pub fn publish(&self, event: EngineEvent) {
        debug!("Event: {:?}", event);
        // Only fails once the bus is gone.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_drain_in_order() {
        let bus = EventBus::new();
        let publisher = bus.publisher();
        publisher.publish(EngineEvent::Save);
        publisher.clone().publish(EngineEvent::Reload);
        assert_eq!(bus.drain(), vec![EngineEvent::Save, EngineEvent::Reload]);
        assert!(bus.drain().is_empty());
    }
}
