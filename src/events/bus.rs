//! # Broadcast bus for service events.
//!
//! Every component of a service publishes into one [`Bus`]; nothing on the
//! publishing side ever waits for a reader.
//!
//! ```text
//! WorkerSlots (count changes) ──┐
//! workers     (task errors)   ──┼─► Bus ─┬─► subscriber listener ─► SubscriberSet
//! Service     (lifecycle)     ──┘        └─► Service::subscribe() receivers
//! ```
//!
//! A receiver that falls more than `capacity` events behind loses the oldest
//! ones and sees `RecvError::Lagged`. Events sent while no receiver exists are
//! discarded.

use tokio::sync::broadcast;

use super::event::Event;

/// Shared publishing handle; clones feed the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining up to `capacity` undelivered events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Sends `ev` to current receivers; a bus without receivers drops it.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Opens a receiver that sees events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ServiceStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ServiceCompleted));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::ServiceCompleted);
    }

    #[tokio::test]
    async fn test_per_receiver_fifo() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        for n in 0..3 {
            bus.publish(Event::new(EventKind::WorkerCountChanged).with_workers(n));
        }
        for n in 0..3 {
            assert_eq!(rx.recv().await.expect("event").workers, Some(n));
        }
    }
}
