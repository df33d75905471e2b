//! # Event subscriber trait.
//!
//! [`Subscribe`] is how embedding code observes a service: worker count changes,
//! task failures and lifecycle transitions all arrive through it.
//!
//! Registered subscribers are driven by a [`SubscriberSet`](crate::SubscriberSet):
//! one task and one bounded queue per subscriber. Events reach each subscriber in
//! publish order. When a queue is full the event is skipped for that subscriber
//! alone and a `SubscriberOverflow` event is published instead; a panic inside
//! `on_event` is caught and reported as `SubscriberPanicked`.

use async_trait::async_trait;

use crate::events::Event;

/// Observer of service events.
///
/// Implementations run off the hot path, so they may await I/O, but they should
/// not block the thread.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use async_trait::async_trait;
/// use pollvisor::{Event, EventKind, Subscribe};
///
/// #[derive(Default)]
/// struct FailureCounter(AtomicUsize);
///
/// #[async_trait]
/// impl Subscribe for FailureCounter {
///     async fn on_event(&self, event: &Event) {
///         if event.kind == EventKind::TaskError {
///             self.0.fetch_add(1, Ordering::Relaxed);
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "failure-counter"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length for this subscriber; values below 1 are raised to 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
