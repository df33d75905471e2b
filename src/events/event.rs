//! # Runtime events emitted by a polling service.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Pool events**: worker count changes and task failures
//! - **Lifecycle events**: start, stop request, exit timeout, completion
//! - **Subscriber events**: overflow and panic reports from the fan-out layer
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the service
//! name, the current worker count and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use pollvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskError)
//!     .with_service("mailer")
//!     .with_reason("smtp timeout")
//!     .with_label("task_failed");
//!
//! assert_eq!(ev.kind, EventKind::TaskError);
//! assert_eq!(ev.service.as_deref(), Some("mailer"));
//! assert_eq!(ev.reason.as_deref(), Some("smtp timeout"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Pool events ===
    /// A worker slot was reserved or released.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `workers`: worker count after the change
    WorkerCountChanged,

    /// A worker's task source or executor failed.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `reason`: innermost cause of the failure
    /// - `label`: stable error label (see [`TaskError::as_label`](crate::TaskError::as_label))
    TaskError,

    // === Lifecycle events ===
    /// The dispatch loop was launched.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceStarted,

    /// `stop()` accepted the request and woke the dispatch loop.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `workers`: workers still in flight at that moment
    StopRequested,

    /// The drain wait in `stop()` ran past `exit_timeout`; stop proceeds anyway.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `workers`: workers still in flight
    /// - `timeout_ms`: configured exit timeout (ms)
    ExitTimeoutHit,

    /// `stop()` finished. Emitted exactly once per accepted stop.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceCompleted,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `service`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the service (or subscriber, for subscriber events).
    pub service: Option<Arc<str>>,
    /// Worker count observed when the event was built.
    pub workers: Option<usize>,
    /// Human-readable reason (error causes, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Stable snake_case label of the error, if any.
    pub label: Option<&'static str>,
    /// Exit timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            workers: None,
            reason: None,
            label: None,
            timeout_ms: None,
        }
    }

    /// Attaches the service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a worker count.
    #[inline]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an error label.
    #[inline]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
