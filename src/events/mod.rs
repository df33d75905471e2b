//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the service, its worker slots,
//! its workers and the subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Service` (lifecycle), `WorkerSlots` (count changes),
//!   workers (task errors), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned at build time (fans out to
//!   `SubscriberSet`) and any receiver handed out by `Service::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
