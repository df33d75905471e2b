//! # Event subscribers for a polling service.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used to deliver [`Event`](crate::Event)s from the [`Bus`](crate::events::Bus)
//! to user-supplied observers.
//!
//! ## Architecture
//! ```text
//! WorkerSlots / workers / Service ── publish(Event) ──► Bus
//!                                                        │
//!                                         subscriber listener (spawned at build)
//!                                                        │
//!                                                        ▼
//!                                                  SubscriberSet
//!                                          ┌─────────────┼─────────────┐
//!                                          ▼             ▼             ▼
//!                                      LogWriter      Metrics        Custom
//! ```
//!
//! See [`Subscribe`] for a custom subscriber example.

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod embedded;

pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
