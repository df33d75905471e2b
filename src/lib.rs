//! # pollvisor
//!
//! **Pollvisor** is a bounded-concurrency background polling engine for Rust.
//!
//! A [`Service`] repeatedly admits workers, up to a configured ceiling. Each worker
//! asks a [`TaskSource`] for the next unit of work and, if there is one, hands it to a
//! [`TaskExecutor`]. The wait between polls adapts to load: a short interval while
//! the source keeps producing work, a long one once it runs dry.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!         start() / stop() / dispose()
//!                     │
//! ┌───────────────────▼───────────────────────────────────────────────┐
//! │  Service (lifecycle controller)                                   │
//! │  - StateCell (Created → Running → Stopping → Stopped → Disposed)  │
//! │  - DispatchHandle (wake token + join handle of the running loop)  │
//! └───────────────────┬───────────────────────────────────────────────┘
//!                     ▼
//!              ┌──────────────┐  try_reserve()   ┌──────────────┐
//!              │ DispatchLoop │ ───────────────► │ WorkerSlots  │
//!              │ (one / tick) │                  │ (0..=max)    │
//!              └──────┬───────┘                  └──────▲───────┘
//!                     │ spawn(run_worker)               │ SlotGuard::drop
//!      ┌──────────────┼──────────────┐                  │
//!      ▼              ▼              ▼                  │
//!  ┌────────┐     ┌────────┐     ┌────────┐             │
//!  │ worker │     │ worker │     │ worker │ ────────────┘
//!  └───┬────┘     └───┬────┘     └───┬────┘
//!      │ fetch_next() → run(task); LoadHint busy/idle
//!      │
//!      │ Publishes: WorkerCountChanged, TaskError,
//!      │            ServiceStarted, StopRequested, ExitTimeoutHit, ServiceCompleted
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │               (capacity: ServiceConfig::bus_capacity)             │
//! └──────────────┬─────────────────────────────────┬──────────────────┘
//!                ▼                                 ▼
//!     ┌────────────────────────┐         Service::subscribe()
//!     │  subscriber_listener   │          (raw receivers)
//!     └───────────┬────────────┘
//!                 ▼
//!           SubscriberSet (per-sub queues)
//!        ┌────────┼────────┐
//!        ▼        ▼        ▼
//!     sub1.on  sub2.on  subN.on
//!     _event() _event() _event()
//! ```
//!
//! ### Dispatch tick
//! ```text
//! loop {
//!   ├─► wait = last poll found work ? busy_interval : idle_interval
//!   ├─► slot free?  ─► spawn worker (at most one per tick)
//!   │   pool full?  ─► wait = 500ms
//!   └─► sleep(wait), interrupted by stop()
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                        | Key types / traits                    |
//! |-------------------|--------------------------------------------------------------------|---------------------------------------|
//! | **Service**       | Start, stop, dispose and inspect a polling service.                | [`Service`], [`LifecycleState`]       |
//! | **Collaborators** | Plug in where work comes from and what to do with it.              | [`TaskSource`], [`TaskExecutor`]      |
//! | **Adapters**      | Use plain async closures as collaborators.                         | [`SourceFn`], [`ExecutorFn`]          |
//! | **Subscriber API**| Observe worker counts, failures and lifecycle transitions.         | [`Subscribe`], [`Event`]              |
//! | **Errors**        | Typed errors for the service surface and for task execution.       | [`ServiceError`], [`TaskError`]       |
//! | **Configuration** | Name, intervals, worker ceiling, exit timeout.                     | [`ServiceConfig`]                     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use pollvisor::{ExecutorFn, Service, ServiceConfig, SourceFn, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let left = Arc::new(AtomicU32::new(3));
//!
//!     let source = SourceFn::new(move || {
//!         let left = Arc::clone(&left);
//!         async move {
//!             let prev = left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
//!             Ok::<_, TaskError>(prev.ok())
//!         }
//!     });
//!     let executor = ExecutorFn::new(|n: u32| async move {
//!         println!("processing item {n}");
//!         Ok::<(), TaskError>(())
//!     });
//!
//!     let cfg = ServiceConfig::new("mailer")
//!         .with_idle_interval(Duration::from_millis(200))
//!         .with_busy_interval(Duration::from_millis(10))
//!         .with_max_workers(2);
//!
//!     let service = Service::new(cfg, source, executor)?;
//!     service.start()?;
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     service.stop().await?;
//!     service.dispose().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{LifecycleState, Service, ServiceBuilder, ServiceConfig};
pub use error::{ServiceError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{ExecutorFn, SourceFn, TaskExecutor, TaskSource};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
