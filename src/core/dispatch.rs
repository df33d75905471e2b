//! # Dispatch loop: admission and adaptive polling.
//!
//! The [`DispatchLoop`] is the only place new workers are admitted. It runs as a
//! single tokio task for as long as the service is running.
//!
//! ## Algorithm
//! ```text
//! loop {
//!   ├─► wake cancelled?                    → exit
//!   ├─► wait = hint.busy ? busy_interval : idle_interval
//!   ├─► slots.try_reserve()
//!   │      ├─ Some(slot) → spawn run_worker(slot)
//!   │      └─ None       → wait = CAPACITY_BACKOFF (500ms)
//!   └─► select! { wake.cancelled() → exit, sleep(wait) → next tick }
//! }
//! ```
//!
//! ## Rules
//! - At most **one** admission per tick, even when several slots are free.
//! - The loop exits only through the wake token; empty polls and task failures
//!   never end it.
//! - The interval follows the load hint with a one-tick lag: a worker that flips
//!   the hint affects the *next* wait, not the current one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::config::ServiceConfig;
use crate::core::slots::WorkerSlots;
use crate::core::worker::run_worker;
use crate::events::Bus;
use crate::tasks::{TaskExecutor, TaskSource};

/// Fixed re-check interval while every worker slot is taken.
pub(crate) const CAPACITY_BACKOFF: Duration = Duration::from_millis(500);

/// "Last poll produced work" flag.
///
/// Advisory only: every worker writes it after its fetch and the loop reads it
/// once per tick, so concurrent workers race and the last write wins. Relaxed
/// ordering is enough because nothing else is published through it.
#[derive(Debug, Default)]
pub(crate) struct LoadHint(AtomicBool);

impl LoadHint {
    #[inline]
    pub(crate) fn mark_busy(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn mark_idle(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn is_busy(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// State shared by the service, its dispatch loop and every worker.
pub(crate) struct Shared<S, E> {
    pub(crate) cfg: ServiceConfig,
    pub(crate) name: Arc<str>,
    pub(crate) source: S,
    pub(crate) executor: E,
    pub(crate) slots: Arc<WorkerSlots>,
    pub(crate) hint: LoadHint,
    pub(crate) bus: Bus,
}

impl<S, E> Shared<S, E>
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    pub(crate) fn new(cfg: ServiceConfig, source: S, executor: E, bus: Bus) -> Arc<Self> {
        let name: Arc<str> = Arc::from(cfg.name.trim());
        let slots = WorkerSlots::new(cfg.max_workers_clamped(), bus.clone(), Arc::clone(&name));
        Arc::new(Self {
            cfg,
            name,
            source,
            executor,
            slots,
            hint: LoadHint::default(),
            bus,
        })
    }
}

/// Admission loop for one run of the service (one `start` → `stop` cycle).
pub(crate) struct DispatchLoop<S, E> {
    shared: Arc<Shared<S, E>>,
    wake: CancellationToken,
}

impl<S, E> DispatchLoop<S, E>
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    pub(crate) fn new(shared: Arc<Shared<S, E>>, wake: CancellationToken) -> Self {
        Self { shared, wake }
    }

    /// Runs until the wake token is cancelled. The token is dropped on exit.
    pub(crate) async fn run(self) {
        let shared = &self.shared;
        tracing::debug!(service = %shared.name, "dispatch loop started");

        while !self.wake.is_cancelled() {
            let mut wait = shared.cfg.interval_for(shared.hint.is_busy());

            match shared.slots.try_reserve() {
                Some(slot) => {
                    tracing::debug!(
                        service = %shared.name,
                        workers = slot.admitted_as(),
                        "worker admitted"
                    );
                    tokio::spawn(run_worker(Arc::clone(shared), slot));
                }
                None => {
                    tracing::trace!(
                        service = %shared.name,
                        max_workers = shared.slots.max(),
                        "worker pool at capacity"
                    );
                    wait = CAPACITY_BACKOFF;
                }
            }

            tokio::select! {
                biased;
                _ = self.wake.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        tracing::debug!(service = %shared.name, "dispatch loop exited");
    }
}
