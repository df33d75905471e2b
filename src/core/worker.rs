//! # Run a single worker.
//!
//! One worker performs one fetch from the [`TaskSource`] and, if that yields a
//! task, one call to the [`TaskExecutor`]. It runs as its own tokio task and
//! never blocks the dispatch loop.
//!
//! ## Flow
//! ```text
//! fetch_next() ─► Ok(None)      ─► hint = idle ─► release slot
//!              ─► Ok(Some(t))   ─► hint = busy ─► run(t) ─► release slot ─► [TaskError on Err]
//!              ─► Err(e)        ─► hint = idle ─► release slot ─► TaskError
//!              ─► panic         ─────────────────► release slot ─► TaskError (Panicked)
//! ```
//!
//! ## Rules
//! - The slot is released in every outcome (the guard drops before reporting).
//! - Failures are reported once, with the innermost cause, and never propagated.
//! - Panics are caught here and never reach the runtime.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::Instrument;

use crate::core::dispatch::{LoadHint, Shared};
use crate::core::slots::SlotGuard;
use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::subscribers::panic_message;
use crate::tasks::{TaskExecutor, TaskSource};

/// Executes one worker body while holding `slot`.
pub(crate) async fn run_worker<S, E>(shared: Arc<Shared<S, E>>, slot: SlotGuard)
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    let span = tracing::debug_span!(
        "worker",
        service = %shared.name,
        admitted_as = slot.admitted_as()
    );

    async move {
        let work = fetch_and_run(&shared.source, &shared.executor, &shared.hint);
        let outcome = AssertUnwindSafe(work)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(TaskError::Panicked {
                    info: panic_message(panic.as_ref()),
                })
            });

        drop(slot);

        match outcome {
            Ok(()) => tracing::trace!("worker finished"),
            Err(err) => report_failure(&shared, &err),
        }
    }
    .instrument(span)
    .await
}

/// Fetches the next task and runs it, updating the load hint along the way.
async fn fetch_and_run<S, E>(source: &S, executor: &E, hint: &LoadHint) -> Result<(), TaskError>
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    let task = match source.fetch_next().await {
        Ok(Some(task)) => task,
        Ok(None) => {
            hint.mark_idle();
            return Ok(());
        }
        Err(err) => {
            hint.mark_idle();
            return Err(err);
        }
    };

    hint.mark_busy();
    executor.run(task).await
}

/// Publishes `TaskError` with the innermost cause.
fn report_failure<S, E>(shared: &Shared<S, E>, err: &TaskError)
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    let cause = err.root_cause();
    tracing::error!(label = err.as_label(), error = %err, cause = %cause, "task failed");
    shared.bus.publish(
        Event::new(EventKind::TaskError)
            .with_service(Arc::clone(&shared.name))
            .with_label(err.as_label())
            .with_reason(cause),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ServiceConfig;
    use crate::tasks::{ExecutorFn, SourceFn};
    use anyhow::Context;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_empty_fetch_marks_idle_and_skips_executor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let shared = Shared::new(
            ServiceConfig::new("w").with_max_workers(1),
            SourceFn::new(|| async { Ok::<Option<u8>, TaskError>(None) }),
            ExecutorFn::new(move |_t: u8| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), TaskError>(())
                }
            }),
            crate::events::Bus::new(16),
        );
        shared.hint.mark_busy();

        let slot = shared.slots.try_reserve().expect("slot");
        run_worker(Arc::clone(&shared), slot).await;

        assert!(!shared.hint.is_busy());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(shared.slots.active(), 0);
    }

    #[tokio::test]
    async fn test_failure_reports_root_cause_once() {
        let bus = crate::events::Bus::new(16);
        let mut rx = bus.subscribe();
        let shared = Shared::new(
            ServiceConfig::new("w"),
            SourceFn::new(|| async { Ok::<_, TaskError>(Some(7u32)) }),
            ExecutorFn::new(|n: u32| async move {
                let inner: anyhow::Result<()> = Err(anyhow::anyhow!("row {n} is locked"));
                inner.context("updating ledger")?;
                Ok::<(), TaskError>(())
            }),
            bus,
        );

        let slot = shared.slots.try_reserve().expect("slot");
        run_worker(Arc::clone(&shared), slot).await;

        assert!(shared.hint.is_busy());
        assert_eq!(shared.slots.active(), 0);

        let errors: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::TaskError)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason.as_deref(), Some("row 7 is locked"));
        assert_eq!(errors[0].label, Some("task_error"));
    }

    #[tokio::test]
    async fn test_panic_is_caught_and_slot_released() {
        let bus = crate::events::Bus::new(16);
        let mut rx = bus.subscribe();
        let shared = Shared::new(
            ServiceConfig::new("w"),
            SourceFn::new(|| async { Ok::<_, TaskError>(Some(())) }),
            ExecutorFn::new(|_: ()| async move {
                if true {
                    panic!("executor exploded");
                }
                Ok::<(), TaskError>(())
            }),
            bus,
        );

        let slot = shared.slots.try_reserve().expect("slot");
        run_worker(Arc::clone(&shared), slot).await;

        assert_eq!(shared.slots.active(), 0);
        let err = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|ev| ev.kind == EventKind::TaskError)
            .expect("task error event");
        assert_eq!(err.label, Some("task_panicked"));
    }

    #[tokio::test]
    async fn test_source_failure_is_reported() {
        let bus = crate::events::Bus::new(16);
        let mut rx = bus.subscribe();
        let shared = Shared::new(
            ServiceConfig::new("w"),
            SourceFn::new(|| async { Err::<Option<u8>, _>(TaskError::fail("queue offline")) }),
            ExecutorFn::new(|_: u8| async { Ok::<(), TaskError>(()) }),
            bus,
        );
        shared.hint.mark_busy();

        let slot = shared.slots.try_reserve().expect("slot");
        run_worker(Arc::clone(&shared), slot).await;

        assert!(!shared.hint.is_busy());
        let err = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|ev| ev.kind == EventKind::TaskError)
            .expect("task error event");
        assert_eq!(err.reason.as_deref(), Some("queue offline"));
    }
}
