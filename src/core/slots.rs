//! # Worker slot accounting.
//!
//! [`WorkerSlots`] tracks how many workers are in flight and enforces the
//! configured ceiling. A reservation hands out a [`SlotGuard`]; dropping the guard
//! releases the slot, so a worker gives its slot back on success, failure and
//! panic alike.
//!
//! ## Rules
//! - `0 ≤ active ≤ max` at every observation: reservation is a CAS loop that only
//!   increments while `active < max`.
//! - Release is floored at zero; releasing an empty pool is a no-op.
//! - Every successful increment/decrement publishes `WorkerCountChanged`.
//! - Reaching zero wakes every drain waiter.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::events::{Bus, Event, EventKind};

/// Concurrent worker counter with a hard ceiling.
pub(crate) struct WorkerSlots {
    active: AtomicUsize,
    max: usize,
    drained: Notify,
    bus: Bus,
    service: Arc<str>,
}

impl WorkerSlots {
    pub(crate) fn new(max: usize, bus: Bus, service: Arc<str>) -> Arc<Self> {
        Arc::new(Self {
            active: AtomicUsize::new(0),
            max: max.max(1),
            drained: Notify::new(),
            bus,
            service,
        })
    }

    /// Reserves one slot if the pool is below its ceiling.
    pub(crate) fn try_reserve(self: &Arc<Self>) -> Option<SlotGuard> {
        let prev = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max).then_some(n + 1)
            })
            .ok()?;
        let now = prev + 1;
        self.publish_count(now);

        Some(SlotGuard {
            slots: Arc::clone(self),
            admitted_as: now,
        })
    }

    /// Gives one slot back. Returns the new count, or `None` if the pool was empty.
    pub(crate) fn release(&self) -> Option<usize> {
        let prev = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()?;
        let now = prev - 1;
        self.publish_count(now);

        if now == 0 {
            self.drained.notify_waiters();
        }
        Some(now)
    }

    #[inline]
    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn max(&self) -> usize {
        self.max
    }

    /// Waits until no worker is in flight.
    ///
    /// Returns `true` once drained, `false` if `deadline` passed first.
    /// `None` waits indefinitely.
    pub(crate) async fn wait_drained(&self, deadline: Option<Duration>) -> bool {
        let drained = async {
            loop {
                let notified = self.drained.notified();
                tokio::pin!(notified);
                // Register before checking so a release between the check and the
                // await cannot be missed.
                notified.as_mut().enable();
                if self.active() == 0 {
                    return;
                }
                notified.await;
            }
        };

        match deadline {
            None => {
                drained.await;
                true
            }
            Some(limit) => tokio::time::timeout(limit, drained).await.is_ok(),
        }
    }

    fn publish_count(&self, now: usize) {
        tracing::trace!(service = %self.service, workers = now, "worker count changed");
        self.bus.publish(
            Event::new(EventKind::WorkerCountChanged)
                .with_service(Arc::clone(&self.service))
                .with_workers(now),
        );
    }
}

/// Reserved worker slot; released exactly once, on drop.
pub(crate) struct SlotGuard {
    slots: Arc<WorkerSlots>,
    admitted_as: usize,
}

impl SlotGuard {
    /// Worker count right after this slot was reserved.
    #[inline]
    pub(crate) fn admitted_as(&self) -> usize {
        self.admitted_as
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slots.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(max: usize) -> (Arc<WorkerSlots>, Bus) {
        let bus = Bus::new(64);
        (WorkerSlots::new(max, bus.clone(), Arc::from("test")), bus)
    }

    #[test]
    fn test_reserve_stops_at_ceiling() {
        let (slots, _bus) = slots(2);
        let a = slots.try_reserve().expect("first");
        let b = slots.try_reserve().expect("second");
        assert_eq!(a.admitted_as(), 1);
        assert_eq!(b.admitted_as(), 2);
        assert!(slots.try_reserve().is_none());
        assert_eq!(slots.active(), 2);

        drop(a);
        assert_eq!(slots.active(), 1);
        assert!(slots.try_reserve().is_some());
    }

    #[test]
    fn test_release_is_floored_at_zero() {
        let (slots, _bus) = slots(1);
        assert_eq!(slots.release(), None);
        assert_eq!(slots.active(), 0);

        let guard = slots.try_reserve().expect("slot");
        drop(guard);
        assert_eq!(slots.release(), None);
        assert_eq!(slots.active(), 0);
    }

    #[test]
    fn test_zero_max_is_clamped() {
        let (slots, _bus) = slots(0);
        assert_eq!(slots.max(), 1);
        assert!(slots.try_reserve().is_some());
    }

    #[tokio::test]
    async fn test_every_change_is_published() {
        let (slots, bus) = slots(3);
        let mut rx = bus.subscribe();

        let a = slots.try_reserve().expect("a");
        let b = slots.try_reserve().expect("b");
        drop(a);
        drop(b);

        let mut counts = Vec::new();
        for _ in 0..4 {
            let ev = rx.recv().await.expect("event");
            assert_eq!(ev.kind, EventKind::WorkerCountChanged);
            assert_eq!(ev.service.as_deref(), Some("test"));
            counts.push(ev.workers.expect("workers"));
        }
        assert_eq!(counts, vec![1, 2, 1, 0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ceiling_holds_under_contention() {
        let (slots, _bus) = slots(3);
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let slots = Arc::clone(&slots);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                for _ in 0..200 {
                    if let Some(guard) = slots.try_reserve() {
                        peak.fetch_max(guard.admitted_as(), Ordering::Relaxed);
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for h in handles {
            h.await.expect("join");
        }

        assert!(peak.load(Ordering::Relaxed) <= 3);
        assert_eq!(slots.active(), 0);
    }

    #[tokio::test]
    async fn test_wait_drained_returns_immediately_when_empty() {
        let (slots, _bus) = slots(2);
        assert!(slots.wait_drained(Some(Duration::from_millis(10))).await);
    }

    #[tokio::test]
    async fn test_wait_drained_wakes_on_last_release() {
        let (slots, _bus) = slots(2);
        let a = slots.try_reserve().expect("a");
        let b = slots.try_reserve().expect("b");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(a);
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(b);
        });

        assert!(slots.wait_drained(None).await);
        assert_eq!(slots.active(), 0);
    }

    #[tokio::test]
    async fn test_wait_drained_times_out() {
        let (slots, _bus) = slots(1);
        let _held = slots.try_reserve().expect("slot");
        assert!(!slots.wait_drained(Some(Duration::from_millis(30))).await);
        assert_eq!(slots.active(), 1);
    }
}
