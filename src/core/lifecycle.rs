//! # Service lifecycle state.
//!
//! [`LifecycleState`] is stored in a [`StateCell`] (an `AtomicU8`) so that reads
//! such as `Service::state()` and the optimistic checks in `start`/`stop` never
//! take a lock. Transitions go through compare-and-swap.
//!
//! ```text
//!  Created ──start──► Running ──stop──► Stopping ──► Stopped
//!                        ▲                               │
//!                        └────────────start──────────────┘
//!
//!  Created | Stopped ──dispose──► Disposed   (terminal; a running or stopping
//!                                             service is drained first)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Observable lifecycle state of a [`Service`](crate::Service).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    /// Built, never started.
    Created = 0,
    /// Dispatch loop is admitting workers.
    Running = 1,
    /// `stop()` is waking the loop and draining workers.
    Stopping = 2,
    /// Stopped; may be started again.
    Stopped = 3,
    /// Torn down; `start`/`stop` fail from now on.
    Disposed = 4,
}

impl LifecycleState {
    /// Returns a short stable label (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Disposed => "disposed",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Created,
            1 => LifecycleState::Running,
            2 => LifecycleState::Stopping,
            3 => LifecycleState::Stopped,
            _ => LifecycleState::Disposed,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder of a [`LifecycleState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: LifecycleState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `from → to` only if the current state is `from`.
    #[inline]
    pub(crate) fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
