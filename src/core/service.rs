//! # Service: lifecycle control over the dispatch loop.
//!
//! The [`Service`] owns the shared worker state, the lifecycle state and the handle
//! of the currently running dispatch loop. It is the surface the embedding
//! application talks to.
//!
//! ## Key responsibilities
//! - idempotent `start`/`stop` with a CAS-guarded state and a short exclusive section
//! - launching the [`DispatchLoop`] with a fresh wake token per run
//! - bounded drain on `stop` via [`ServiceConfig::exit_timeout`]
//! - single, idempotent teardown via [`Service::dispose`]
//!
//! ## Stop path
//! ```text
//! stop()
//!   ├─► (control lock) state Running → Stopping, take dispatch handle
//!   │       ├─► wake.cancel()       → loop stops admitting and exits
//!   │       ├─► publish StopRequested
//!   │       └─► spawn finish_stop   → owns the rest of the stop
//!   └─► await `stopped` token
//!
//! finish_stop (own task, outlives a dropped `stop()` future)
//!   ├─► join dispatch loop
//!   ├─► active > 0 ? wait_drained(exit_deadline)
//!   │        ├─ drained          → continue
//!   │        └─ deadline passed  → publish ExitTimeoutHit, continue (workers detach)
//!   ├─► publish ServiceCompleted
//!   ├─► state Stopping → Stopped
//!   └─► cancel `stopped` token   → wakes every stop()/dispose() waiting on it
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::core::builder::ServiceBuilder;
use crate::core::config::ServiceConfig;
use crate::core::dispatch::{DispatchLoop, Shared};
use crate::core::lifecycle::{LifecycleState, StateCell};
use crate::error::ServiceError;
use crate::events::{Event, EventKind};
use crate::tasks::{TaskExecutor, TaskSource};

/// Running dispatch loop: its wake token and join handle.
struct DispatchHandle {
    wake: CancellationToken,
    join: JoinHandle<()>,
}

/// State guarded by the control lock.
#[derive(Default)]
struct Control {
    dispatch: Option<DispatchHandle>,
    /// Cancelled once the current (or last) stop has completed.
    stopped: Option<CancellationToken>,
}

/// Background polling service.
///
/// Build it with [`Service::new`] or [`Service::builder`]. All operations take
/// `&self`, so the service can be shared behind an `Arc` and controlled from any task.
pub struct Service<S, E>
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    shared: Arc<Shared<S, E>>,
    state: Arc<StateCell>,
    control: Mutex<Control>,
    _listener: Option<DropGuard>,
}

impl<S, E> Service<S, E>
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    /// Creates a service without subscribers.
    ///
    /// Fails with [`ServiceError::EmptyName`] if the configured name is blank.
    pub fn new(cfg: ServiceConfig, source: S, executor: E) -> Result<Self, ServiceError> {
        ServiceBuilder::new(cfg, source, executor).build()
    }

    /// Returns a builder for a service with subscribers.
    pub fn builder(cfg: ServiceConfig, source: S, executor: E) -> ServiceBuilder<S, E> {
        ServiceBuilder::new(cfg, source, executor)
    }

    pub(crate) fn from_parts(shared: Arc<Shared<S, E>>, listener: Option<DropGuard>) -> Self {
        Self {
            shared,
            state: Arc::new(StateCell::new(LifecycleState::Created)),
            control: Mutex::new(Control::default()),
            _listener: listener,
        }
    }

    /// Launches the dispatch loop.
    ///
    /// - disposed → [`ServiceError::Disposed`]
    /// - disabled, already running or still stopping → no-op
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), ServiceError> {
        let observed = self.state.load();
        if observed == LifecycleState::Disposed {
            return Err(self.disposed());
        }
        if !self.shared.cfg.enabled {
            tracing::trace!(service = %self.shared.name, "service disabled; start ignored");
            return Ok(());
        }
        if matches!(observed, LifecycleState::Running | LifecycleState::Stopping) {
            tracing::trace!(service = %self.shared.name, state = %observed, "start ignored");
            return Ok(());
        }

        let mut control = self.lock_control();
        let current = self.state.load();
        if current == LifecycleState::Disposed {
            return Err(self.disposed());
        }
        let admitted = matches!(current, LifecycleState::Created | LifecycleState::Stopped)
            && self.state.transition(current, LifecycleState::Running);
        if !admitted {
            tracing::trace!(service = %self.shared.name, state = %current, "start ignored");
            return Ok(());
        }

        tracing::info!(
            service = %self.shared.name,
            max_workers = self.shared.slots.max(),
            idle_interval = ?self.shared.cfg.idle_interval,
            busy_interval = ?self.shared.cfg.busy_interval,
            "service started"
        );
        publish(&self.shared, EventKind::ServiceStarted);

        let wake = CancellationToken::new();
        let dispatch = DispatchLoop::new(Arc::clone(&self.shared), wake.clone());
        let join = tokio::spawn(dispatch.run());
        control.dispatch = Some(DispatchHandle { wake, join });
        control.stopped = None;
        Ok(())
    }

    /// Stops admitting workers and waits for in-flight ones.
    ///
    /// The wait is bounded by `exit_timeout` (`0` = unbounded). When the bound
    /// expires, `ExitTimeoutHit` is published and the stop completes anyway;
    /// remaining workers keep running detached. `ServiceCompleted` is published
    /// exactly once per accepted stop.
    ///
    /// The drain runs in its own task: dropping this future (e.g. under
    /// `tokio::time::timeout`) does not abort the stop, the service still reaches
    /// `Stopped` once the drain finishes.
    ///
    /// - disposed → [`ServiceError::Disposed`]
    /// - stopping → waits for the stop in progress, publishes nothing
    /// - not running → no-op
    pub async fn stop(&self) -> Result<(), ServiceError> {
        let observed = self.state.load();
        if observed == LifecycleState::Disposed {
            return Err(self.disposed());
        }
        if !matches!(observed, LifecycleState::Running | LifecycleState::Stopping) {
            tracing::trace!(service = %self.shared.name, state = %observed, "stop ignored");
            return Ok(());
        }

        let stopped = {
            let mut control = self.lock_control();
            match self.state.load() {
                LifecycleState::Running => {
                    if !self
                        .state
                        .transition(LifecycleState::Running, LifecycleState::Stopping)
                    {
                        return Ok(());
                    }
                    self.begin_stop(&mut control)
                }
                LifecycleState::Stopping => match control.stopped.clone() {
                    Some(stopped) => stopped,
                    None => return Ok(()),
                },
                LifecycleState::Disposed => return Err(self.disposed()),
                current => {
                    tracing::trace!(service = %self.shared.name, state = %current, "stop ignored");
                    return Ok(());
                }
            }
        };

        stopped.cancelled().await;
        Ok(())
    }

    /// Tears the service down. A running service is stopped first, and a stop
    /// already in progress is waited for.
    ///
    /// Only one call moves the service to `Disposed`; later calls return immediately.
    pub async fn dispose(&self) {
        loop {
            match self.state.load() {
                LifecycleState::Disposed => {
                    tracing::trace!(service = %self.shared.name, "dispose ignored; already disposed");
                    return;
                }
                LifecycleState::Running | LifecycleState::Stopping => {
                    // Err only if another caller disposed meanwhile; the next pass sees it.
                    let _ = self.stop().await;
                }
                idle @ (LifecycleState::Created | LifecycleState::Stopped) => {
                    if self.try_dispose(idle) {
                        tracing::info!(service = %self.shared.name, previous = %idle, "service disposed");
                        return;
                    }
                }
            }
        }
    }

    /// Returns a receiver for every event published after this call.
    ///
    /// Dropping the receiver is fine; a service with no receivers simply discards events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state.load()
    }

    /// True while the dispatch loop is admitting workers.
    pub fn is_running(&self) -> bool {
        self.state.load() == LifecycleState::Running
    }

    /// Number of workers currently in flight.
    pub fn active_workers(&self) -> usize {
        self.shared.slots.active()
    }

    /// Service name (trimmed).
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether `start` launches the loop.
    pub fn enabled(&self) -> bool {
        self.shared.cfg.enabled
    }

    /// Wait between polls after an empty poll.
    pub fn idle_interval(&self) -> Duration {
        self.shared.cfg.idle_interval
    }

    /// Wait between polls after a poll that found work.
    pub fn busy_interval(&self) -> Duration {
        self.shared.cfg.busy_interval
    }

    /// Effective worker ceiling.
    pub fn max_workers(&self) -> usize {
        self.shared.slots.max()
    }

    /// Drain bound used by `stop` (`0` = unbounded).
    pub fn exit_timeout(&self) -> Duration {
        self.shared.cfg.exit_timeout
    }

    /// Full configuration the service was built with.
    pub fn config(&self) -> &ServiceConfig {
        &self.shared.cfg
    }

    /// Wakes the loop and hands the drain to [`finish_stop`]. Caller holds the
    /// control lock and has already moved the state to `Stopping`.
    fn begin_stop(&self, control: &mut Control) -> CancellationToken {
        let in_flight = self.shared.slots.active();
        tracing::info!(service = %self.shared.name, workers = in_flight, "stopping service");

        let dispatch = control.dispatch.take();
        if let Some(handle) = &dispatch {
            handle.wake.cancel();
        }
        self.shared.bus.publish(
            Event::new(EventKind::StopRequested)
                .with_service(Arc::clone(&self.shared.name))
                .with_workers(in_flight),
        );

        let stopped = CancellationToken::new();
        control.stopped = Some(stopped.clone());
        tokio::spawn(finish_stop(
            Arc::clone(&self.shared),
            Arc::clone(&self.state),
            dispatch.map(|handle| handle.join),
            stopped.clone(),
        ));
        stopped
    }

    /// Moves an idle service to `Disposed`, serialized with `start` by the control lock.
    fn try_dispose(&self, from: LifecycleState) -> bool {
        let mut control = self.lock_control();
        if !self.state.transition(from, LifecycleState::Disposed) {
            return false;
        }
        if let Some(handle) = control.dispatch.take() {
            handle.wake.cancel();
        }
        true
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn disposed(&self) -> ServiceError {
        ServiceError::Disposed {
            name: self.shared.name.to_string(),
        }
    }
}

impl<S, E> Drop for Service<S, E>
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    fn drop(&mut self) {
        let control = self
            .control
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = control.dispatch.take() {
            handle.wake.cancel();
            tracing::warn!(
                service = %self.shared.name,
                workers = self.shared.slots.active(),
                "service dropped while running; admissions stopped without draining"
            );
        }
    }
}

/// Second half of `stop`: join the loop, drain workers, settle on `Stopped`.
///
/// `stopped` is cancelled when this returns, including on panic or runtime shutdown.
async fn finish_stop<S, E>(
    shared: Arc<Shared<S, E>>,
    state: Arc<StateCell>,
    dispatch: Option<JoinHandle<()>>,
    stopped: CancellationToken,
) where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    let _stopped = stopped.drop_guard();

    if let Some(join) = dispatch {
        if let Err(err) = join.await {
            tracing::error!(service = %shared.name, error = %err, "dispatch loop aborted");
        }
    }

    if shared.slots.active() > 0 {
        let deadline = shared.cfg.exit_deadline();
        if !shared.slots.wait_drained(deadline).await {
            report_exit_timeout(&shared, deadline.unwrap_or_default());
        }
    }

    // Published before the state flips so a following start() cannot get ahead of it.
    tracing::info!(service = %shared.name, "service completed");
    publish(&shared, EventKind::ServiceCompleted);
    state.transition(LifecycleState::Stopping, LifecycleState::Stopped);
}

fn report_exit_timeout<S, E>(shared: &Shared<S, E>, timeout: Duration) {
    let left = shared.slots.active();
    tracing::warn!(
        service = %shared.name,
        workers = left,
        timeout = ?timeout,
        "exit timeout elapsed; workers left running"
    );
    shared.bus.publish(
        Event::new(EventKind::ExitTimeoutHit)
            .with_service(Arc::clone(&shared.name))
            .with_workers(left)
            .with_timeout(timeout),
    );
}

fn publish<S, E>(shared: &Shared<S, E>, kind: EventKind) {
    shared
        .bus
        .publish(Event::new(kind).with_service(Arc::clone(&shared.name)));
}
