//! # Service configuration.
//!
//! Provides [`ServiceConfig`], the settings a [`Service`](crate::Service) reads for
//! its whole lifetime. The config is moved into the service at build time and is
//! read-only afterwards.
//!
//! ## Sentinel values
//! - `exit_timeout = 0s` → `stop()` waits for in-flight workers indefinitely
//! - `max_workers = 0` → clamped to 1
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::error::ServiceError;

/// Multiplier applied to the available hardware parallelism for the default worker cap.
const WORKERS_PER_CPU: usize = 12;

/// Configuration for a polling service.
///
/// ## Field semantics
/// - `name`: identifier used in logs and events (must not be blank)
/// - `enabled`: `false` turns `start()` into a no-op
/// - `idle_interval`: wait between polls after a poll found no work
/// - `busy_interval`: wait between polls after a poll found work
/// - `max_workers`: ceiling on concurrently running workers
/// - `exit_timeout`: bound on how long `stop()` waits for workers (`0s` = forever)
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Service identifier. Construction fails if it is empty or whitespace.
    pub name: String,

    /// Whether `start()` actually launches the dispatch loop.
    pub enabled: bool,

    /// Re-check interval used while the source reports no work.
    pub idle_interval: Duration,

    /// Re-check interval used while the source keeps producing work.
    pub busy_interval: Duration,

    /// Maximum number of workers running at the same time.
    pub max_workers: usize,

    /// Upper bound on the drain wait performed by `stop()`.
    ///
    /// - `Duration::ZERO` = wait until every admitted worker finished
    /// - `> 0` = give up waiting after this long (workers keep running detached)
    pub exit_timeout: Duration,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Receivers that lag behind by more than `bus_capacity` events observe
    /// `Lagged` and skip the oldest ones.
    pub bus_capacity: usize,
}

impl ServiceConfig {
    /// Creates a default configuration with the given service name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the idle polling interval.
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    /// Sets the busy polling interval.
    pub fn with_busy_interval(mut self, interval: Duration) -> Self {
        self.busy_interval = interval;
        self
    }

    /// Sets the worker ceiling (clamped to at least 1).
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    /// Sets the shutdown drain bound.
    pub fn with_exit_timeout(mut self, timeout: Duration) -> Self {
        self.exit_timeout = timeout;
        self
    }

    /// Sets the event bus capacity.
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Checks that the configuration can back a service.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::EmptyName);
        }
        Ok(())
    }

    /// Returns the drain bound for `stop()` as an `Option`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(d)` → wait at most `d`
    #[inline]
    pub fn exit_deadline(&self) -> Option<Duration> {
        if self.exit_timeout == Duration::ZERO {
            None
        } else {
            Some(self.exit_timeout)
        }
    }

    /// Returns the worker ceiling clamped to a minimum of 1.
    #[inline]
    pub fn max_workers_clamped(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Picks the next polling interval from the load hint.
    #[inline]
    pub fn interval_for(&self, busy: bool) -> Duration {
        if busy {
            self.busy_interval
        } else {
            self.idle_interval
        }
    }
}

impl Default for ServiceConfig {
    /// Default configuration:
    ///
    /// - `name = "pollvisor"`
    /// - `enabled = true`
    /// - `idle_interval = 5min`
    /// - `busy_interval = 1s`
    /// - `max_workers = 12 × available parallelism`
    /// - `exit_timeout = 0s` (wait for every worker)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: "pollvisor".to_string(),
            enabled: true,
            idle_interval: Duration::from_secs(5 * 60),
            busy_interval: Duration::from_secs(1),
            max_workers: default_max_workers(),
            exit_timeout: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}

fn default_max_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    WORKERS_PER_CPU.saturating_mul(cpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ServiceConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.idle_interval, Duration::from_secs(300));
        assert_eq!(cfg.busy_interval, Duration::from_secs(1));
        assert_eq!(cfg.exit_deadline(), None);
        assert!(cfg.max_workers >= WORKERS_PER_CPU);
        assert_eq!(cfg.max_workers % WORKERS_PER_CPU, 0);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        assert_eq!(ServiceConfig::new("").validate(), Err(ServiceError::EmptyName));
        assert_eq!(
            ServiceConfig::new("   \t").validate(),
            Err(ServiceError::EmptyName)
        );
        assert!(ServiceConfig::new("mailer").validate().is_ok());
    }

    #[test]
    fn test_sentinels_are_clamped() {
        let mut cfg = ServiceConfig::new("svc")
            .with_bus_capacity(0)
            .with_exit_timeout(Duration::from_millis(250));
        cfg.max_workers = 0;

        assert_eq!(cfg.max_workers_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.exit_deadline(), Some(Duration::from_millis(250)));
        assert_eq!(ServiceConfig::new("svc").with_max_workers(0).max_workers, 1);
    }

    #[test]
    fn test_interval_follows_load_hint() {
        let cfg = ServiceConfig::new("svc")
            .with_idle_interval(Duration::from_secs(30))
            .with_busy_interval(Duration::from_millis(10));
        assert_eq!(cfg.interval_for(true), Duration::from_millis(10));
        assert_eq!(cfg.interval_for(false), Duration::from_secs(30));
    }
}
