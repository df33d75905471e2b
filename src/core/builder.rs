use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::{config::ServiceConfig, dispatch::Shared, service::Service};
use crate::{
    error::ServiceError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    tasks::{TaskExecutor, TaskSource},
};

/// Builder for constructing a [`Service`] with optional subscribers.
pub struct ServiceBuilder<S, E> {
    cfg: ServiceConfig,
    source: S,
    executor: E,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<S, E> ServiceBuilder<S, E>
where
    S: TaskSource,
    E: TaskExecutor<S::Task>,
{
    /// Creates a new builder from the configuration and the two collaborators.
    pub fn new(cfg: ServiceConfig, source: S, executor: E) -> Self {
        Self {
            cfg,
            source,
            executor,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every published event through dedicated workers with
    /// bounded queues; a slow subscriber loses events instead of stalling workers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and assembles the service.
    ///
    /// Fails with [`ServiceError::EmptyName`] on a blank name. With subscribers
    /// configured this must be called from within a tokio runtime.
    pub fn build(self) -> Result<Service<S, E>, ServiceError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = (!self.subscribers.is_empty()).then(|| {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(&bus, set)
        });
        let shared = Shared::new(self.cfg, self.source, self.executor, bus);

        Ok(Service::from_parts(
            shared,
            listener.map(CancellationToken::drop_guard),
        ))
    }
}

/// Forwards bus events to the subscriber set until the returned token is cancelled.
fn subscriber_listener(bus: &Bus, set: SubscriberSet) -> CancellationToken {
    let mut rx = bus.subscribe();
    let token = CancellationToken::new();
    let stop = token.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
    });
    token
}
