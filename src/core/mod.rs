//! Runtime core: admission, workers and lifecycle.
//!
//! The only public API from this module is [`Service`] (with its
//! [`ServiceBuilder`] and [`ServiceConfig`]) plus the [`LifecycleState`] it reports.
//!
//! Internal modules:
//! - [`slots`]: bounded worker counter with RAII slot guards and drain waiting;
//! - [`dispatch`]: the admission loop with adaptive poll interval;
//! - [`worker`]: one fetch-then-execute body with failure isolation;
//! - [`lifecycle`]: atomic lifecycle state cell;
//! - [`service`]: start/stop/dispose and introspection.

mod builder;
mod config;
mod dispatch;
mod lifecycle;
mod service;
mod slots;
mod worker;

pub use builder::ServiceBuilder;
pub use config::ServiceConfig;
pub use lifecycle::LifecycleState;
pub use service::Service;
