//! # Task executor contract.

use async_trait::async_trait;

use crate::error::TaskError;

/// # Runs one unit of work.
///
/// Failures must come back as `Err`; the worker reports them as
/// [`EventKind::TaskError`](crate::EventKind::TaskError) and the dispatch loop
/// carries on. A panic is caught and reported the same way, but returning an
/// error is the expected path.
///
/// There is no cancellation: once a task has been handed over, it runs to
/// completion even if the service is stopping.
#[async_trait]
pub trait TaskExecutor<T: Send + 'static>: Send + Sync + 'static {
    /// Executes `task`.
    async fn run(&self, task: T) -> Result<(), TaskError>;
}
