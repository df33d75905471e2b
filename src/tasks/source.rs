//! # Task source contract.

use async_trait::async_trait;

use crate::error::TaskError;

/// # Producer of work items.
///
/// `fetch_next` is called once per admitted worker and may run concurrently from
/// several workers at once. Implementations whose state is not concurrency-safe
/// must synchronize internally; the service gives no mutual-exclusion guarantee.
///
/// # Example
/// ```
/// use std::sync::Mutex;
/// use async_trait::async_trait;
/// use pollvisor::{TaskError, TaskSource};
///
/// struct Countdown(Mutex<u32>);
///
/// #[async_trait]
/// impl TaskSource for Countdown {
///     type Task = u32;
///
///     async fn fetch_next(&self) -> Result<Option<u32>, TaskError> {
///         let mut left = self.0.lock().map_err(|e| TaskError::fail(e.to_string()))?;
///         if *left == 0 {
///             return Ok(None);
///         }
///         *left -= 1;
///         Ok(Some(*left))
///     }
/// }
/// ```
#[async_trait]
pub trait TaskSource: Send + Sync + 'static {
    /// Unit of work handed to the executor.
    type Task: Send + 'static;

    /// Returns the next task, or `Ok(None)` when there is nothing to do right now.
    async fn fetch_next(&self) -> Result<Option<Self::Task>, TaskError>;
}
