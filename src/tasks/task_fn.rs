//! # Function-backed collaborators (`SourceFn`, `ExecutorFn`)
//!
//! Both adapters wrap a closure that *creates* a new future per call. There is no
//! hidden mutation between calls; shared state goes into an `Arc<...>` captured by
//! the closure.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use pollvisor::{ExecutorFn, SourceFn, TaskError};
//!
//! let next = Arc::new(AtomicU32::new(0));
//! let source: SourceFn<_, u32> = SourceFn::new(move || {
//!     let next = Arc::clone(&next);
//!     async move { Ok::<_, TaskError>(Some(next.fetch_add(1, Ordering::Relaxed))) }
//! });
//! let executor = ExecutorFn::new(|n: u32| async move {
//!     if n % 7 == 0 {
//!         return Err(TaskError::fail(format!("unlucky {n}")));
//!     }
//!     Ok(())
//! });
//! # let _ = (source, executor);
//! ```

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::{TaskExecutor, TaskSource};

/// Function-backed [`TaskSource`].
pub struct SourceFn<F, T> {
    f: F,
    _task: PhantomData<fn() -> T>,
}

impl<F, T> SourceFn<F, T> {
    /// Wraps a closure producing one fetch future per call.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _task: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T> TaskSource for SourceFn<F, T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<T>, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    type Task = T;

    async fn fetch_next(&self) -> Result<Option<T>, TaskError> {
        (self.f)().await
    }
}

/// Function-backed [`TaskExecutor`].
pub struct ExecutorFn<F> {
    f: F,
}

impl<F> ExecutorFn<F> {
    /// Wraps a closure producing one execution future per task.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut, T> TaskExecutor<T> for ExecutorFn<F>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    T: Send + 'static,
{
    async fn run(&self, task: T) -> Result<(), TaskError> {
        (self.f)(task).await
    }
}
