//! Error types used by the pollvisor service and its collaborators.
//!
//! This module defines two main error enums:
//!
//! - [`ServiceError`]: errors surfaced to the caller of a service operation.
//! - [`TaskError`]: errors raised by a task source or executor for a single worker.
//!
//! Both types provide `as_label` for logging/metrics. [`TaskError::root_cause`]
//! unwraps nested failures down to the innermost message.

use thiserror::Error;

/// # Errors returned by service operations.
///
/// Only configuration problems and lifecycle misuse are reported to the caller.
/// Task-level failures never show up here; they are published as
/// [`EventKind::TaskError`](crate::EventKind::TaskError) instead.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service name was empty or whitespace only.
    #[error("service name must not be empty")]
    EmptyName,

    /// `start`/`stop` was called after the service was disposed.
    #[error("service '{name}' has been disposed")]
    Disposed {
        /// Name of the disposed service.
        name: String,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::ServiceError;
    ///
    /// assert_eq!(ServiceError::EmptyName.as_label(), "service_empty_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::EmptyName => "service_empty_name",
            ServiceError::Disposed { .. } => "service_disposed",
        }
    }
}

/// # Errors produced while fetching or executing a task.
///
/// These stay inside the worker that hit them: the slot is released, the error is
/// published, and the dispatch loop keeps going.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task source or executor reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task source or executor panicked; the panic was caught by the worker.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Any other error, possibly carrying a chain of causes.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pollvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Other(_) => "task_error",
        }
    }

    /// Returns the message of the innermost cause.
    ///
    /// An `anyhow` context chain is unwound to its last link; `Fail` and
    /// `Panicked` return their bare message without the display prefix.
    ///
    /// # Example
    /// ```
    /// use anyhow::Context;
    /// use pollvisor::TaskError;
    ///
    /// let inner: anyhow::Result<()> = Err(anyhow::anyhow!("disk full"));
    /// let err = TaskError::from(inner.context("writing batch").unwrap_err());
    /// assert_eq!(err.root_cause(), "disk full");
    /// ```
    pub fn root_cause(&self) -> String {
        match self {
            TaskError::Fail { error } => error.clone(),
            TaskError::Panicked { info } => info.clone(),
            TaskError::Other(err) => err.root_cause().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(ServiceError::EmptyName.as_label(), "service_empty_name");
        assert_eq!(
            ServiceError::Disposed { name: "x".into() }.as_label(),
            "service_disposed"
        );
        assert_eq!(
            TaskError::Panicked { info: "p".into() }.as_label(),
            "task_panicked"
        );
        assert_eq!(TaskError::from(anyhow::anyhow!("x")).as_label(), "task_error");
    }

    #[test]
    fn test_root_cause_unwraps_context_chain() {
        let io = std::io::Error::other("connection reset");
        let res: Result<(), std::io::Error> = Err(io);
        let err = res
            .context("fetching page")
            .context("syncing feed")
            .unwrap_err();
        let task_err = TaskError::from(err);

        assert_eq!(task_err.root_cause(), "connection reset");
        assert_eq!(task_err.to_string(), "syncing feed");
    }

    #[test]
    fn test_root_cause_of_flat_variant_is_bare_message() {
        let err = TaskError::fail("boom");
        assert_eq!(err.root_cause(), "boom");
        assert_eq!(err.to_string(), "execution failed: boom");

        let err = TaskError::Panicked {
            info: "index out of bounds".into(),
        };
        assert_eq!(err.root_cause(), "index out of bounds");
    }
}
