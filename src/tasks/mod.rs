//! # Collaborator contracts.
//!
//! A service is driven by two collaborators supplied by the embedding code:
//! - [`TaskSource`] - produces the next unit of work, or nothing right now
//! - [`TaskExecutor`] - performs the business logic for one unit of work
//!
//! Function-backed adapters [`SourceFn`] and [`ExecutorFn`] wrap closures for
//! the common case where a full trait impl is overkill.

mod executor;
mod source;
mod task_fn;

pub use executor::TaskExecutor;
pub use source::TaskSource;
pub use task_fn::{ExecutorFn, SourceFn};
