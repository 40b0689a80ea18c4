//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait implemented by the work a worker process runs
//! - [`TaskFn`] - function-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`Catalog`] - `kind -> factory` table used to rebuild a task inside the worker

mod catalog;
mod task;
mod task_fn;

pub use catalog::Catalog;
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
