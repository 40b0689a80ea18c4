//! # Task abstraction.
//!
//! A [`Task`] is the only thing an application supplies: a stable
//! [`kind`](Task::kind), the [`SignalSet`] it accepts, and
//! [`process`](Task::process), invoked inside the worker process once per
//! received domain signal.
//!
//! The same type exists on both sides of the process boundary. The supervisor
//! uses `kind` and `signals`; the worker rebuilds the task from `kind` through
//! a [`Catalog`](crate::Catalog) and calls `process`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::signals::{DomainSignal, SignalSet};

/// # Unit of work driven by domain signals.
///
/// Returning `Err` (or panicking) from `process` faults the worker: no further
/// signal is dispatched, and the fault is reported at
/// [`Supervisor::close`](crate::Supervisor::close).
///
/// Worker stdout is the protocol channel. Implementations must log to stderr
/// (or through `tracing`), never `println!`.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use procvisor::{DomainSignal, SignalSet, Task, TaskError};
///
/// struct Echo {
///     signals: SignalSet,
/// }
///
/// #[async_trait]
/// impl Task for Echo {
///     fn kind(&self) -> &str { "echo" }
///
///     fn signals(&self) -> &SignalSet { &self.signals }
///
///     async fn process(&self, signal: &DomainSignal) -> Result<(), TaskError> {
///         eprintln!("got {signal}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Stable identity used to rebuild the task in the worker process.
    fn kind(&self) -> &str;

    /// Domain signals this task accepts.
    fn signals(&self) -> &SignalSet;

    /// Handles one domain signal.
    async fn process(&self, signal: &DomainSignal) -> Result<(), TaskError>;
}

/// Shared handle to a task object.
pub type TaskRef = Arc<dyn Task>;
