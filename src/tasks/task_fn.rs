//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(DomainSignal) -> Fut`, producing a fresh
//! future per signal. If state must survive between signals, capture an
//! `Arc<...>` explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use procvisor::{SignalSet, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("echo", SignalSet::new(["ping"]).unwrap(), |_sig| async {
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.kind(), "echo");
//! assert!(t.signals().contains("ping"));
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::signals::{DomainSignal, SignalSet};
use crate::tasks::task::Task;

/// Function-backed task implementation.
pub struct TaskFn<F> {
    kind: Cow<'static, str>,
    signals: SignalSet,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new<Fut>(kind: impl Into<Cow<'static, str>>, signals: SignalSet, f: F) -> Self
    where
        F: Fn(DomainSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self {
            kind: kind.into(),
            signals,
            f,
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc<Fut>(kind: impl Into<Cow<'static, str>>, signals: SignalSet, f: F) -> Arc<Self>
    where
        F: Fn(DomainSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Arc::new(Self::new(kind, signals, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(DomainSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn signals(&self) -> &SignalSet {
        &self.signals
    }

    async fn process(&self, signal: &DomainSignal) -> Result<(), TaskError> {
        (self.f)(signal.clone()).await
    }
}
