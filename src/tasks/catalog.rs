//! # Task catalog.
//!
//! The worker process cannot receive a task object from its parent; it only
//! learns the task's `kind` from its environment. [`Catalog`] maps each kind to
//! a factory that rebuilds the task on the worker side.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::tasks::task::TaskRef;

type Factory = Arc<dyn Fn() -> TaskRef + Send + Sync>;

/// `kind -> factory` table consulted by [`serve_if_spawned`](crate::worker::serve_if_spawned).
///
/// # Example
/// ```
/// use procvisor::{Catalog, SignalSet, TaskError, TaskFn, TaskRef};
///
/// fn echo() -> TaskRef {
///     TaskFn::arc("echo", SignalSet::new(["ping"]).unwrap(), |_sig| async {
///         Ok::<_, TaskError>(())
///     })
/// }
///
/// let catalog = Catalog::new().with("echo", echo);
/// assert!(catalog.build("echo").is_ok());
/// assert!(catalog.build("other").is_err());
/// ```
#[derive(Clone, Default)]
pub struct Catalog {
    factories: HashMap<Cow<'static, str>, Factory>,
}

impl Catalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `kind`, replacing any previous one.
    ///
    /// The factory must build a task whose [`kind`](crate::Task::kind) equals `kind`.
    pub fn with<F>(mut self, kind: impl Into<Cow<'static, str>>, factory: F) -> Self
    where
        F: Fn() -> TaskRef + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Builds the task registered for `kind`.
    pub fn build(&self, kind: &str) -> Result<TaskRef, RuntimeError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| RuntimeError::UnknownTaskKind {
                kind: kind.to_string(),
            })?;
        let task = factory();
        if task.kind() != kind {
            return Err(RuntimeError::UnknownTaskKind {
                kind: kind.to_string(),
            });
        }
        Ok(task)
    }

    /// Sorted list of registered kinds.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(|k| k.as_ref()).collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SignalSet, TaskError, TaskFn};

    fn named(kind: &'static str) -> TaskRef {
        TaskFn::arc(kind, SignalSet::empty(), |_sig| async { Ok::<_, TaskError>(()) })
    }

    #[test]
    fn mismatched_factory_is_rejected() {
        let catalog = Catalog::new().with("a", || named("b")).with("c", || named("c"));
        assert!(matches!(catalog.build("a"), Err(RuntimeError::UnknownTaskKind { .. })));
        assert_eq!(catalog.build("c").unwrap().kind(), "c");
        assert_eq!(catalog.kinds(), vec!["a", "c"]);
    }
}
