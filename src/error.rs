//! Error types used by the procvisor runtime and tasks.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: errors raised by the supervisor/worker protocol itself.
//! - [`TaskError`]: errors returned by a task's [`process`](crate::Task::process).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.
//!
//! ## Taxonomy
//! - **Coding errors** (protocol violations, duplicate names, unknown signals,
//!   closing before starting): never retried, they indicate wiring bugs.
//!   See [`RuntimeError::is_coding_error`].
//! - **Task faults**: recovered by the worker loop and surfaced exactly once as
//!   [`RuntimeError::WorkerFaulted`] from [`Supervisor::close`](crate::Supervisor::close).

use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced by the procvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Supervisor name cannot be used (empty or contains path separators).
    #[error("invalid supervisor name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Domain signal text cannot be carried on the channel.
    #[error("invalid signal {signal:?}: {reason}")]
    InvalidSignal {
        /// The rejected signal text.
        signal: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A task declared a domain signal that collides with a reserved control signal.
    #[error("signal {signal:?} is reserved for the protocol")]
    ReservedSignal {
        /// The colliding signal text.
        signal: String,
    },

    /// A signal outside the task's declared set was sent or received.
    #[error("signal {signal:?} is not declared by task {task:?}")]
    UnknownSignal {
        /// Task kind.
        task: String,
        /// The unrecognized signal.
        signal: String,
    },

    /// Another supervisor with the same name is starting or running.
    #[error("supervisor {name:?} is already running")]
    DuplicateName {
        /// The duplicate name.
        name: String,
    },

    /// The name is not in the state the operation requires (not active, or not reserved).
    #[error("supervisor {name:?} is not registered")]
    NotRegistered {
        /// The missing name.
        name: String,
    },

    /// Operation requires a started supervisor.
    #[error("supervisor {name:?} has not been started")]
    NotStarted {
        /// Supervisor name.
        name: String,
    },

    /// `start` was called twice.
    #[error("supervisor {name:?} was already started")]
    AlreadyStarted {
        /// Supervisor name.
        name: String,
    },

    /// A crash report exists before any fault happened.
    #[error("stale crash report at {path:?}; remove it before reusing the name")]
    StaleCrashReport {
        /// Location of the leftover report.
        path: PathBuf,
    },

    /// The peer replied with something the handshake does not allow.
    #[error("protocol violation: expected {expected}, got {got:?}")]
    Protocol {
        /// What the handshake required.
        expected: &'static str,
        /// What arrived instead.
        got: String,
    },

    /// The peer closed its end of the channel.
    #[error("channel closed by peer")]
    ChannelClosed,

    /// Framing failure on the channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// The worker process could not be spawned.
    #[error("failed to spawn worker {name:?}: {source}")]
    Spawn {
        /// Supervisor name.
        name: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Filesystem or process I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The worker was force-killed by the shutdown sweep before `close`.
    #[error("worker {name:?} was killed before close")]
    WorkerKilled {
        /// Supervisor name.
        name: String,
    },

    /// The worker process was asked to build a task kind it does not know.
    #[error("unknown task kind {kind:?}")]
    UnknownTaskKind {
        /// The requested kind.
        kind: String,
    },

    /// The task faulted inside the worker; `report` is the crash report verbatim.
    #[error("worker {name:?} crashed; crash report follows:\n{report}")]
    WorkerFaulted {
        /// Supervisor name.
        name: String,
        /// Full crash report text.
        report: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::RuntimeError;
    ///
    /// let err = RuntimeError::DuplicateName { name: "t1".into() };
    /// assert_eq!(err.as_label(), "runtime_duplicate_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidName { .. } => "runtime_invalid_name",
            RuntimeError::InvalidSignal { .. } => "runtime_invalid_signal",
            RuntimeError::ReservedSignal { .. } => "runtime_reserved_signal",
            RuntimeError::UnknownSignal { .. } => "runtime_unknown_signal",
            RuntimeError::DuplicateName { .. } => "runtime_duplicate_name",
            RuntimeError::NotRegistered { .. } => "runtime_not_registered",
            RuntimeError::NotStarted { .. } => "runtime_not_started",
            RuntimeError::AlreadyStarted { .. } => "runtime_already_started",
            RuntimeError::StaleCrashReport { .. } => "runtime_stale_crash_report",
            RuntimeError::Protocol { .. } => "runtime_protocol",
            RuntimeError::ChannelClosed => "runtime_channel_closed",
            RuntimeError::Channel(_) => "runtime_channel",
            RuntimeError::Spawn { .. } => "runtime_spawn",
            RuntimeError::Io(_) => "runtime_io",
            RuntimeError::WorkerKilled { .. } => "runtime_worker_killed",
            RuntimeError::UnknownTaskKind { .. } => "runtime_unknown_task_kind",
            RuntimeError::WorkerFaulted { .. } => "runtime_worker_faulted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::WorkerFaulted { name, .. } => format!("worker {name:?} faulted"),
            other => other.to_string(),
        }
    }

    /// True for wiring bugs (protocol violations, registry misuse, undeclared
    /// signals). False for task faults and environmental failures.
    pub fn is_coding_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::InvalidName { .. }
                | RuntimeError::InvalidSignal { .. }
                | RuntimeError::ReservedSignal { .. }
                | RuntimeError::UnknownSignal { .. }
                | RuntimeError::DuplicateName { .. }
                | RuntimeError::NotRegistered { .. }
                | RuntimeError::NotStarted { .. }
                | RuntimeError::AlreadyStarted { .. }
                | RuntimeError::StaleCrashReport { .. }
                | RuntimeError::Protocol { .. }
                | RuntimeError::UnknownTaskKind { .. }
        )
    }
}

/// Boxed cause attached to a [`TaskError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by task execution.
///
/// Returned from [`Task::process`](crate::Task::process). Any of them moves the
/// worker into its faulted state; the variant only changes the report wording.
///
/// Constructors are `#[track_caller]`: the crash report names the file and
/// line that built the error, followed by its `source()` chain.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Processing the signal failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
        /// Where the error was constructed.
        location: &'static Location<'static>,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The task considers its own state unusable.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
        /// Where the error was constructed.
        location: &'static Location<'static>,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    #[track_caller]
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
            location: Location::caller(),
            source: None,
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    #[track_caller]
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
            location: Location::caller(),
            source: None,
        }
    }

    /// Wraps an underlying error as [`TaskError::Fail`], keeping it as the source.
    ///
    /// # Example
    /// ```
    /// use procvisor::TaskError;
    ///
    /// let io = std::io::Error::other("disk full");
    /// let err = TaskError::caused_by("flush failed", io);
    /// assert_eq!(err.to_string(), "execution failed: flush failed");
    /// assert!(std::error::Error::source(&err).is_some());
    /// ```
    #[track_caller]
    pub fn caused_by(error: impl Into<String>, source: impl Into<BoxError>) -> Self {
        TaskError::Fail {
            error: error.into(),
            location: Location::caller(),
            source: Some(source.into()),
        }
    }

    /// Attaches (or replaces) the underlying cause.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        match &mut self {
            TaskError::Fail { source, .. } | TaskError::Fatal { source, .. } => {
                *source = Some(cause.into());
            }
        }
        self
    }

    /// File and line that constructed this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self {
            TaskError::Fail { location, .. } | TaskError::Fatal { location, .. } => location,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use procvisor::TaskError;
    ///
    /// let err = TaskError::fail("kaboom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error, .. } => format!("error: {error}"),
            TaskError::Fatal { error, .. } => format!("fatal: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coding_errors_are_classified() {
        assert!(RuntimeError::DuplicateName { name: "a".into() }.is_coding_error());
        assert!(
            RuntimeError::Protocol {
                expected: "Started",
                got: "Closed".into()
            }
            .is_coding_error()
        );
        assert!(!RuntimeError::ChannelClosed.is_coding_error());
        assert!(
            !RuntimeError::WorkerFaulted {
                name: "a".into(),
                report: String::new()
            }
            .is_coding_error()
        );
    }

    #[test]
    fn faulted_display_embeds_report_verbatim() {
        let err = RuntimeError::WorkerFaulted {
            name: "boom".into(),
            report: "line one\nkaboom\n".into(),
        };
        let text = err.to_string();
        assert!(text.contains("line one\nkaboom\n"));
        assert_eq!(err.as_message(), "worker \"boom\" faulted");
    }

    #[test]
    fn task_error_labels() {
        assert_eq!(TaskError::fail("x").as_message(), "error: x");
        let fatal = TaskError::fatal("y");
        assert_eq!(fatal.as_label(), "task_fatal");
        assert_eq!(fatal.to_string(), "fatal error: y");
    }

    #[test]
    fn task_error_records_construction_site() {
        let err = TaskError::fail("x");
        assert_eq!(err.location().file(), file!());
        assert_eq!(err.location().line(), line!() - 2);
    }

    #[test]
    fn task_error_keeps_its_cause() {
        use std::error::Error as _;

        let err = TaskError::fatal("state lost").with_source(std::io::Error::other("disk gone"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk gone"));
    }
}
