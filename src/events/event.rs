//! # Lifecycle events emitted by supervisors and the reaper.
//!
//! [`EventKind`] classifies events in three groups:
//! - **Worker lifecycle**: spawn, handshake, signals, fault, close, kill
//! - **Runtime**: shutdown requested
//! - **Subscriber health**: overflow, panic
//!
//! ## Ordering guarantees
//! Each event has a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SignalSent)
//!     .with_task("echo")
//!     .with_signal("ping");
//!
//! assert_eq!(ev.kind, EventKind::SignalSent);
//! assert_eq!(ev.task.as_deref(), Some("echo"));
//! assert_eq!(ev.signal.as_deref(), Some("ping"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Worker lifecycle ===
    /// Worker process spawned; handshake not yet done.
    ///
    /// Sets `task`, `pid`.
    WorkerSpawned,

    /// `Start`/`Started` handshake completed and the name was registered.
    ///
    /// Sets `task`, `pid`.
    WorkerStarted,

    /// A domain signal was sent to the worker.
    ///
    /// Sets `task`, `signal`.
    SignalSent,

    /// The worker reported a task fault (`Exception`).
    ///
    /// Sets `task`, `pid`, `reason` (crash report path).
    WorkerFaulted,

    /// The worker exited after `Closed` or `ExceptionAck`.
    ///
    /// Sets `task`, `pid`, `reason` (exit status).
    WorkerClosed,

    /// The worker was force-killed (shutdown sweep or failed start).
    ///
    /// Sets `task`, `pid`, `reason`.
    WorkerKilled,

    // === Runtime ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    // === Subscriber health ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `task` (subscriber name), `reason`.
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets `task` (subscriber name), `reason`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Supervisor (or subscriber) name, if applicable.
    pub task: Option<Arc<str>>,
    /// Signal name, if applicable.
    pub signal: Option<Arc<str>>,
    /// Worker process id, if applicable.
    pub pid: Option<u32>,
    /// Human-readable reason (exit status, report path, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            signal: None,
            pid: None,
            reason: None,
        }
    }

    /// Attaches a supervisor name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a signal name.
    #[inline]
    pub fn with_signal(mut self, signal: impl Into<Arc<str>>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    /// Attaches a worker pid.
    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for events describing subscriber health (never re-published to subscribers' own queues).
    #[inline]
    pub fn is_subscriber_health(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
