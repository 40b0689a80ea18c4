//! # LogWriter: renders lifecycle events through `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  procvisor: worker spawned task="echo" pid=4242
//! INFO  procvisor: worker started task="echo" pid=4242
//! DEBUG procvisor: signal sent task="echo" signal="ping"
//! WARN  procvisor: worker faulted task="boom" pid=4243 report="/tmp/procvisor/boom.crash"
//! WARN  procvisor: worker killed task="leak" pid=4244 reason="shutdown sweep"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::WorkerSpawned => {
                tracing::info!(target: "procvisor", task, pid = ?e.pid, "worker spawned");
            }
            EventKind::WorkerStarted => {
                tracing::info!(target: "procvisor", task, pid = ?e.pid, "worker started");
            }
            EventKind::SignalSent => {
                tracing::debug!(target: "procvisor", task, signal = ?e.signal, "signal sent");
            }
            EventKind::WorkerFaulted => {
                tracing::warn!(target: "procvisor", task, pid = ?e.pid, report = reason, "worker faulted");
            }
            EventKind::WorkerClosed => {
                tracing::info!(target: "procvisor", task, pid = ?e.pid, status = reason, "worker closed");
            }
            EventKind::WorkerKilled => {
                tracing::warn!(target: "procvisor", task, pid = ?e.pid, reason, "worker killed");
            }
            EventKind::ShutdownRequested => {
                tracing::warn!(target: "procvisor", "shutdown requested");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "procvisor", subscriber = task, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "procvisor", subscriber = task, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
