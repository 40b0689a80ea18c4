//! # Reaper - last-resort sweep of leaked worker processes.
//!
//! Every spawned worker is tracked here from spawn until its supervisor takes
//! it back to wait for a clean exit. Whatever is still tracked when the
//! program ends was leaked (its supervisor never called `close`).
//!
//! ## Sweep
//! ```text
//! for each tracked worker:
//!   warn ─► force kill ─► wait for exit ─► publish WorkerKilled
//! ```
//! The sweep does not run the crash-report recovery path: a faulted worker
//! killed here may leave its `<name>.crash` file behind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::process::Child;

use crate::events::{Bus, Event, EventKind};

/// Identifier of a tracked worker, unique within one reaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(u64);

struct Tracked {
    name: String,
    child: Child,
}

/// Tracks live worker processes and kills leftovers on shutdown.
pub struct Reaper {
    next_id: AtomicU64,
    live: Mutex<HashMap<WorkerId, Tracked>>,
    bus: Bus,
    kill_grace: Duration,
}

impl Reaper {
    /// Creates an empty reaper.
    pub fn new(bus: Bus, kill_grace: Duration) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            live: Mutex::new(HashMap::new()),
            bus,
            kill_grace,
        }
    }

    /// Starts tracking a freshly spawned worker.
    pub(crate) fn track(&self, name: &str, child: Child) -> WorkerId {
        let id = WorkerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(
            id,
            Tracked {
                name: name.to_string(),
                child,
            },
        );
        id
    }

    /// Stops tracking a worker and hands its handle back.
    ///
    /// `None` means the sweep already killed it.
    pub(crate) fn take(&self, id: WorkerId) -> Option<Child> {
        self.lock().remove(&id).map(|t| t.child)
    }

    /// Number of workers currently tracked.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no worker is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Kills every tracked worker and waits for each to exit.
    ///
    /// Returns the number of workers killed.
    pub async fn sweep(&self) -> usize {
        let leaked = self.drain();
        let count = leaked.len();
        for mut t in leaked {
            let pid = t.child.id();
            tracing::warn!(name = %t.name, ?pid, "killing leaked worker process");
            let reason = match t.child.kill().await {
                Ok(()) => "shutdown sweep".to_string(),
                Err(e) => format!("shutdown sweep: kill failed: {e}"),
            };
            self.publish_killed(&t.name, pid, reason);
        }
        count
    }

    /// Blocking variant of [`sweep`](Self::sweep) for use from `Drop`.
    ///
    /// Sends the kill to every worker first, then waits for each up to
    /// `kill_grace`.
    pub fn sweep_blocking(&self) -> usize {
        let mut leaked = self.drain();
        let count = leaked.len();
        for t in &mut leaked {
            tracing::warn!(name = %t.name, pid = ?t.child.id(), "killing leaked worker process");
            if let Err(e) = t.child.start_kill() {
                tracing::warn!(name = %t.name, error = %e, "failed to signal worker");
            }
        }

        let deadline = Instant::now() + self.kill_grace;
        for mut t in leaked {
            let pid = t.child.id();
            let reason = loop {
                match t.child.try_wait() {
                    Ok(Some(status)) => break format!("shutdown sweep: {status}"),
                    Ok(None) if Instant::now() >= deadline => {
                        tracing::warn!(name = %t.name, ?pid, "worker did not exit within kill grace");
                        break "shutdown sweep: exit not observed".to_string();
                    }
                    Ok(None) => std::thread::sleep(Duration::from_millis(10)),
                    Err(e) => break format!("shutdown sweep: wait failed: {e}"),
                }
            };
            self.publish_killed(&t.name, pid, reason);
        }
        count
    }

    fn drain(&self) -> Vec<Tracked> {
        self.lock().drain().map(|(_, t)| t).collect()
    }

    fn publish_killed(&self, name: &str, pid: Option<u32>, reason: String) {
        self.bus.publish(
            Event::new(EventKind::WorkerKilled)
                .with_task(name)
                .with_pid(pid)
                .with_reason(reason),
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WorkerId, Tracked>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn sleeper() -> Child {
        Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn sweep_kills_tracked_workers() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let reaper = Reaper::new(bus, Duration::from_secs(5));
        reaper.track("leak-a", sleeper());
        reaper.track("leak-b", sleeper());
        assert_eq!(reaper.len(), 2);

        assert_eq!(reaper.sweep().await, 2);
        assert!(reaper.is_empty());
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::WorkerKilled);
    }

    #[tokio::test]
    async fn taken_workers_are_not_swept() {
        let reaper = Reaper::new(Bus::new(4), Duration::from_secs(5));
        let id = reaper.track("owned", sleeper());
        let mut child = reaper.take(id).unwrap();
        assert!(reaper.take(id).is_none());

        assert_eq!(reaper.sweep_blocking(), 0);
        child.kill().await.unwrap();
    }

    #[tokio::test]
    async fn blocking_sweep_waits_for_exit() {
        let reaper = Reaper::new(Bus::new(4), Duration::from_secs(5));
        reaper.track("leak", sleeper());
        assert_eq!(reaper.sweep_blocking(), 1);
        assert!(reaper.is_empty());
    }
}
