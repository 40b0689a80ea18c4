//! # Supervisor: drives one worker process through its lifecycle.
//!
//! ## Lifecycle
//! ```text
//! Runtime::supervisor(name, task)      validate name, no stale crash report
//!   │
//!   ▼
//! start()   reserve name ─► spawn ─► send Start ─► recv Started ─► activate name
//!   │
//!   ▼
//! send_signal(sig)*                    declared? ─► send (no reply awaited)
//!   │
//!   ▼
//! close()   send Close ─► recv ─┬─ Closed    ─► wait exit ─► unregister ─► Ok
//!                               └─ Exception ─► send ExceptionAck ─► wait exit
//!                                               ─► read + delete crash report
//!                                               ─► unregister ─► Err(WorkerFaulted)
//! ```
//!
//! ## Rules
//! - `start`/`close` failures are coding errors: nothing is retried.
//! - A task fault never crashes the parent; it surfaces once, from `close`.
//! - `close` consumes the supervisor; the registry entry is removed on every
//!   path out of `close`.

use std::sync::Arc;

use tokio::process::{ChildStdin, ChildStdout};

use crate::channel::Endpoint;
use crate::core::reaper::WorkerId;
use crate::core::runtime::Shared;
use crate::core::spawn::spawn;
use crate::crash::CrashReport;
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};
use crate::signals::{Control, Signal};
use crate::tasks::TaskRef;
use crate::worker::WorkerEnv;

type ParentEndpoint = Endpoint<ChildStdout, ChildStdin>;

struct Running {
    worker: WorkerId,
    pid: Option<u32>,
    endpoint: ParentEndpoint,
}

enum State {
    Idle,
    Running(Running),
    Done,
}

/// Parent-side controller of one worker process.
///
/// Built by [`Runtime::supervisor`](crate::Runtime::supervisor).
///
/// # Example
/// ```no_run
/// use procvisor::{Config, Runtime, SignalSet, TaskError, TaskFn};
///
/// # async fn demo() -> Result<(), procvisor::RuntimeError> {
/// let runtime = Runtime::builder(Config::default()).build();
/// let _guard = runtime.shutdown_guard();
///
/// let echo = TaskFn::arc("echo", SignalSet::new(["ping"])?, |_sig| async {
///     Ok::<_, TaskError>(())
/// });
/// let mut sup = runtime.supervisor("echo-1", echo)?;
/// sup.start().await?;
/// sup.send_signal("ping").await?;
/// sup.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Supervisor {
    name: String,
    task: TaskRef,
    report: CrashReport,
    shared: Arc<Shared>,
    state: State,
}

impl Supervisor {
    pub(crate) fn new(name: String, task: TaskRef, report: CrashReport, shared: Arc<Shared>) -> Self {
        Self {
            name,
            task,
            report,
            shared,
            state: State::Idle,
        }
    }

    /// Process-wide unique name of this supervisor.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Crash report location for this supervisor.
    pub fn crash_report(&self) -> &CrashReport {
        &self.report
    }

    /// Worker process id, while running.
    pub fn pid(&self) -> Option<u32> {
        match &self.state {
            State::Running(r) => r.pid,
            _ => None,
        }
    }

    /// True between a successful `start` and `close`.
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Reserves the name, spawns the worker, performs the `Start`/`Started`
    /// handshake and activates the name.
    ///
    /// ### Errors
    /// - [`RuntimeError::AlreadyStarted`] on a second call;
    /// - [`RuntimeError::DuplicateName`] if the name is reserved or active;
    ///   nothing is spawned;
    /// - [`RuntimeError::Spawn`], [`RuntimeError::Protocol`],
    ///   [`RuntimeError::ChannelClosed`] if the worker cannot be brought up.
    ///   The spawned worker is killed and the reservation released before the
    ///   error is returned.
    pub async fn start(&mut self) -> Result<(), RuntimeError> {
        if !matches!(self.state, State::Idle) {
            return Err(RuntimeError::AlreadyStarted {
                name: self.name.clone(),
            });
        }
        self.shared.registry.reserve(&self.name).await?;

        let env = WorkerEnv {
            kind: self.task.kind().to_string(),
            name: self.name.clone(),
            crash_report: self.report.path().to_path_buf(),
        };
        let spawned = match spawn(&self.shared.cfg, &env) {
            Ok(spawned) => spawned,
            Err(e) => {
                self.shared.registry.release(&self.name).await;
                return Err(e);
            }
        };
        let pid = spawned.pid;
        let worker = self.shared.reaper.track(&self.name, spawned.child);
        self.publish(Event::new(EventKind::WorkerSpawned).with_pid(pid));

        let mut endpoint = Endpoint::new(spawned.stdout, spawned.stdin);
        let admitted = match handshake(&mut endpoint).await {
            Ok(()) => self.shared.registry.activate(&self.name).await,
            Err(e) => Err(e),
        };
        if let Err(e) = admitted {
            self.kill(worker, pid, format!("start failed: {}", e.as_label()))
                .await;
            self.shared.registry.release(&self.name).await;
            return Err(e);
        }

        self.state = State::Running(Running {
            worker,
            pid,
            endpoint,
        });
        self.publish(Event::new(EventKind::WorkerStarted).with_pid(pid));
        tracing::info!(name = %self.name, kind = %self.task.kind(), ?pid, "started worker process");
        Ok(())
    }

    /// Sends a declared domain signal without waiting for any reply.
    ///
    /// ### Errors
    /// - [`RuntimeError::UnknownSignal`] if the task does not declare `signal`
    ///   (checked before anything is sent);
    /// - [`RuntimeError::NotStarted`] before `start`;
    /// - channel errors if the worker is gone.
    pub async fn send_signal(&mut self, signal: &str) -> Result<(), RuntimeError> {
        let declared = self
            .task
            .signals()
            .get(signal)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownSignal {
                task: self.task.kind().to_string(),
                signal: signal.to_string(),
            })?;
        let State::Running(running) = &mut self.state else {
            return Err(RuntimeError::NotStarted {
                name: self.name.clone(),
            });
        };

        running.endpoint.send(declared).await?;
        self.publish(Event::new(EventKind::SignalSent).with_signal(signal));
        Ok(())
    }

    /// Closes the worker and releases the name.
    ///
    /// Returns `Ok(())` after a `Close`/`Closed` handshake and worker exit.
    /// If the task faulted, acknowledges the fault, waits for the worker,
    /// consumes the crash report and returns [`RuntimeError::WorkerFaulted`]
    /// carrying the report verbatim.
    pub async fn close(mut self) -> Result<(), RuntimeError> {
        let State::Running(running) = std::mem::replace(&mut self.state, State::Done) else {
            return Err(RuntimeError::NotStarted {
                name: self.name.clone(),
            });
        };

        let Running {
            worker,
            pid,
            endpoint,
        } = running;
        let outcome = self.finish(worker, pid, endpoint).await;
        if let Err(e) = &outcome {
            if !matches!(e, RuntimeError::WorkerFaulted { .. }) {
                self.kill(worker, pid, format!("close failed: {}", e.as_label()))
                    .await;
            }
        }
        let unregistered = self.shared.registry.unregister(&self.name).await;
        outcome.and(unregistered)
    }

    async fn finish(
        &self,
        worker: WorkerId,
        pid: Option<u32>,
        mut endpoint: ParentEndpoint,
    ) -> Result<(), RuntimeError> {
        endpoint.send(Control::Close).await?;
        let reply = endpoint.receive().await?;

        match reply {
            Signal::Control(Control::Closed) => {
                // Closing the worker's stdin unblocks any pending read on its side.
                drop(endpoint);
                self.wait_exit(worker, pid).await?;
                tracing::info!(name = %self.name, "closed worker process");
                Ok(())
            }
            Signal::Control(Control::Exception) => {
                self.publish(
                    Event::new(EventKind::WorkerFaulted)
                        .with_pid(pid)
                        .with_reason(self.report.path().display().to_string()),
                );
                endpoint.send(Control::ExceptionAck).await?;
                drop(endpoint);
                self.wait_exit(worker, pid).await?;
                let report = self.report.take().await?;
                tracing::warn!(name = %self.name, "worker crashed; crash report consumed");
                Err(RuntimeError::WorkerFaulted {
                    name: self.name.clone(),
                    report,
                })
            }
            other => Err(RuntimeError::Protocol {
                expected: "Closed or Exception",
                got: other.to_string(),
            }),
        }
    }

    /// Waits for the worker to exit and releases its handle.
    async fn wait_exit(&self, worker: WorkerId, pid: Option<u32>) -> Result<(), RuntimeError> {
        let Some(mut child) = self.shared.reaper.take(worker) else {
            return Err(RuntimeError::WorkerKilled {
                name: self.name.clone(),
            });
        };
        let status = child.wait().await?;
        self.publish(
            Event::new(EventKind::WorkerClosed)
                .with_pid(pid)
                .with_reason(status.to_string()),
        );
        Ok(())
    }

    /// Force-kills a worker that is still tracked (no-op if already reaped).
    async fn kill(&self, worker: WorkerId, pid: Option<u32>, reason: String) {
        let Some(mut child) = self.shared.reaper.take(worker) else {
            return;
        };
        if let Err(e) = child.kill().await {
            tracing::warn!(name = %self.name, error = %e, "failed to kill worker");
        }
        self.publish(
            Event::new(EventKind::WorkerKilled)
                .with_pid(pid)
                .with_reason(reason),
        );
    }

    fn publish(&self, ev: Event) {
        self.shared.bus.publish(ev.with_task(self.name.as_str()));
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let State::Running(running) = &self.state {
            tracing::warn!(
                name = %self.name,
                pid = ?running.pid,
                "supervisor dropped without close; worker left to the shutdown sweep"
            );
        }
    }
}

async fn handshake(endpoint: &mut ParentEndpoint) -> Result<(), RuntimeError> {
    endpoint.send(Control::Start).await?;
    let reply = endpoint.receive().await?;
    if !reply.is(Control::Started) {
        return Err(RuntimeError::Protocol {
            expected: "Started",
            got: reply.to_string(),
        });
    }
    Ok(())
}
