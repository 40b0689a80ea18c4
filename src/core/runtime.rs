//! # Runtime: shared state behind every supervisor.
//!
//! A [`Runtime`] owns the pieces all supervisors in a program share:
//! - [`Bus`] lifecycle events, forwarded to the [`SubscriberSet`] by a listener task;
//! - [`Registry`] names of active supervisors;
//! - [`Reaper`] every spawned worker until its supervisor takes it back.
//!
//! ```text
//! Runtime::supervisor(name, task) ──► Supervisor ── publish ──► Bus ──► listener ──► SubscriberSet
//!                                        │  │
//!                               register │  │ track/take
//!                                        ▼  ▼
//!                                 Registry  Reaper ◄── sweep (guard drop / OS signal)
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, oneshot};
use tokio::task::JoinHandle;

use crate::core::builder::RuntimeBuilder;
use crate::core::config::Config;
use crate::core::reaper::Reaper;
use crate::core::registry::Registry;
use crate::core::shutdown::{wait_for_shutdown_signal, ShutdownGuard};
use crate::core::supervisor::Supervisor;
use crate::crash::CrashReport;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::SubscriberSet;
use crate::tasks::TaskRef;

/// State shared by the runtime and its supervisors.
pub(crate) struct Shared {
    pub cfg: Config,
    pub bus: Bus,
    pub registry: Arc<Registry>,
    pub reaper: Arc<Reaper>,
}

/// Entry point of the parent side: builds supervisors and owns cleanup.
pub struct Runtime {
    shared: Arc<Shared>,
    subs: Arc<SubscriberSet>,
    stop: oneshot::Sender<()>,
    listener: JoinHandle<()>,
}

impl Runtime {
    /// Returns a builder for a runtime with the given configuration.
    pub fn builder(cfg: Config) -> RuntimeBuilder {
        RuntimeBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, subs: SubscriberSet, bus: Bus) -> Self {
        let reaper = Arc::new(Reaper::new(bus.clone(), cfg.kill_grace));
        let shared = Arc::new(Shared {
            cfg,
            bus,
            registry: Registry::new(),
            reaper,
        });
        let subs = Arc::new(subs);
        let (stop, stopped) = oneshot::channel();
        let listener = subscriber_listener(&shared.bus, Arc::clone(&subs), stopped);

        Self {
            shared,
            subs,
            stop,
            listener,
        }
    }

    /// Creates a supervisor for `task` under `name`.
    ///
    /// Nothing is spawned until [`Supervisor::start`].
    ///
    /// ### Errors
    /// - [`RuntimeError::InvalidName`] if `name` cannot be a crash report file name;
    /// - [`RuntimeError::StaleCrashReport`] if `<crash_dir>/<name>.crash` exists
    ///   (a previous run crashed and its report was never consumed).
    pub fn supervisor(&self, name: impl Into<String>, task: TaskRef) -> Result<Supervisor, RuntimeError> {
        let name = name.into();
        validate_name(&name)?;

        let report = CrashReport::for_name(&self.shared.cfg.crash_dir, &name);
        if report.path().try_exists().unwrap_or(false) {
            return Err(RuntimeError::StaleCrashReport {
                path: report.path().to_path_buf(),
            });
        }
        Ok(Supervisor::new(name, task, report, Arc::clone(&self.shared)))
    }

    /// Configuration this runtime was built with.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Registry of active supervisor names.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.shared.registry
    }

    /// Sorted names of active supervisors.
    pub async fn active(&self) -> Vec<String> {
        self.shared.registry.list().await
    }

    /// Tracker of live worker processes.
    pub fn reaper(&self) -> &Arc<Reaper> {
        &self.shared.reaper
    }

    /// Event bus; subscribe for a raw event stream.
    pub fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    /// Returns a guard that kills leaked workers when dropped.
    pub fn shutdown_guard(&self) -> ShutdownGuard {
        ShutdownGuard::new(Arc::clone(&self.shared.reaper))
    }

    /// Kills every worker still tracked. Returns how many were killed.
    pub async fn sweep(&self) -> usize {
        self.shared.reaper.sweep().await
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere), then sweeps.
    ///
    /// Returns the number of workers killed.
    pub async fn shutdown_on_signal(&self) -> std::io::Result<usize> {
        wait_for_shutdown_signal().await?;
        tracing::warn!("termination signal received; sweeping workers");
        self.shared.bus.publish(Event::new(EventKind::ShutdownRequested));
        Ok(self.sweep().await)
    }

    /// Sweeps leftover workers, flushes pending events to subscribers and
    /// stops them. Returns the number of workers killed.
    pub async fn shutdown(self) -> usize {
        let killed = self.sweep().await;

        let Self {
            shared,
            subs,
            stop,
            listener,
        } = self;
        let _ = stop.send(());
        let _ = listener.await;
        drop(shared);

        match Arc::try_unwrap(subs) {
            Ok(set) => set.shutdown().await,
            Err(_) => tracing::debug!("subscriber set still shared; skipping flush"),
        }
        killed
    }
}

/// Forwards bus events to the subscriber set until stopped.
///
/// Pending events are drained before the stop request is honored.
fn subscriber_listener(
    bus: &Bus,
    set: Arc<SubscriberSet>,
    mut stopped: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stopped => break,
            }
        }
    })
}

/// Supervisor names become file names: `<crash_dir>/<name>.crash`.
fn validate_name(name: &str) -> Result<(), RuntimeError> {
    let reason = if name.is_empty() {
        "empty"
    } else if name == "." || name == ".." {
        "reserved path component"
    } else if name.contains(['/', '\\']) {
        "contains a path separator"
    } else if name.chars().any(char::is_control) {
        "contains a control character"
    } else {
        return Ok(());
    };
    Err(RuntimeError::InvalidName {
        name: name.to_string(),
        reason,
    })
}
