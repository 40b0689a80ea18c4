//! # Shutdown: OS signals and the scope-guard sweep.
//!
//! Two ways to trigger the [`Reaper`] sweep when the program is ending:
//! - [`ShutdownGuard`] - dropped at the end of `main` (or during unwinding),
//!   kills every worker that was never closed;
//! - [`wait_for_shutdown_signal`] - completes on a termination signal, used by
//!   [`Runtime::shutdown_on_signal`](crate::Runtime::shutdown_on_signal).
//!
//! ## Signals
//! **Unix platforms:** `SIGINT` (Ctrl-C), `SIGTERM`, `SIGQUIT`.
//!
//! **Windows platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

use std::sync::Arc;

use crate::core::reaper::Reaper;

/// Scope guard that sweeps leaked workers when dropped.
///
/// Obtain it from [`Runtime::shutdown_guard`](crate::Runtime::shutdown_guard)
/// and bind it at the top of `main`:
///
/// ```no_run
/// # async fn demo() -> Result<(), procvisor::RuntimeError> {
/// let runtime = procvisor::Runtime::builder(procvisor::Config::default()).build();
/// let _guard = runtime.shutdown_guard();
/// // ... start, drive and close supervisors ...
/// # Ok(())
/// # }
/// ```
#[must_use = "the sweep runs when the guard is dropped"]
pub struct ShutdownGuard {
    reaper: Arc<Reaper>,
}

impl ShutdownGuard {
    pub(crate) fn new(reaper: Arc<Reaper>) -> Self {
        Self { reaper }
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        if self.reaper.is_empty() {
            return;
        }
        let killed = self.reaper.sweep_blocking();
        tracing::warn!(killed, "shutdown sweep killed leaked workers");
    }
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
