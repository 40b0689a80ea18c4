//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the procvisor runtime.
//!
//! ## Sentinel values
//! - `worker_program = None` → re-execute the current executable
//! - `kill_grace = 0s` → do not wait for killed workers in the blocking sweep

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `worker_program`: executable spawned for each worker (`None` = current executable)
/// - `worker_args`: extra arguments passed to every worker
/// - `crash_dir`: directory holding `<name>.crash` reports
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `kill_grace`: how long the blocking sweep waits for each killed worker
#[derive(Clone, Debug)]
pub struct Config {
    /// Program to spawn as the worker.
    ///
    /// The program must call [`serve_if_spawned`](crate::worker::serve_if_spawned)
    /// with a catalog that knows every task kind it will be asked to run.
    pub worker_program: Option<PathBuf>,

    /// Extra arguments passed to every worker process.
    pub worker_args: Vec<OsString>,

    /// Directory for crash reports. Created on demand.
    pub crash_dir: PathBuf,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Upper bound on waiting for a force-killed worker during the blocking sweep.
    pub kill_grace: Duration,
}

impl Config {
    /// Resolves the worker program, falling back to the current executable.
    pub fn worker_program(&self) -> std::io::Result<PathBuf> {
        match &self.worker_program {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe(),
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `worker_program = None` (current executable)
    /// - `worker_args = []`
    /// - `crash_dir = <temp_dir>/procvisor`
    /// - `bus_capacity = 1024`
    /// - `kill_grace = 5s`
    fn default() -> Self {
        Self {
            worker_program: None,
            worker_args: Vec::new(),
            crash_dir: std::env::temp_dir().join("procvisor"),
            bus_capacity: 1024,
            kill_grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_helpers() {
        let mut cfg = Config::default();
        assert!(cfg.crash_dir.ends_with("procvisor"));
        assert_eq!(cfg.worker_program().unwrap(), std::env::current_exe().unwrap());

        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        cfg.worker_program = Some(PathBuf::from("/bin/true"));
        assert_eq!(cfg.worker_program().unwrap(), PathBuf::from("/bin/true"));
    }
}
