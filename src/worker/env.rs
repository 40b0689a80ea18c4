//! Environment handed from supervisor to worker.

use std::ffi::OsString;
use std::path::PathBuf;

/// Task kind the worker must rebuild from its catalog.
pub const ENV_KIND: &str = "PROCVISOR_WORKER_KIND";
/// Supervisor name.
pub const ENV_NAME: &str = "PROCVISOR_WORKER_NAME";
/// Crash report path.
pub const ENV_CRASH_REPORT: &str = "PROCVISOR_CRASH_REPORT";

/// Identity of a spawned worker, read from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEnv {
    /// Task kind.
    pub kind: String,
    /// Supervisor name.
    pub name: String,
    /// Crash report path.
    pub crash_report: PathBuf,
}

impl WorkerEnv {
    /// Reads the worker identity; `None` when this process was not spawned as a worker.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Option<Self> {
        let kind = lookup(ENV_KIND)?.into_string().ok()?;
        let name = lookup(ENV_NAME)?.into_string().ok()?;
        let crash_report = PathBuf::from(lookup(ENV_CRASH_REPORT)?);
        Some(Self {
            kind,
            name,
            crash_report,
        })
    }

    /// Key/value pairs to set on the child command.
    pub fn vars(&self) -> [(&'static str, OsString); 3] {
        [
            (ENV_KIND, OsString::from(&self.kind)),
            (ENV_NAME, OsString::from(&self.name)),
            (ENV_CRASH_REPORT, self.crash_report.clone().into_os_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn vars_round_trip_through_lookup() {
        let env = WorkerEnv {
            kind: "echo".into(),
            name: "e1".into(),
            crash_report: PathBuf::from("/tmp/pv/e1.crash"),
        };
        let map: HashMap<&str, OsString> = env.vars().into_iter().collect();
        let back = WorkerEnv::from_lookup(|k| map.get(k).cloned()).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn missing_kind_means_not_a_worker() {
        assert!(WorkerEnv::from_lookup(|_| None).is_none());
    }
}
