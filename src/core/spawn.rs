//! Worker process spawning.
//!
//! The worker is the configured program re-executed with its identity in the
//! environment. stdin/stdout become the duplex channel; stderr is inherited so
//! worker logs reach the parent's terminal.

use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::core::config::Config;
use crate::error::RuntimeError;
use crate::worker::WorkerEnv;

/// A spawned worker with its channel pipes split off.
pub(crate) struct SpawnedWorker {
    /// The child process handle.
    pub child: Child,
    /// The OS process ID.
    pub pid: Option<u32>,
    /// Parent → worker pipe.
    pub stdin: ChildStdin,
    /// Worker → parent pipe.
    pub stdout: ChildStdout,
}

/// Spawns the worker program for `env`.
///
/// # Errors
///
/// Returns [`RuntimeError::Spawn`] if the program cannot be resolved or
/// started, or if its pipes are missing.
pub(crate) fn spawn(cfg: &Config, env: &WorkerEnv) -> Result<SpawnedWorker, RuntimeError> {
    let spawn_err = |source: std::io::Error| RuntimeError::Spawn {
        name: env.name.clone(),
        source,
    };

    let program = cfg.worker_program().map_err(spawn_err)?;
    let mut cmd = Command::new(program);
    cmd.args(&cfg.worker_args)
        .envs(env.vars())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(false);

    let mut child = cmd.spawn().map_err(spawn_err)?;
    let pid = child.id();

    let pipes = child.stdin.take().zip(child.stdout.take());
    let Some((stdin, stdout)) = pipes else {
        let _ = child.start_kill();
        return Err(spawn_err(std::io::Error::other("worker pipes unavailable")));
    };

    Ok(SpawnedWorker {
        child,
        pid,
        stdin,
        stdout,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn env() -> WorkerEnv {
        WorkerEnv {
            kind: "echo".into(),
            name: "spawn-test".into(),
            crash_report: PathBuf::from("/tmp/spawn-test.crash"),
        }
    }

    #[tokio::test]
    async fn passes_identity_through_environment() {
        use tokio::io::AsyncReadExt;

        let cfg = Config {
            worker_program: Some(PathBuf::from("sh")),
            worker_args: vec!["-c".into(), "printf %s \"$PROCVISOR_WORKER_NAME\"".into()],
            ..Config::default()
        };
        let mut spawned = spawn(&cfg, &env()).unwrap();
        assert!(spawned.pid.is_some());

        let mut out = String::new();
        spawned.stdout.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "spawn-test");
        assert!(spawned.child.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let cfg = Config {
            worker_program: Some(PathBuf::from("nonexistent_program_12345")),
            ..Config::default()
        };
        let err = spawn(&cfg, &env()).err().unwrap();
        assert_eq!(err.as_label(), "runtime_spawn");
    }
}
