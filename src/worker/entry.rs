//! Worker process entry point.

use std::process::ExitCode;

use super::env::WorkerEnv;
use super::fault::install_panic_hook;
use super::run::{run, WorkerContext, WorkerOutcome};
use crate::channel::Endpoint;
use crate::crash::CrashReport;
use crate::error::RuntimeError;
use crate::tasks::Catalog;

/// Exit code of a worker that hit a protocol violation or could not start.
pub const EXIT_PROTOCOL_VIOLATION: u8 = 2;

/// Runs the worker loop if this process was spawned by a supervisor.
///
/// Call it first thing in `main`. Returns `None` in an ordinary process, so the
/// program continues with its own logic; in a worker it serves the protocol
/// over stdin/stdout and returns the exit code to end the process with.
///
/// # Example
/// ```no_run
/// use std::process::ExitCode;
/// use procvisor::{Catalog, SignalSet, TaskError, TaskFn, TaskRef};
///
/// fn echo() -> TaskRef {
///     TaskFn::arc("echo", SignalSet::new(["ping"]).unwrap(), |_sig| async {
///         Ok::<_, TaskError>(())
///     })
/// }
///
/// #[tokio::main]
/// async fn main() -> ExitCode {
///     let catalog = Catalog::new().with("echo", echo);
///     if let Some(code) = procvisor::worker::serve_if_spawned(&catalog).await {
///         return code;
///     }
///     // supervisor side ...
///     ExitCode::SUCCESS
/// }
/// ```
pub async fn serve_if_spawned(catalog: &Catalog) -> Option<ExitCode> {
    let env = WorkerEnv::from_env()?;
    install_panic_hook();

    let code = match serve(&env, catalog).await {
        Ok(outcome) => {
            tracing::debug!(name = %env.name, ?outcome, "worker finished");
            outcome.exit_code()
        }
        Err(e) => {
            tracing::error!(name = %env.name, kind = %env.kind, error = %e, "worker terminated abnormally");
            ExitCode::from(EXIT_PROTOCOL_VIOLATION)
        }
    };
    Some(code)
}

async fn serve(env: &WorkerEnv, catalog: &Catalog) -> Result<WorkerOutcome, RuntimeError> {
    let task = catalog.build(&env.kind)?;
    let ctx = WorkerContext {
        name: env.name.clone(),
        report: CrashReport::at(env.crash_report.clone()),
        pid: std::process::id(),
    };
    let mut endpoint = Endpoint::new(tokio::io::stdin(), tokio::io::stdout());
    run(task.as_ref(), &mut endpoint, &ctx).await
}
