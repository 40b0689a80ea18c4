//! # Worker loop.
//!
//! [`run`] drives one task through the worker state machine over any
//! [`Endpoint`]. It returns an explicit outcome instead of letting a task fault
//! escape as a process crash.

use std::process::ExitCode;

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncWrite};

use super::fault;
use crate::channel::Endpoint;
use crate::crash::{CrashReport, Header};
use crate::error::RuntimeError;
use crate::signals::{Control, DomainSignal, Signal};
use crate::tasks::Task;

/// How the worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// `Close` was answered with `Closed`.
    Closed,
    /// A fault was reported and the supervisor sent `ExceptionAck`.
    Acknowledged,
}

impl WorkerOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> ExitCode {
        match self {
            WorkerOutcome::Closed => ExitCode::SUCCESS,
            WorkerOutcome::Acknowledged => ExitCode::from(1),
        }
    }
}

/// Per-worker context: identity and crash report location.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    /// Supervisor name.
    pub name: String,
    /// Crash report written on fault.
    pub report: CrashReport,
    /// Process id recorded in the report header.
    pub pid: u32,
}

/// Runs the worker state machine until `Closed` or `Acknowledged`.
///
/// ### Errors
/// - [`RuntimeError::Protocol`] if the first signal is not `Start`;
/// - [`RuntimeError::UnknownSignal`] if a signal other than `Close` or a
///   declared domain signal arrives while running;
/// - channel and I/O errors as they occur.
pub async fn run<R, W>(
    task: &dyn Task,
    endpoint: &mut Endpoint<R, W>,
    ctx: &WorkerContext,
) -> Result<WorkerOutcome, RuntimeError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let first = endpoint.receive().await?;
    if !first.is(Control::Start) {
        return Err(RuntimeError::Protocol {
            expected: "Start",
            got: first.to_string(),
        });
    }
    endpoint.send(Control::Started).await?;

    loop {
        let signal = endpoint.receive().await?;
        match signal {
            Signal::Control(Control::Close) => {
                endpoint.send(Control::Closed).await?;
                return Ok(WorkerOutcome::Closed);
            }
            Signal::Domain(ref d) if task.signals().accepts(&signal) => {
                if let Err(fault) = dispatch(task, d).await {
                    let header = Header {
                        name: &ctx.name,
                        kind: task.kind(),
                        pid: ctx.pid,
                        signal: d.as_str(),
                    };
                    if ctx.report.write(&header, &fault).await? {
                        tracing::warn!(
                            path = %ctx.report.path().display(),
                            "crash report already existed and was overwritten"
                        );
                    }
                    endpoint.send(Control::Exception).await?;
                    return faulted(endpoint, ctx).await;
                }
            }
            other => {
                return Err(RuntimeError::UnknownSignal {
                    task: task.kind().to_string(),
                    signal: other.to_string(),
                });
            }
        }
    }
}

/// Invokes the task, catching both `Err` and panics.
async fn dispatch(task: &dyn Task, signal: &DomainSignal) -> Result<(), crate::crash::Fault> {
    match std::panic::AssertUnwindSafe(task.process(signal))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(fault::from_error(&err)),
        Err(payload) => Err(fault::from_panic(payload.as_ref())),
    }
}

/// Pure reporter state: no task work, wait for `ExceptionAck`.
async fn faulted<R, W>(
    endpoint: &mut Endpoint<R, W>,
    ctx: &WorkerContext,
) -> Result<WorkerOutcome, RuntimeError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut index: u32 = 0;
    loop {
        let signal = endpoint.receive().await?;
        if signal.is(Control::ExceptionAck) {
            return Ok(WorkerOutcome::Acknowledged);
        }
        index += 1;
        ctx.report
            .append_unexpected(index, signal.as_str())
            .await?;
    }
}
