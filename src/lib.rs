//! # procvisor
//!
//! **Procvisor** runs tasks in isolated worker processes and drives them over
//! a small line-based signal protocol.
//!
//! A task that panics or returns an error cannot take the parent down: the
//! worker captures the fault into a crash report file, tells the parent, and
//! waits. The parent learns about it once, when it closes the supervisor.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  parent process                                      worker process (same binary, re-executed)
//! ┌──────────────────────────────────────────┐        ┌──────────────────────────────────────┐
//! │ Runtime                                  │        │ serve_if_spawned(&catalog)           │
//! │  - Registry (active names)               │  spawn │  - WorkerEnv (kind, name, report)    │
//! │  - Reaper   (live child processes) ──────┼───────►│  - Catalog::build(kind) ─► Task      │
//! │  - Bus ──► listener ──► SubscriberSet    │        │                                      │
//! │                                          │        │ worker::run                          │
//! │ Supervisor ── stdin  (Start, Close, sig) ┼───────►│  AwaitingStart ─► Running ─► Closed  │
//! │            ◄─ stdout (Started, Closed,   ┼────────┤                     │                │
//! │                       Exception)         │        │                  Faulted ─► Acknowledged
//! │                                          │        │                     │                │
//! │ close() ◄── read + delete ───────────────┼────────┼── <crash_dir>/<name>.crash ◄──┘     │
//! └──────────────────────────────────────────┘        └──────────────────────────────────────┘
//! ```
//!
//! ### Protocol
//! ```text
//! parent                    worker
//!   │ ── Start ─────────────► │
//!   │ ◄──────────── Started ─ │
//!   │ ── <domain signal> ───► │   process(signal)        (no reply)
//!   │ ── Close ─────────────► │
//!   │ ◄───────────── Closed ─ │   exit 0
//!
//! fault path:
//!   │ ── <domain signal> ───► │   process(signal) fails ─► crash report written
//!   │ ── Close ─────────────► │   logged into the report, not processed
//!   │ ◄────────── Exception ─ │
//!   │ ── ExceptionAck ──────► │   exit 1
//!   │  read + delete report, Err(WorkerFaulted)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                    |
//! |-------------------|---------------------------------------------------------------|---------------------------------------|
//! | **Supervision**   | Start, signal and close one worker process.                   | [`Runtime`], [`Supervisor`]           |
//! | **Tasks**         | Work run inside the worker, rebuilt there by kind.            | [`Task`], [`TaskFn`], [`Catalog`]     |
//! | **Signals**       | Reserved control signals and validated domain signals.        | [`Signal`], [`Control`], [`SignalSet`]|
//! | **Crash reports** | Fault capture file written by the worker.                     | [`CrashReport`]                       |
//! | **Cleanup**       | Kill leaked workers at program end or on termination signals. | [`ShutdownGuard`], [`Reaper`]         |
//! | **Subscriber API**| Hook into worker lifecycle events.                            | [`Subscribe`], [`Event`]              |
//! | **Errors**        | Typed errors for the protocol and for task execution.         | [`RuntimeError`], [`TaskError`]       |
//! | **Configuration** | Worker program, crash directory, bus and kill settings.       | [`Config`]                            |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```no_run
//! use std::process::ExitCode;
//! use std::sync::Arc;
//! use procvisor::{Catalog, Config, Runtime, SignalSet, Subscribe, TaskError, TaskFn, TaskRef};
//!
//! fn echo() -> TaskRef {
//!     TaskFn::arc("echo", SignalSet::new(["ping"]).unwrap(), |sig| async move {
//!         eprintln!("got {sig}");
//!         Ok::<_, TaskError>(())
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() -> ExitCode {
//!     let catalog = Catalog::new().with("echo", echo);
//!     if let Some(code) = procvisor::worker::serve_if_spawned(&catalog).await {
//!         return code;
//!     }
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(procvisor::LogWriter::new())];
//!     let runtime = Runtime::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!     let _guard = runtime.shutdown_guard();
//!
//!     let mut sup = runtime.supervisor("echo-1", echo()).unwrap();
//!     sup.start().await.unwrap();
//!     sup.send_signal("ping").await.unwrap();
//!     match sup.close().await {
//!         Ok(()) => ExitCode::SUCCESS,
//!         Err(e) => {
//!             eprintln!("{e}");
//!             ExitCode::FAILURE
//!         }
//!     }
//! }
//! ```
mod channel;
mod core;
mod crash;
mod error;
mod events;
mod signals;
mod subscribers;
mod tasks;

pub mod worker;

// ---- Public re-exports ----

pub use channel::Endpoint;
pub use crate::core::{
    wait_for_shutdown_signal, Config, Reaper, Registry, Runtime, RuntimeBuilder, ShutdownGuard,
    Supervisor, WorkerId,
};
pub use crash::CrashReport;
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use signals::{Control, DomainSignal, Signal, SignalSet};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Catalog, Task, TaskFn, TaskRef};

// Optional: expose the built-in logger subscriber.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
