//! # Worker side of the protocol.
//!
//! Everything here runs inside the spawned process:
//! - [`serve_if_spawned`]: entry point called first thing in `main`;
//! - [`run`]: the receive/dispatch/fault-capture state machine;
//! - [`WorkerEnv`]: the minimal identity the parent passes through the environment.
//!
//! ## State machine
//! ```text
//! AwaitingStart ──Start/Started──► Running ──Close/Closed──► Closed (exit 0)
//!                                   │  ▲
//!                        domain sig │  │ process() Ok
//!                                   ▼  │
//!                                 dispatch ──Err/panic──► write report, send Exception
//!                                                               │
//!                                                               ▼
//!                              Faulted ──ExceptionAck──► Acknowledged (exit 1)
//!                                 │ ▲
//!                                 └─┘ any other signal: appended to the report
//! ```
//! Anything else (first signal not `Start`, undeclared signal while running)
//! is a protocol violation: the worker exits with code 2.

mod entry;
mod env;
mod fault;
mod run;

pub use entry::{serve_if_spawned, EXIT_PROTOCOL_VIOLATION};
pub use env::{WorkerEnv, ENV_CRASH_REPORT, ENV_KIND, ENV_NAME};
pub use run::{run, WorkerContext, WorkerOutcome};

pub(crate) use fault::panic_message;
