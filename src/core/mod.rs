//! Parent-side runtime: supervisors and the process bookkeeping behind them.
//!
//! The public API from this module is [`Runtime`] (built through
//! [`RuntimeBuilder`]) and the [`Supervisor`] it hands out.
//!
//! Internal modules:
//! - [`supervisor`]: start/send/close handshakes for one worker process;
//! - [`runtime`]: shared state, bus listener, supervisor construction;
//! - [`spawn`]: builds the worker command and splits off its pipes;
//! - [`registry`]: names of active supervisors;
//! - [`reaper`]: tracks live workers and kills leftovers;
//! - [`shutdown`]: scope guard and OS termination signals.

mod builder;
mod config;
mod reaper;
mod registry;
mod runtime;
mod shutdown;
mod spawn;
mod supervisor;

pub use builder::RuntimeBuilder;
pub use config::Config;
pub use reaper::{Reaper, WorkerId};
pub use registry::Registry;
pub use runtime::Runtime;
pub use shutdown::{wait_for_shutdown_signal, ShutdownGuard};
pub use supervisor::Supervisor;
