//! # Signal vocabulary.
//!
//! The protocol carries only small enumerated control messages:
//! - [`Control`] - the reserved lifecycle signals (`Start`, `Started`, `Close`, ...);
//! - [`DomainSignal`] - a validated, task-declared signal name;
//! - [`Signal`] - either of the two, as seen on the wire;
//! - [`SignalSet`] - the finite set of domain signals a task accepts.
//!
//! ## Rules
//! - A domain signal never equals a reserved name (checked when the set is built).
//! - On the wire, a signal is one line of text: its name.

mod set;
mod signal;

pub use set::SignalSet;
pub use signal::{Control, DomainSignal, Signal};
