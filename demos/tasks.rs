//! Tasks known to the demo binary.
//!
//! Shared with the integration tests, which spawn the demo binary as their
//! worker program: every kind used there must be registered here.

use procvisor::{Catalog, DomainSignal, SignalSet, TaskError, TaskFn, TaskRef};

/// Accepts `ping` and does nothing with it.
pub fn echo() -> TaskRef {
    TaskFn::arc("echo", signals(&["ping"]), |sig| async move {
        tracing::info!(signal = %sig, "echo");
        Ok::<_, TaskError>(())
    })
}

/// Fails with "kaboom" on `detonate`; `ping` is harmless.
pub fn boom() -> TaskRef {
    TaskFn::arc("boom", signals(&["ping", "detonate"]), |sig| async move {
        match sig.as_str() {
            "detonate" => Err(TaskError::fail("kaboom")),
            _ => Ok(()),
        }
    })
}

/// Panics on `explode`.
pub fn panicky() -> TaskRef {
    TaskFn::arc("panicky", signals(&["explode"]), explode)
}

async fn explode(sig: DomainSignal) -> Result<(), TaskError> {
    panic!("kaboom from a panic on {sig}")
}

pub fn catalog() -> Catalog {
    Catalog::new()
        .with("echo", echo)
        .with("boom", boom)
        .with("panicky", panicky)
}

fn signals(names: &[&'static str]) -> SignalSet {
    match SignalSet::new(names.iter().copied()) {
        Ok(set) => set,
        Err(e) => unreachable!("demo signal names are valid: {e}"),
    }
}
