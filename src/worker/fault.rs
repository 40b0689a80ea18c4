//! Fault capture: turns task errors and panics into crash report content.

use std::any::Any;
use std::backtrace::Backtrace;
use std::sync::Mutex;

use crate::crash::Fault;
use crate::error::TaskError;

/// Location and backtrace of the most recent panic, filled by the worker's panic hook.
static LAST_PANIC: Mutex<Option<String>> = Mutex::new(None);

/// Chains a hook that records where the panic happened, with a backtrace.
///
/// The previous hook still runs, so the usual panic message reaches stderr.
pub(super) fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let captured = format!(
            "panicked at {location}\n\nbacktrace:\n{}",
            Backtrace::force_capture()
        );
        if let Ok(mut slot) = LAST_PANIC.lock() {
            *slot = Some(captured);
        }
        previous(info);
    }));
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Fault for a returned error: where it was built, then its cause chain.
pub(super) fn from_error(err: &TaskError) -> Fault {
    let mut detail = format!("label: {}\nraised at {}\n", err.as_label(), err.location());
    let mut cause = std::error::Error::source(err);
    while let Some(c) = cause {
        detail.push_str(&format!("caused by: {c}\n"));
        cause = c.source();
    }
    detail.push_str(&format!("\n{err:#?}"));
    Fault {
        summary: err.to_string(),
        detail,
    }
}

pub(super) fn from_panic(payload: &(dyn Any + Send)) -> Fault {
    let message = panic_message(payload);
    let site = LAST_PANIC
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or_else(|| "panic site not captured".to_string());
    Fault {
        summary: format!("task panicked: {message}"),
        detail: site,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_messages() {
        let s: Box<dyn Any + Send> = Box::new("static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(s.as_ref()), "static");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn error_fault_keeps_message() {
        let fault = from_error(&TaskError::fail("kaboom"));
        assert_eq!(fault.summary, "execution failed: kaboom");
        assert!(fault.detail.contains("task_failed"));
        assert!(fault.detail.contains("kaboom"));
        assert!(fault.detail.contains(&format!("raised at {}:", file!())), "{}", fault.detail);
    }

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct Reset(#[source] std::io::Error);

    #[test]
    fn error_fault_walks_the_cause_chain() {
        let err = TaskError::caused_by("upload failed", Reset(std::io::Error::other("peer gone")));
        let fault = from_error(&err);
        let reset = fault.detail.find("caused by: connection reset\n").unwrap();
        let gone = fault.detail.find("caused by: peer gone\n").unwrap();
        assert!(reset < gone, "{}", fault.detail);
    }
}
