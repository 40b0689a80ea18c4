//! # Control and domain signals.
//!
//! [`Control`] enumerates the reserved protocol vocabulary. `Kill`/`Killed` are
//! reserved but not driven by the base protocol: the shutdown sweep kills
//! workers at the OS level instead.

use std::borrow::Cow;
use std::fmt;

use crate::error::RuntimeError;

/// Reserved lifecycle signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Supervisor → worker: begin the lifecycle.
    Start,
    /// Worker → supervisor: reply to `Start`.
    Started,
    /// Supervisor → worker: finish cleanly.
    Close,
    /// Worker → supervisor: reply to `Close`.
    Closed,
    /// Reserved extension point.
    Kill,
    /// Reserved extension point.
    Killed,
    /// Worker → supervisor: a task fault was captured in the crash report.
    Exception,
    /// Supervisor → worker: the fault was seen, the worker may exit.
    ExceptionAck,
}

impl Control {
    /// Every reserved signal, in declaration order.
    pub const ALL: [Control; 8] = [
        Control::Start,
        Control::Started,
        Control::Close,
        Control::Closed,
        Control::Kill,
        Control::Killed,
        Control::Exception,
        Control::ExceptionAck,
    ];

    /// Wire name of the signal.
    pub fn as_str(self) -> &'static str {
        match self {
            Control::Start => "Start",
            Control::Started => "Started",
            Control::Close => "Close",
            Control::Closed => "Closed",
            Control::Kill => "Kill",
            Control::Killed => "Killed",
            Control::Exception => "Exception",
            Control::ExceptionAck => "ExceptionAck",
        }
    }

    /// Looks up a reserved signal by its wire name.
    pub fn from_name(name: &str) -> Option<Control> {
        Control::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task-declared signal name, guaranteed not to collide with [`Control`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainSignal(Cow<'static, str>);

impl DomainSignal {
    /// Validates and wraps a domain signal name.
    ///
    /// Fails when the name is empty, contains whitespace or control
    /// characters, or equals a reserved [`Control`] name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Result<Self, RuntimeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RuntimeError::InvalidSignal {
                signal: name.into_owned(),
                reason: "empty",
            });
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RuntimeError::InvalidSignal {
                signal: name.into_owned(),
                reason: "contains whitespace or control characters",
            });
        }
        if Control::from_name(&name).is_some() {
            return Err(RuntimeError::ReservedSignal {
                signal: name.into_owned(),
            });
        }
        Ok(Self(name))
    }

    /// The signal name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One message on the duplex channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Reserved lifecycle signal.
    Control(Control),
    /// Task-declared signal.
    Domain(DomainSignal),
}

impl Signal {
    /// Parses one wire line.
    ///
    /// Reserved names become [`Signal::Control`]; anything else must pass
    /// [`DomainSignal::new`].
    pub fn parse(line: &str) -> Result<Signal, RuntimeError> {
        match Control::from_name(line) {
            Some(c) => Ok(Signal::Control(c)),
            None => DomainSignal::new(line.to_owned()).map(Signal::Domain),
        }
    }

    /// Wire text of the signal.
    pub fn as_str(&self) -> &str {
        match self {
            Signal::Control(c) => c.as_str(),
            Signal::Domain(d) => d.as_str(),
        }
    }

    /// True if this is exactly the given control signal.
    #[inline]
    pub fn is(&self, control: Control) -> bool {
        matches!(self, Signal::Control(c) if *c == control)
    }
}

impl From<Control> for Signal {
    fn from(c: Control) -> Self {
        Signal::Control(c)
    }
}

impl From<DomainSignal> for Signal {
    fn from(d: DomainSignal) -> Self {
        Signal::Domain(d)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_names_round_trip() {
        for c in Control::ALL {
            assert_eq!(Control::from_name(c.as_str()), Some(c));
        }
        assert_eq!(Control::from_name("start"), None);
    }

    #[test]
    fn reserved_names_are_rejected_as_domain() {
        for c in Control::ALL {
            let err = DomainSignal::new(c.as_str()).unwrap_err();
            assert_eq!(err.as_label(), "runtime_reserved_signal");
        }
    }

    #[test]
    fn malformed_domain_signals_are_rejected() {
        assert!(DomainSignal::new("").is_err());
        assert!(DomainSignal::new("two words").is_err());
        assert!(DomainSignal::new("line\nbreak").is_err());
        assert!(DomainSignal::new("ping").is_ok());
    }

    #[test]
    fn parse_distinguishes_control_from_domain() {
        assert_eq!(Signal::parse("Close").unwrap(), Signal::Control(Control::Close));
        let ping = Signal::parse("ping").unwrap();
        assert!(matches!(&ping, Signal::Domain(d) if d.as_str() == "ping"));
        assert!(!ping.is(Control::Close));
        assert_eq!(ping.to_string(), "ping");
    }
}
