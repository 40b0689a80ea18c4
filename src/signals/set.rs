//! # Declared domain signals of a task.

use std::borrow::Cow;
use std::collections::BTreeSet;

use super::signal::{DomainSignal, Signal};
use crate::error::RuntimeError;

/// Finite, validated set of domain signals a task accepts.
///
/// Built once when the task is defined, so a reserved-name collision fails
/// fast instead of surfacing mid-protocol.
///
/// # Example
/// ```
/// use procvisor::SignalSet;
///
/// let set = SignalSet::new(["ping", "flush"]).unwrap();
/// assert!(set.contains("ping"));
/// assert!(SignalSet::new(["Close"]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet {
    signals: BTreeSet<DomainSignal>,
}

impl SignalSet {
    /// Validates every name and builds the set. Duplicates collapse.
    pub fn new<I, S>(names: I) -> Result<Self, RuntimeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        let signals = names
            .into_iter()
            .map(DomainSignal::new)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { signals })
    }

    /// An empty set (task accepts only lifecycle signals).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the declared signal with this name, if any.
    pub fn get(&self, name: &str) -> Option<&DomainSignal> {
        self.signals.iter().find(|s| s.as_str() == name)
    }

    /// True if `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True if the wire signal is one of the declared domain signals.
    pub fn accepts(&self, signal: &Signal) -> bool {
        match signal {
            Signal::Domain(d) => self.signals.contains(d),
            Signal::Control(_) => false,
        }
    }

    /// Iterates in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &DomainSignal> {
        self.signals.iter()
    }

    /// Number of declared signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// True if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Control;

    #[test]
    fn collision_fails_at_definition() {
        let err = SignalSet::new(["ping", "ExceptionAck"]).unwrap_err();
        assert!(matches!(err, RuntimeError::ReservedSignal { signal } if signal == "ExceptionAck"));
    }

    #[test]
    fn accepts_only_declared_domain_signals() {
        let set = SignalSet::new(["ping", "ping", "flush"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.accepts(&Signal::parse("flush").unwrap()));
        assert!(!set.accepts(&Signal::parse("nope").unwrap()));
        assert!(!set.accepts(&Signal::Control(Control::Start)));
        let names: Vec<&str> = set.iter().map(DomainSignal::as_str).collect();
        assert_eq!(names, vec!["flush", "ping"]);
    }
}
