//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for plugging handlers into the runtime's
//! lifecycle events; [`SubscriberSet`] fans each event out to every subscriber
//! through its own bounded queue.
//!
//! ## Architecture
//! ```text
//! Supervisor ── publish(Event) ──► Bus ──► runtime listener ──► SubscriberSet::emit
//!                                                                  ┌─────┴─────┐
//!                                                                  ▼           ▼
//!                                                              LogWriter    Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
