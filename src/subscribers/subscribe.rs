//! # Core subscriber trait
//!
//! Each subscriber is driven by a dedicated worker task fed by a bounded queue
//! owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block supervisors or other subscribers.
//! - If a subscriber's queue overflows, events for that subscriber are **dropped**
//!   and a `SubscriberOverflow` event is published.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use procvisor::{Event, EventKind, Subscribe};
///
/// struct FaultCounter;
///
/// #[async_trait]
/// impl Subscribe for FaultCounter {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::WorkerFaulted {
///             // bump a counter...
///         }
///     }
///
///     fn name(&self) -> &'static str { "fault-counter" }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}
