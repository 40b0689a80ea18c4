//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! ## Guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and reported as `SubscriberPanicked`.
//! - Health events are never delivered to the subscriber they are about, and a
//!   panic while handling a health event is only logged: one fault yields a
//!   bounded number of health events.
//!
//! ## Non-guarantees
//! - No ordering across different subscribers.
//! - No retries on overflow (the event is dropped for that subscriber).

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = crate::worker::panic_message(panic_err.as_ref());
                        // A panic on a health event is not re-published: it would
                        // come back as another health event.
                        if ev.is_subscriber_health() {
                            tracing::error!(subscriber = sub.name(), %info, "subscriber panicked on a health event");
                        } else {
                            bus_for_worker.publish(Event::subscriber_panicked(sub.name(), info));
                        }
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all subscribers without waiting for them.
    ///
    /// On a full or closed queue the event is dropped for that subscriber and a
    /// `SubscriberOverflow` is published, unless the event is itself a
    /// subscriber-health event. Health events skip the subscriber they name.
    pub fn emit(&self, event: &Event) {
        let event = Arc::new(event.clone());
        let health = event.is_subscriber_health();

        for channel in &self.channels {
            if health && event.task.as_deref() == Some(channel.name) {
                continue;
            }
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !health {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes all queues and awaits the workers.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.0.lock().await.push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            panic!("subscriber blew up");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_isolates_panics() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let subs: Vec<Arc<dyn Subscribe>> = vec![rec.clone(), Arc::new(Panicker)];
        let set = SubscriberSet::new(subs, bus.clone());
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::WorkerSpawned));
        set.emit(&Event::new(EventKind::WorkerStarted));

        let health = rx.recv().await.unwrap();
        assert_eq!(health.kind, EventKind::SubscriberPanicked);
        assert_eq!(health.task.as_deref(), Some("panicker"));

        set.shutdown().await;
        assert_eq!(
            *rec.0.lock().await,
            vec![EventKind::WorkerSpawned, EventKind::WorkerStarted]
        );
    }

    struct Faulty {
        name: &'static str,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl Faulty {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: std::sync::atomic::AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Subscribe for Faulty {
        async fn on_event(&self, _event: &Event) {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            panic!("{} always panics", self.name);
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn panic_reports_do_not_feed_back() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let a = Faulty::new("faulty-a");
        let b = Faulty::new("faulty-b");
        let subs: Vec<Arc<dyn Subscribe>> = vec![a.clone(), b.clone()];
        let set = SubscriberSet::new(subs, bus.clone());

        set.emit(&Event::new(EventKind::ShutdownRequested));
        let mut health = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        health.sort_by(|x, y| x.task.cmp(&y.task));
        assert_eq!(health[0].task.as_deref(), Some("faulty-a"));
        assert_eq!(health[1].task.as_deref(), Some("faulty-b"));

        // Forward the health events the way the runtime listener does.
        for ev in &health {
            set.emit(ev);
        }
        set.shutdown().await;

        // Original event plus the other subscriber's panic report, nothing more.
        assert_eq!(a.calls(), 2);
        assert_eq!(b.calls(), 2);
        assert!(rx.try_recv().is_err());
    }
}
