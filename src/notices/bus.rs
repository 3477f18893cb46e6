//! # Notice bus for broadcasting lifecycle notices.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from plans and the host.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Receivers:
//!   Plan 1 ──┐
//!   Plan 2 ──┼──────► Bus ───────► Runner listener ────► SubscriberSet
//!   Host   ──┘  (broadcast chan)  └► any Bus::subscribe() receiver
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and needs no runtime.
//! - **Bounded capacity**: a single ring buffer stores recent notices for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: notices are lost if there are no receivers at send time.

use tokio::sync::broadcast;

use super::notice::Notice;

/// Broadcast channel for lifecycle notices.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Notice>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Notice>(capacity);
        Self { tx }
    }

    /// Publishes a notice to all active receivers.
    ///
    /// If there are no receivers, the notice is dropped.
    pub fn publish(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }

    /// Creates a new receiver that will observe subsequent notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::NoticeKind;

    #[test]
    fn receivers_only_see_later_notices() {
        let bus = Bus::new(0);
        bus.publish(Notice::new(NoticeKind::AllStopped));
        let mut rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);
        bus.publish(Notice::new(NoticeKind::ShutdownRequested).with_reason("signal"));

        let got = rx.try_recv().expect("one notice");
        assert_eq!(got.kind, NoticeKind::ShutdownRequested);
        assert_eq!(got.reason.as_deref(), Some("signal"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn lagging_receiver_skips_oldest() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(Notice::new(NoticeKind::AllStopped));
        }
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert!(rx.try_recv().is_ok());
    }
}
