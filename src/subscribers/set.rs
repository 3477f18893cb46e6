//! # Per-subscriber queues and workers.
//!
//! The runner's listener hands every bus notice to [`SubscriberSet::deliver`],
//! which never waits on a subscriber:
//!
//! ```text
//! deliver(notice)
//!     ├──► [queue 1] ──► drain ──► sub1.on_notice()   (panic → SubscriberPanicked)
//!     └──► [queue N] ──► drain ──► subN.on_notice()
//! ```
//!
//! ## Rules
//! - Each subscriber sees notices in bus order; subscribers are not ordered
//!   against each other.
//! - A full or closed queue loses the notice for that subscriber only and
//!   publishes `SubscriberOverflow` (never for an overflow notice itself).
//! - [`SubscriberSet::close`] lets every worker finish its queue.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::error::PlanError;
use crate::notices::{Bus, Notice, NoticeKind};

use super::Subscribe;

/// Queues and worker tasks of the runner's subscribers.
pub(crate) struct SubscriberSet {
    queues: Vec<(&'static str, mpsc::Sender<Arc<Notice>>)>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber; needs a tokio runtime.
    pub(crate) fn spawn(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut queues = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());
        for sub in subs {
            let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
            queues.push((sub.name(), tx));
            workers.push(tokio::spawn(drain(sub, rx, bus.clone())));
        }
        Self {
            queues,
            workers,
            bus,
        }
    }

    /// Queues `notice` for every subscriber without waiting.
    pub(crate) fn deliver(&self, notice: Notice) {
        let overflow = notice.kind == NoticeKind::SubscriberOverflow;
        let notice = Arc::new(notice);
        for (name, tx) in &self.queues {
            let reason = match tx.try_send(Arc::clone(&notice)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !overflow {
                self.bus.publish(Notice::subscriber_overflow(*name, reason));
            }
        }
    }

    /// Closes the queues and waits until every worker has drained its own.
    pub(crate) async fn close(self) {
        drop(self.queues);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Notice>>, bus: Bus) {
    while let Some(notice) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(sub.on_notice(&notice))
            .catch_unwind()
            .await;
        if let Err(payload) = handled {
            let info = PlanError::from_panic(payload).as_message();
            warn!(target: "planvisor::subscribers", subscriber = sub.name(), %info, "subscriber panicked");
            bus.publish(Notice::subscriber_panicked(sub.name(), info));
        }
    }
}
