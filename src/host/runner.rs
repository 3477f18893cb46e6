//! # Runner: async driver for a [`Host`].
//!
//! The [`Runner`] owns a host and drives it from a tokio current-thread
//! runtime. Plans are `!Send`, so the run future is awaited directly (never
//! spawned); subscribers run on their own spawned workers.
//!
//! ## Architecture
//! ```text
//!                 ┌──────────── Runner::run() ────────────┐
//!  mpsc<Event> ──►│ batch ──┐                              │
//!  interval    ──►│ tick ───┴──► Host::turn(batch + Tick)  │
//!  token       ──►│ cancelled ─┐                           │
//!  OS signal   ──►│ signal ────┴──► ShutdownRequested      │
//!                 └──────────────────────┬────────────────┘
//!                                        ▼
//!             Host::shutdown(false) → AllStopped → drain subscribers
//!
//!  Bus ──► subscriber_listener ──► SubscriberSet ──► LogWriter, AliveTracker, ...
//! ```
//!
//! ## Rules
//! - External events are buffered and delivered with the next turn, followed
//!   by a `Tick` stamped at the turn's time.
//! - Closing the input channel does not stop the runner.
//! - With `Config::exit_when_idle`, the runner returns once no plan runs.
//! - Every plan started during the run is held by the host, so shutdown
//!   stops all of them; the [`AliveTracker`] only mirrors notices.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RuntimeError;
use crate::events::Event;
use crate::notices::{Notice, NoticeKind};
use crate::subscribers::{AliveTracker, Subscribe, SubscriberSet};

use super::host::Host;
use super::shutdown::wait_for_shutdown_signal;

/// Why the turn loop ended.
enum Exit {
    Idle,
    Cancelled,
    Signal(&'static str),
}

/// Async driver owning a [`Host`] and its notice subscribers.
pub struct Runner {
    host: Host,
    subscribers: Vec<Arc<dyn Subscribe>>,
    alive: Arc<AliveTracker>,
}

impl Runner {
    /// Creates a runner; an [`AliveTracker`] is always added to `subscribers`.
    pub fn new(host: Host, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self {
            host,
            subscribers,
            alive: Arc::new(AliveTracker::new()),
        }
    }

    /// The host being driven.
    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Mutable host, for launching plans between runs.
    #[inline]
    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// Tracker of running plans fed from the notice bus.
    #[inline]
    pub fn alive(&self) -> &Arc<AliveTracker> {
        &self.alive
    }

    /// Runs turns until cancelled, signalled or (if configured) idle.
    ///
    /// Every running plan is stopped before returning.
    ///
    /// # Errors
    /// [`RuntimeError::Signal`] if OS signal handlers cannot be installed.
    pub async fn run(
        &mut self,
        mut inputs: mpsc::Receiver<Event>,
        token: CancellationToken,
    ) -> Result<(), RuntimeError> {
        let bus = self.host.context().bus().clone();
        let mut subs = self.subscribers.clone();
        subs.push(Arc::clone(&self.alive) as Arc<dyn Subscribe>);
        let set = Arc::new(SubscriberSet::spawn(subs, bus.clone()));
        let listener = tokio::spawn(subscriber_listener(bus.subscribe(), Arc::clone(&set)));

        let config = self.host.context().config().clone();
        let mut ticker = time::interval(config.turn_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let signal = wait_for_shutdown_signal();
        tokio::pin!(signal);

        let mut batch: Vec<Event> = Vec::new();
        let mut inputs_open = true;
        let outcome = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break Ok(Exit::Cancelled),
                res = &mut signal => match res {
                    Ok(name) => break Ok(Exit::Signal(name)),
                    Err(e) => break Err(RuntimeError::from(e)),
                },
                _ = ticker.tick() => {
                    batch.push(Event::tick(self.host.context().now()));
                    self.host.turn(&batch);
                    batch.clear();
                    if config.exit_when_idle && self.host.is_idle() {
                        break Ok(Exit::Idle);
                    }
                }
                ev = inputs.recv(), if inputs_open => match ev {
                    Some(ev) => batch.push(ev),
                    None => {
                        debug!(target: "planvisor::host", "input channel closed");
                        inputs_open = false;
                    }
                },
            }
        };

        match &outcome {
            Ok(Exit::Idle) => info!(target: "planvisor::host", "no plan running; runner exits"),
            Ok(Exit::Cancelled) => {
                bus.publish(Notice::new(NoticeKind::ShutdownRequested).with_reason("cancelled"));
            }
            Ok(Exit::Signal(name)) => {
                info!(target: "planvisor::host", signal = name, "shutdown requested");
                bus.publish(
                    Notice::new(NoticeKind::ShutdownRequested).with_reason(format!("signal {name}")),
                );
            }
            Err(e) => warn!(target: "planvisor::host", label = e.as_label(), "{}", e.as_message()),
        }
        let stopped = self.host.shutdown(false);
        info!(target: "planvisor::host", stopped, "all plans stopped");
        bus.publish(Notice::new(NoticeKind::AllStopped));

        let _ = listener.await;
        match Arc::try_unwrap(set) {
            Ok(set) => set.close().await,
            Err(_) => warn!(target: "planvisor::host", "subscriber set still shared; not drained"),
        }

        outcome.map(|_| ())
    }
}

/// Forwards bus notices to the subscriber set until `AllStopped`.
pub(crate) async fn subscriber_listener(
    mut rx: broadcast::Receiver<Notice>,
    set: Arc<SubscriberSet>,
) {
    loop {
        match rx.recv().await {
            Ok(notice) => {
                let last = matches!(notice.kind, NoticeKind::AllStopped);
                set.deliver(notice);
                if last {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: "planvisor::host", skipped, "subscriber listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
