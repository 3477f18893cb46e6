//! # Plan lifecycle tracker with sequence-based ordering.
//!
//! Maintains the record of which plans are currently running, using notice
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! Plans ──► Bus ──► subscriber_listener() ──► SubscriberSet ──► AliveTracker::update()
//!                                                                     │
//!                                                                     ▼
//!                                                      HashMap<String, PlanState>
//!                                                        (label → {seq, alive})
//! ```
//!
//! ## Rules
//! - Only `PlanStarted` / `PlanStopped` / `PlanFailed` change alive state
//! - Other notices carrying a plan label **update seq** only
//! - Notices with `seq <= last_seq` are **rejected** (stale)
//! - Reads (`snapshot`, `is_alive`) are **eventually consistent**

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::notices::{Notice, NoticeKind};

use super::Subscribe;

#[derive(Debug, Clone)]
struct PlanState {
    last_seq: u64,
    alive: bool,
}

/// Thread-safe tracker of running plans, keyed by plan label.
///
/// The [`Runner`](crate::Runner) installs one and checks its
/// [`snapshot`](Self::snapshot) after shutdown to find plans the host never
/// adopted.
#[derive(Debug, Default)]
pub struct AliveTracker {
    state: RwLock<HashMap<String, PlanState>>,
}

impl AliveTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `notice` if it is newer than the last one seen for its plan.
    ///
    /// ```text
    /// update(PlanStopped, seq=100)  → alive=false, last_seq=100
    /// update(PlanStarted, seq=99)   → rejected (stale)
    /// ```
    ///
    /// Returns true if the alive state was set.
    pub async fn update(&self, notice: &Notice) -> bool {
        let Some(label) = notice.plan.as_deref() else {
            return false;
        };
        if notice.plan_id.is_none() {
            // subscriber notices reuse the label slot
            return false;
        }

        let mut state = self.state.write().await;
        let entry = state.entry(label.to_string()).or_insert(PlanState {
            last_seq: 0,
            alive: false,
        });
        if notice.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = notice.seq;
        match notice.kind {
            NoticeKind::PlanStarted => {
                entry.alive = true;
                true
            }
            NoticeKind::PlanStopped | NoticeKind::PlanFailed => {
                entry.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Sorted labels of plans currently running.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, ps)| ps.alive)
            .map(|(label, _)| label.clone())
            .collect();
        alive.sort_unstable();
        alive
    }

    /// True if the plan with `label` is running.
    pub async fn is_alive(&self, label: &str) -> bool {
        self.state
            .read()
            .await
            .get(label)
            .is_some_and(|ps| ps.alive)
    }
}

#[async_trait]
impl Subscribe for AliveTracker {
    async fn on_notice(&self, notice: &Notice) {
        self.update(notice).await;
    }

    fn name(&self) -> &'static str {
        "AliveTracker"
    }
}
