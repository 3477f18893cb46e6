//! # Lifecycle notices emitted by plans, the host and the runner.
//!
//! The [`NoticeKind`] enum classifies notices across three categories:
//! - **Lifecycle notices**: plan start/stop and redundant starts
//! - **Fault notices**: errors caught by the engine (frames, handlers, actions)
//! - **Runtime notices**: shutdown and subscriber health
//!
//! The [`Notice`] struct carries additional metadata such as timestamps, plan
//! label, reasons and stop causes.
//!
//! ## Ordering guarantees
//! Each notice has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when notices are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use planvisor::{Notice, NoticeKind, StopCause};
//!
//! let n = Notice::new(NoticeKind::PlanStopped)
//!     .with_plan("gait#3")
//!     .with_cause(StopCause::Cancelled);
//!
//! assert_eq!(n.kind, NoticeKind::PlanStopped);
//! assert_eq!(n.plan.as_deref(), Some("gait#3"));
//! assert_eq!(n.cause, Some(StopCause::Cancelled));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for notice ordering.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of lifecycle notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    // === Plan lifecycle ===
    /// Plan installed its entry frame.
    ///
    /// Sets:
    /// - `plan`: plan label
    PlanStarted,

    /// Plan stopped running (natural end, cancellation or failure).
    ///
    /// Sets:
    /// - `plan`: plan label
    /// - `cause`: why it stopped
    PlanStopped,

    /// `start()` was called on a running plan and ignored.
    ///
    /// Sets:
    /// - `plan`: plan label
    StartIgnored,

    // === Faults ===
    /// An error escaped the bottom frame; the plan terminates.
    ///
    /// Sets:
    /// - `plan`: plan label
    /// - `reason`: error message
    PlanFailed,

    /// A frame failed and the error was thrown into the enclosing frame.
    ///
    /// Sets:
    /// - `plan`: plan label
    /// - `reason`: error message
    FrameFailed,

    /// `on_event` failed; the event is treated as not accepted.
    ///
    /// Sets:
    /// - `plan`: plan label
    /// - `reason`: error message
    HandlerFailed,

    /// A setter, knot action or cleanup hook failed; the plan keeps running.
    ///
    /// Sets:
    /// - `plan`: plan label
    /// - `reason`: error message
    ActionFailed,

    // === Runtime ===
    /// Shutdown requested (OS signal or cancellation token).
    ///
    /// Sets:
    /// - `reason`: `cancelled` or `signal <NAME>`
    ShutdownRequested,

    /// All plans were stopped at shutdown.
    AllStopped,

    /// Subscriber panicked during notice processing.
    ///
    /// Sets:
    /// - `plan`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped a notice (queue full or worker closed).
    ///
    /// Sets:
    /// - `plan`: subscriber name
    /// - `reason`: `full` or `closed`
    SubscriberOverflow,
}

/// Why a plan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopCause {
    /// The bottom frame completed.
    Finished,
    /// `stop(false)`: frames were closed.
    Cancelled,
    /// `stop(true)`: frames were discarded without cleanup.
    Forced,
    /// An error escaped the bottom frame.
    Failed,
}

impl StopCause {
    /// Short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopCause::Finished => "finished",
            StopCause::Cancelled => "cancelled",
            StopCause::Forced => "forced",
            StopCause::Failed => "failed",
        }
    }
}

/// Lifecycle notice with optional metadata.
#[derive(Clone, Debug)]
pub struct Notice {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notice classification.
    pub kind: NoticeKind,
    /// Plan (or subscriber) label, if applicable.
    pub plan: Option<Arc<str>>,
    /// Numeric plan id, if applicable.
    pub plan_id: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Stop cause for `PlanStopped`.
    pub cause: Option<StopCause>,
}

impl Notice {
    /// Creates a new notice of the given kind with current timestamp and next sequence number.
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            plan: None,
            plan_id: None,
            reason: None,
            cause: None,
        }
    }

    /// Attaches a plan label.
    #[inline]
    pub fn with_plan(mut self, plan: impl Into<Arc<str>>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    /// Attaches a plan id.
    #[inline]
    pub fn with_plan_id(mut self, id: u64) -> Self {
        self.plan_id = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a stop cause.
    #[inline]
    pub fn with_cause(mut self, cause: StopCause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Creates a subscriber overflow notice.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Notice::new(NoticeKind::SubscriberOverflow)
            .with_plan(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic notice.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Notice::new(NoticeKind::SubscriberPanicked)
            .with_plan(subscriber)
            .with_reason(info)
    }

    /// True for notices that report a caught fault.
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::PlanFailed
                | NoticeKind::FrameFailed
                | NoticeKind::HandlerFailed
                | NoticeKind::ActionFailed
                | NoticeKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Notice::new(NoticeKind::PlanStarted);
        let b = Notice::new(NoticeKind::PlanStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn fault_classification() {
        assert!(Notice::new(NoticeKind::HandlerFailed).is_fault());
        assert!(!Notice::new(NoticeKind::PlanStopped).is_fault());
        let n = Notice::subscriber_overflow("log", "full");
        assert_eq!(n.plan.as_deref(), Some("log"));
        assert_eq!(n.kind, NoticeKind::SubscriberOverflow);
    }
}
