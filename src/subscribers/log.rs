//! # LogWriter: notices rendered through `tracing`.
//!
//! A minimal subscriber that turns each [`Notice`] into one log line under
//! the `planvisor::notice` target. Faults log at `warn`, lifecycle at `info`.
//!
//! ## Example output
//! ```text
//! INFO  planvisor::notice: [started] plan="SheetPlan#3"
//! WARN  planvisor::notice: [action-failed] plan="GaitCyclePlan#4" reason="setter `x` failed: .."
//! INFO  planvisor::notice: [stopped] plan="SheetPlan#3" cause="finished"
//! INFO  planvisor::notice: [shutdown-requested] reason="signal SIGTERM"
//! INFO  planvisor::notice: [all-stopped]
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::notices::{Notice, NoticeKind};
use crate::subscribers::Subscribe;

/// Notice writer subscriber.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_notice(&self, n: &Notice) {
        let plan = n.plan.as_deref().unwrap_or("-");
        let reason = n.reason.as_deref().unwrap_or("-");
        match n.kind {
            NoticeKind::PlanStarted => {
                info!(target: "planvisor::notice", seq = n.seq, "[started] plan={plan:?}");
            }
            NoticeKind::PlanStopped => {
                let cause = n.cause.map_or("-", |c| c.as_label());
                info!(target: "planvisor::notice", seq = n.seq, "[stopped] plan={plan:?} cause={cause:?}");
            }
            NoticeKind::StartIgnored => {
                info!(target: "planvisor::notice", seq = n.seq, "[start-ignored] plan={plan:?}");
            }
            NoticeKind::PlanFailed => {
                warn!(target: "planvisor::notice", seq = n.seq, "[failed] plan={plan:?} reason={reason:?}");
            }
            NoticeKind::FrameFailed => {
                warn!(target: "planvisor::notice", seq = n.seq, "[frame-failed] plan={plan:?} reason={reason:?}");
            }
            NoticeKind::HandlerFailed => {
                warn!(target: "planvisor::notice", seq = n.seq, "[handler-failed] plan={plan:?} reason={reason:?}");
            }
            NoticeKind::ActionFailed => {
                warn!(target: "planvisor::notice", seq = n.seq, "[action-failed] plan={plan:?} reason={reason:?}");
            }
            NoticeKind::ShutdownRequested => {
                info!(target: "planvisor::notice", seq = n.seq, "[shutdown-requested] reason={reason:?}");
            }
            NoticeKind::AllStopped => {
                info!(target: "planvisor::notice", seq = n.seq, "[all-stopped]");
            }
            NoticeKind::SubscriberPanicked => {
                warn!(target: "planvisor::notice", seq = n.seq, "[subscriber-panicked] subscriber={plan} info={reason}");
            }
            NoticeKind::SubscriberOverflow => {
                warn!(target: "planvisor::notice", seq = n.seq, "[subscriber-overflow] subscriber={plan} reason={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
