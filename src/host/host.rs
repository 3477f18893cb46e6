//! # Host: owner of every started plan.
//!
//! [`Host`] is the synchronous half of the runtime. Each call to
//! [`Host::turn`] is one scheduling turn:
//!
//! ```text
//! turn(events)
//!   ├─► adopt     plans registered by start() or Context::launch
//!   ├─► push      events into every running plan
//!   ├─► step      every plan still running
//!   ├─► retain    running plans only
//!   └─► adopt     plans launched during this turn (first stepped next turn)
//! ```
//!
//! ## Rules
//! - All events of a turn reach every plan before any plan steps.
//! - A plan stopped by another plan during the turn is not stepped.
//! - Sub-plans are held and stepped like any other plan, once per turn; the
//!   parent only waits on them.
//! - A plan that is borrowed elsewhere is skipped for the turn.

use std::fmt;

use tracing::{debug, warn};

use crate::config::Topic;
use crate::context::{same_plan, Context};
use crate::events::Event;
use crate::plan::PlanRef;

/// Owner and driver of every started plan.
pub struct Host {
    context: Context,
    plans: Vec<PlanRef>,
}

impl Host {
    /// Creates a host with no plans.
    pub fn new(context: Context) -> Self {
        Self {
            context,
            plans: Vec::new(),
        }
    }

    /// The context shared with every plan.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Starts `plan` and adopts it.
    pub fn launch(&mut self, plan: PlanRef) {
        self.context.launch(plan);
        self.adopt();
    }

    /// Number of adopted plans (running or finished since the last turn).
    #[inline]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// True if no plan is adopted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// The adopted plans.
    pub fn plans(&self) -> &[PlanRef] {
        &self.plans
    }

    /// True when no adopted plan is running and no launch is pending.
    pub fn is_idle(&self) -> bool {
        self.context.pending_launches() == 0
            && self
                .plans
                .iter()
                .all(|p| p.try_borrow().is_ok_and(|p| !p.is_running()))
    }

    /// Runs one scheduling turn with `events`.
    pub fn turn(&mut self, events: &[Event]) {
        self.adopt();

        for plan in &self.plans {
            match plan.try_borrow_mut() {
                Ok(mut p) if p.is_running() => p.push(events),
                Ok(_) => {}
                Err(_) => warn!(target: "planvisor::host", "plan busy; events not delivered"),
            }
        }
        for plan in &self.plans {
            if let Ok(mut p) = plan.try_borrow_mut() {
                if p.is_running() {
                    p.step();
                }
            }
        }

        let before = self.plans.len();
        self.plans
            .retain(|p| p.try_borrow().map_or(true, |p| p.is_running()));
        let finished = before - self.plans.len();
        let adopted = self.adopt();

        if self.context.debugs(Topic::Host) {
            debug!(
                target: "planvisor::host",
                events = events.len(),
                running = self.plans.len(),
                finished,
                adopted,
                "turn"
            );
        }
    }

    /// Runs a turn whose only event is a `Tick` stamped with the current time.
    pub fn tick(&mut self) {
        let now = self.context.now();
        self.turn(&[Event::tick(now)]);
    }

    /// Stops every plan (adopting pending launches first) and forgets them.
    ///
    /// Returns the number of plans that were running.
    pub fn shutdown(&mut self, force: bool) -> usize {
        self.adopt();
        let mut stopped = 0;
        for plan in self.plans.drain(..) {
            match plan.try_borrow_mut() {
                Ok(mut p) if p.is_running() => {
                    p.stop(force);
                    stopped += 1;
                }
                Ok(_) => {}
                Err(_) => warn!(target: "planvisor::host", "plan busy during shutdown"),
            }
        }
        debug!(target: "planvisor::host", stopped, force, "host shut down");
        stopped
    }

    /// Moves registered plans into the host, skipping ones already held.
    fn adopt(&mut self) -> usize {
        let mut adopted = 0;
        for plan in self.context.take_launched() {
            if !self.plans.iter().any(|q| same_plan(q, &plan)) {
                self.plans.push(plan);
                adopted += 1;
            }
        }
        adopted
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("context", &self.context)
            .field("plans", &self.plans.len())
            .finish()
    }
}
