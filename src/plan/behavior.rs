//! # Behavior trait.
//!
//! A [`Behavior`] is the state and hooks of one kind of plan. The engine
//! ([`Plan`](super::Plan)) owns the behavior, builds its entry frame on every
//! `start()`, feeds it events and runs its frames.
//!
//! ## Hooks
//! - [`Behavior::entry`] builds the bottom frame; it is not resumed until the
//!   first step.
//! - [`Behavior::on_event`] filters events; returning `Ok(false)` for every
//!   event of a turn leaves the plan idle for that turn.
//! - [`Behavior::on_start`] / [`Behavior::on_stop`] bracket each run;
//!   `on_stop` runs exactly once per run, whatever ended it.
//!
//! ## Example
//! ```rust
//! use planvisor::{Behavior, Cx, Frame, FnFrame, Resume, Step};
//!
//! struct Counter { ticks: u32 }
//!
//! impl Behavior for Counter {
//!     fn entry(&mut self, _cx: &Cx<'_>) -> Box<dyn Frame<Self>> {
//!         Box::new(FnFrame::new(|s: &mut Counter, _cx: &Cx<'_>, input: Resume| {
//!             if let Resume::Throw(e) = input {
//!                 return Step::Fail(e);
//!             }
//!             s.ticks += 1;
//!             if s.ticks < 3 { Step::Suspend } else { Step::Done }
//!         }))
//!     }
//! }
//! ```

use crate::error::PlanError;
use crate::events::Event;

use super::frame::{short_type_name, Cx, Frame};

/// State and hooks of a plan.
pub trait Behavior: Sized + 'static {
    /// Name used in labels and logs.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    /// Builds the entry frame for a new run.
    fn entry(&mut self, cx: &Cx<'_>) -> Box<dyn Frame<Self>>;

    /// Handles one event; `Ok(true)` lets the plan's frames run this turn.
    ///
    /// Errors (and panics) are logged and count as `Ok(false)`.
    fn on_event(&mut self, _cx: &Cx<'_>, _event: &Event) -> Result<bool, PlanError> {
        Ok(true)
    }

    /// Called after the entry frame is installed.
    fn on_start(&mut self, _cx: &Cx<'_>) {}

    /// Called once when a run ends.
    fn on_stop(&mut self, _cx: &Cx<'_>) {}
}
