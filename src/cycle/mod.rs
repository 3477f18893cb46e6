//! # Cycle plans: phase-indexed dispatch.
//!
//! A cycle maps a continuous phase in `[0, 1)` onto a sorted table of knots
//! and fires the knots crossed whenever the phase moves, either by explicit
//! jumps ([`Cycle::move_to_phase`]) or by free cycling at a signed period.
//!
//! ## Contents
//! - [`KnotTable`] sentineled breakpoint table with `O(log n)` lookup
//! - [`Cycle`], [`CycleActions`], [`Knot`], [`LapCount`] the dispatcher
//! - [`CyclePlan`] one closure per knot
//! - [`FunctionCyclePlan`] one function at every knot, with call-rate limiting
//!
//! The gait variant that replays table rows lives in [`crate::sheet`].

mod actions;
#[allow(clippy::module_inception)]
mod cycle;
mod function;
mod knots;

pub use actions::{Action, CyclePlan, KnotActions};
pub use cycle::{Cycle, CycleActions, Knot, LapCount};
pub use function::{FunctionCyclePlan, FunctionKnots, Knots};
pub use knots::KnotTable;
