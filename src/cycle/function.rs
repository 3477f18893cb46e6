//! # Function cycle: one callback at every knot.
//!
//! [`FunctionKnots`] calls a single user function with the knot phase each
//! time a knot is crossed. Knots are either `N` uniform phases `k/N` or an
//! explicit list.
//!
//! ## Rate limiting
//! With `interval > 0`, a call is skipped when less than `interval` seconds of
//! host time have passed since the last call that went through. The phase
//! still moves; only the call is dropped.
//! ```text
//!   knot crossed at t:   t < next ?  ── yes ──► skip
//!                              │
//!                              no ──► next = t + interval; f(phase)
//! ```

use std::fmt;

use crate::context::Context;
use crate::error::{ConfigError, PlanError};
use crate::plan::{Cx, Plan};

use super::cycle::{Cycle, CycleActions, Knot};
use super::knots::KnotTable;

type PhaseFn = Box<dyn FnMut(&Cx<'_>, f64) -> Result<(), PlanError>>;

/// Knot placement for a function cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Knots {
    /// `N` evenly spaced knots at `0, 1/N, .., (N-1)/N`.
    Uniform(usize),
    /// Explicit knot phases in `[0, 1]`.
    At(Vec<f64>),
}

impl Knots {
    fn phases(&self) -> Result<Vec<f64>, ConfigError> {
        match self {
            Knots::Uniform(0) => Err(ConfigError::NoKnots),
            Knots::Uniform(n) => Ok((0..*n).map(|k| k as f64 / *n as f64).collect()),
            Knots::At(v) if v.is_empty() => Err(ConfigError::NoKnots),
            Knots::At(v) => Ok(v.clone()),
        }
    }
}

/// Single-function knot actions with an optional minimal call interval.
pub struct FunctionKnots {
    func: PhaseFn,
    interval: f64,
    next: f64,
}

impl FunctionKnots {
    /// Minimal interval between calls (seconds; `<= 0` disables the gate).
    #[inline]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Changes the minimal interval between calls.
    pub fn set_interval(&mut self, interval: f64) {
        self.interval = interval;
    }
}

impl CycleActions for FunctionKnots {
    fn name(&self) -> &str {
        "FunctionCyclePlan"
    }

    fn on_knot(&mut self, cx: &Cx<'_>, knot: Knot) -> Result<(), PlanError> {
        if self.interval > 0.0 {
            let now = cx.now();
            if now < self.next {
                return Ok(());
            }
            self.next = now + self.interval;
        }
        (self.func)(cx, knot.phase)
    }
}

impl fmt::Debug for FunctionKnots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionKnots")
            .field("interval", &self.interval)
            .field("next", &self.next)
            .finish()
    }
}

/// Cycle plan calling one function at every knot.
pub type FunctionCyclePlan = Plan<Cycle<FunctionKnots>>;

impl Plan<Cycle<FunctionKnots>> {
    /// Builds a stopped function cycle plan.
    ///
    /// The rate gate opens at the current host time.
    pub fn with_function(
        context: &Context,
        func: impl FnMut(&Cx<'_>, f64) -> Result<(), PlanError> + 'static,
        knots: Knots,
        max_freq: f64,
        interval: f64,
    ) -> Result<Self, ConfigError> {
        let table = KnotTable::new(&knots.phases()?)?;
        let actions = FunctionKnots {
            func: Box::new(func),
            interval,
            next: context.now(),
        };
        Ok(Plan::new(context, Cycle::new(table, actions, max_freq)?))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::plan::Runnable;

    fn setup() -> (Rc<ManualClock>, Context, Rc<RefCell<Vec<f64>>>) {
        let clock = Rc::new(ManualClock::new(0.0));
        let cx = Context::new(clock.clone(), Config::default());
        (clock, cx, Rc::new(RefCell::new(Vec::new())))
    }

    fn recording(calls: &Rc<RefCell<Vec<f64>>>) -> impl FnMut(&Cx<'_>, f64) -> Result<(), PlanError> {
        let calls = calls.clone();
        move |_cx: &Cx<'_>, phase: f64| {
            calls.borrow_mut().push(phase);
            Ok(())
        }
    }

    #[test]
    fn uniform_knots_call_with_phase() {
        let (_clock, cx, calls) = setup();
        let mut plan =
            FunctionCyclePlan::with_function(&cx, recording(&calls), Knots::Uniform(4), 10.0, 0.0)
                .expect("valid");
        assert_eq!(plan.behavior().table().knots(), [0.0, 0.25, 0.5, 0.75]);
        plan.move_to_phase(0.6);
        assert_eq!(*calls.borrow(), [0.0, 0.25, 0.5]);
        assert_eq!(plan.label().split('#').next(), Some("FunctionCyclePlan"));
    }

    #[test]
    fn interval_gate_drops_calls_but_not_phase() {
        let (clock, cx, calls) = setup();
        let mut plan =
            FunctionCyclePlan::with_function(&cx, recording(&calls), Knots::Uniform(4), 10.0, 0.3)
                .expect("valid");
        plan.move_to_phase(0.6);
        assert_eq!(*calls.borrow(), [0.0]);
        assert_eq!(plan.phase(), 0.6);

        clock.advance(0.3);
        plan.move_to_phase(0.9);
        assert_eq!(*calls.borrow(), [0.0, 0.75]);
    }

    #[test]
    fn knot_specification_is_validated() {
        let (_clock, cx, calls) = setup();
        let build = |knots| {
            FunctionCyclePlan::with_function(&cx, recording(&calls), knots, 10.0, 0.0).map(|_| ())
        };
        assert_eq!(build(Knots::Uniform(0)), Err(ConfigError::NoKnots));
        assert_eq!(build(Knots::At(vec![])), Err(ConfigError::NoKnots));
        assert_eq!(
            build(Knots::At(vec![0.5, 1.5])),
            Err(ConfigError::PhaseOutOfRange { phase: 1.5 })
        );
        assert_eq!(build(Knots::At(vec![0.9, 0.1])), Ok(()));
    }
}
