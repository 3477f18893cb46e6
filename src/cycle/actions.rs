//! Knot actions as closures: the general [`CyclePlan`].

use std::fmt;

use crate::context::Context;
use crate::error::{ConfigError, PlanError};
use crate::plan::{Cx, Plan};

use super::cycle::{Cycle, CycleActions, Knot};
use super::knots::KnotTable;

/// Callback fired when its knot is crossed.
pub type Action = Box<dyn FnMut(&Cx<'_>, Knot) -> Result<(), PlanError>>;

type LapFn = Box<dyn FnMut(&Cx<'_>, i64)>;

/// One closure per knot, plus an optional lap callback.
pub struct KnotActions {
    actions: Vec<Action>,
    on_cycles: Option<LapFn>,
}

impl KnotActions {
    /// Registers a lap callback, replacing any previous one.
    pub fn set_lap_callback(&mut self, f: impl FnMut(&Cx<'_>, i64) + 'static) {
        self.on_cycles = Some(Box::new(f));
    }
}

impl CycleActions for KnotActions {
    fn on_knot(&mut self, cx: &Cx<'_>, knot: Knot) -> Result<(), PlanError> {
        match self.actions.get_mut(knot.index) {
            Some(action) => action(cx, knot),
            None => Ok(()),
        }
    }

    fn on_cycles(&mut self, cx: &Cx<'_>, laps: i64) {
        if let Some(f) = self.on_cycles.as_mut() {
            f(cx, laps);
        }
    }
}

impl fmt::Debug for KnotActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnotActions")
            .field("knots", &self.actions.len())
            .field("on_cycles", &self.on_cycles.is_some())
            .finish()
    }
}

/// Cycle plan whose knots each carry their own closure.
pub type CyclePlan = Plan<Cycle<KnotActions>>;

impl Cycle<KnotActions> {
    /// Builds a cycle from `(phase, action)` pairs in any order.
    pub fn from_actions(knots: Vec<(f64, Action)>, max_freq: f64) -> Result<Self, ConfigError> {
        let (table, actions) = KnotTable::sorted(knots)?;
        Cycle::new(
            table,
            KnotActions {
                actions,
                on_cycles: None,
            },
            max_freq,
        )
    }
}

impl Plan<Cycle<KnotActions>> {
    /// Builds a stopped cycle plan from `(phase, action)` pairs.
    pub fn with_actions(
        context: &Context,
        knots: Vec<(f64, Action)>,
        max_freq: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Plan::new(context, Cycle::from_actions(knots, max_freq)?))
    }
}
