//! # GaitCyclePlan: a sheet looped by cycle phase.
//!
//! The time column holds phases in `[0, 1]`; each row becomes a knot of a
//! [`Cycle`], and crossing a knot applies that row. The plan never finishes
//! on its own.
//!
//! `update` swaps knots and rows together, and only while stopped.

use std::fmt;

use crate::context::Context;
use crate::error::{ConfigError, PlanError};
use crate::cycle::{Cycle, CycleActions, Knot, KnotTable};
use crate::plan::{Bindings, Cx, Plan, Resolve, Runnable};

use super::table::{Sheet, Table};

/// Knot actions that apply the sheet row of the crossed knot.
pub struct SheetKnots {
    table: Table,
}

impl SheetKnots {
    /// The bound table.
    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl CycleActions for SheetKnots {
    fn name(&self) -> &str {
        "GaitCyclePlan"
    }

    fn on_knot(&mut self, cx: &Cx<'_>, knot: Knot) -> Result<(), PlanError> {
        self.table.apply_row(cx, knot.index)
    }
}

impl fmt::Debug for SheetKnots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetKnots").field("table", &self.table).finish()
    }
}

/// Cycle plan replaying a phase-indexed sheet forever.
pub type GaitCyclePlan = Plan<Cycle<SheetKnots>>;

impl Plan<Cycle<SheetKnots>> {
    /// Builds a stopped gait plan; every column must be bound in `bindings`
    /// and every row phase must lie in `[0, 1]`.
    pub fn with_sheet(
        context: &Context,
        sheet: Sheet,
        bindings: Bindings,
        max_freq: f64,
    ) -> Result<Self, ConfigError> {
        let knots = KnotTable::new(&sheet.times())?;
        let table = Table::bind(sheet, &bindings)?;
        let cycle = Cycle::new(knots, SheetKnots { table }, max_freq)?;
        Ok(Plan::with_bindings(context, cycle, bindings))
    }

    /// Like [`with_sheet`](Self::with_sheet), binding each column `name`
    /// through `resolver` as `"<name>/@set_pos"`.
    pub fn with_resolver(
        context: &Context,
        sheet: Sheet,
        resolver: &dyn Resolve,
        max_freq: f64,
    ) -> Result<Self, ConfigError> {
        let bindings = Bindings::auto(sheet.columns(), resolver)?;
        Self::with_sheet(context, sheet, bindings, max_freq)
    }

    /// Replaces the sheet, binding it through this plan's bindings.
    ///
    /// Rejected while running. On error nothing changes.
    pub fn update(&mut self, sheet: Sheet) -> Result<(), ConfigError> {
        if self.is_running() {
            return Err(ConfigError::Running {
                plan: self.label().to_string(),
            });
        }
        let knots = KnotTable::new(&sheet.times())?;
        let table = Table::bind(sheet, self.bindings())?;
        let cycle = self.behavior_mut();
        cycle.set_table(knots);
        cycle.actions_mut().table = table;
        Ok(())
    }
}
