//! # Phase-indexed cyclic dispatcher.
//!
//! [`Cycle`] keeps a phase in `[0, 1)` and a position in a [`KnotTable`].
//! Moving the phase fires, in order, the knot actions on the arc between the
//! old and new phase. A target above 1 winds forward through phase 0; a target
//! below 0 winds backward through phase 1.
//!
//! ## Phase arithmetic
//! ```text
//!   table:   [-1 | k1  k2 .. kn | 2]        pos = lower_bound(phase)
//!             0    1   2    n    n+1
//!
//!   forward  phase ≤ φ < 1 : fire pos..lb(φ)                     ascending
//!   forward  φ ≥ 1         : fire pos..=n, laps, 1..lb(φ - ⌊φ⌋)  ascending
//!   backward 0 ≤ φ ≤ phase : fire lb(φ)..pos                     descending
//!   backward φ < 0         : fire 1..pos, laps, lb(φ - ⌊φ⌋)..=n  descending
//! ```
//!
//! ## Rules
//! - Knot actions that fail are reported and skipped; the move completes.
//! - Non-finite targets are ignored with a warning.
//! - `period == 0` freezes free cycling; `move_to_phase` still works.
//! - With [`LapCount::Wraps`], moving by `Δ` in one call or in several calls
//!   summing to `Δ` fires the same actions and reports the same total laps.

use tracing::{debug, warn};

use crate::config::Topic;
use crate::error::{ConfigError, PlanError};
use crate::events::Event;
use crate::notices::NoticeKind;
use crate::plan::{guarded, Behavior, Cx, Frame, Plan, Resume, Step};

use super::knots::KnotTable;

/// A crossed knot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knot {
    /// 0-based index of the knot in phase order.
    pub index: usize,
    /// Phase of the knot.
    pub phase: f64,
}

/// How multi-lap moves are reported to [`CycleActions::on_cycles`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LapCount {
    /// Every crossing of phase 0 counts as a lap, and the knots of each
    /// intermediate lap fire again.
    #[default]
    Wraps,
    /// Only laps lying strictly inside the move are reported (`⌊φ⌋ - 1`
    /// forward from `φ ≥ 2`, `⌊φ⌋ + 1` backward from `φ < -1`), and
    /// intermediate laps do not fire their knots.
    Interior,
}

/// Callbacks driven by a [`Cycle`].
pub trait CycleActions: 'static {
    /// Name used in plan labels.
    fn name(&self) -> &str {
        "CyclePlan"
    }

    /// A knot was crossed.
    fn on_knot(&mut self, cx: &Cx<'_>, knot: Knot) -> Result<(), PlanError>;

    /// Complete laps crossed in one move (negative when moving backward).
    fn on_cycles(&mut self, _cx: &Cx<'_>, _laps: i64) {}

    /// Event filter for the owning plan.
    fn on_event(&mut self, _cx: &Cx<'_>, _event: &Event) -> Result<bool, PlanError> {
        Ok(true)
    }
}

/// Cyclic dispatcher behavior.
#[derive(Debug)]
pub struct Cycle<A> {
    table: KnotTable,
    phase: f64,
    pos: usize,
    period: f64,
    max_freq: f64,
    laps: LapCount,
    actions: A,
}

impl<A: CycleActions> Cycle<A> {
    /// Creates a cycle at phase 0 with period 1 s.
    pub fn new(table: KnotTable, actions: A, max_freq: f64) -> Result<Self, ConfigError> {
        if !(max_freq > 0.0 && max_freq.is_finite()) {
            return Err(ConfigError::InvalidMaxFrequency { freq: max_freq });
        }
        Ok(Self {
            table,
            phase: 0.0,
            pos: 1,
            period: 1.0,
            max_freq,
            laps: LapCount::default(),
            actions,
        })
    }

    /// Selects the lap-count convention.
    pub fn with_lap_count(mut self, laps: LapCount) -> Self {
        self.laps = laps;
        self
    }

    /// Current phase in `[0, 1)`.
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Current table position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Signed period in seconds; 0 when frozen.
    #[inline]
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Signed frequency in Hz; 0 when frozen.
    pub fn frequency(&self) -> f64 {
        if self.period == 0.0 {
            0.0
        } else {
            1.0 / self.period
        }
    }

    /// Maximal cycling frequency.
    #[inline]
    pub fn max_freq(&self) -> f64 {
        self.max_freq
    }

    /// The knot table.
    #[inline]
    pub fn table(&self) -> &KnotTable {
        &self.table
    }

    /// Replaces the knot table; the phase is kept and the position follows it.
    pub(crate) fn set_table(&mut self, table: KnotTable) {
        self.pos = table.lower_bound(self.phase);
        self.table = table;
    }

    /// The knot actions.
    #[inline]
    pub fn actions(&self) -> &A {
        &self.actions
    }

    /// Mutable knot actions.
    #[inline]
    pub fn actions_mut(&mut self) -> &mut A {
        &mut self.actions
    }

    /// Sets the signed period; 0 freezes. Magnitudes are clamped so that the
    /// frequency stays within `[1/max_freq, max_freq]`.
    pub fn set_period(&mut self, period: f64) {
        if period.is_nan() {
            warn!(target: "planvisor::cycle", "set_period(NaN) ignored");
            return;
        }
        if period == 0.0 {
            self.period = 0.0;
            return;
        }
        let (lo, hi) = self.bounds();
        self.period = period.signum() * period.abs().clamp(lo, hi);
    }

    /// Sets the signed frequency; 0 freezes. Clamped like [`Self::set_period`].
    pub fn set_frequency(&mut self, freq: f64) {
        if freq.is_nan() {
            warn!(target: "planvisor::cycle", "set_frequency(NaN) ignored");
            return;
        }
        if freq == 0.0 {
            self.period = 0.0;
            return;
        }
        let (lo, hi) = self.bounds();
        self.period = freq.signum() / freq.abs().clamp(lo, hi);
    }

    fn bounds(&self) -> (f64, f64) {
        let inv = 1.0 / self.max_freq;
        (inv.min(self.max_freq), inv.max(self.max_freq))
    }

    /// Moves to `phi`, firing every knot on the way.
    pub fn move_to_phase(&mut self, cx: &Cx<'_>, phi: f64) {
        if !phi.is_finite() {
            warn!(target: "planvisor::cycle", plan = cx.label(), phi, "non-finite phase ignored");
            return;
        }
        let end = self.table.end();
        let cyc = phi.floor();
        let laps = cyc as i64;
        if cx.debugs(Topic::Cycle) {
            debug!(target: "planvisor::cycle", plan = cx.label(), from = self.phase, to = phi, "move");
        }
        let npos;
        if phi > self.phase {
            if phi < 1.0 {
                npos = self.table.lower_bound(phi);
                self.fire(cx, self.pos..npos, false);
            } else {
                npos = self.table.lower_bound(phi - cyc);
                self.fire(cx, self.pos..end, false);
                match self.laps {
                    LapCount::Wraps => {
                        self.report_laps(cx, laps);
                        for _ in 1..laps {
                            self.fire(cx, 1..end, false);
                        }
                    }
                    LapCount::Interior => {
                        if phi >= 2.0 {
                            self.report_laps(cx, laps - 1);
                        }
                    }
                }
                self.fire(cx, 1..npos, false);
            }
        } else if phi >= 0.0 {
            npos = self.table.lower_bound(phi);
            self.fire(cx, npos..self.pos, true);
        } else {
            npos = self.table.lower_bound(phi - cyc);
            self.fire(cx, 1..self.pos, true);
            match self.laps {
                LapCount::Wraps => {
                    self.report_laps(cx, laps);
                    for _ in 1..-laps {
                        self.fire(cx, 1..end, true);
                    }
                }
                LapCount::Interior => {
                    if phi < -1.0 {
                        self.report_laps(cx, laps + 1);
                    }
                }
            }
            self.fire(cx, npos..end, true);
        }
        let (phase, npos) = match phi - cyc {
            // phi - floor(phi) rounds up to 1.0 for tiny negative phi
            p if p >= 1.0 => (0.0, self.table.lower_bound(0.0)),
            p => (p, npos),
        };
        self.phase = phase;
        self.pos = npos;
    }

    fn fire(&mut self, cx: &Cx<'_>, range: std::ops::Range<usize>, reverse: bool) {
        if range.is_empty() {
            return;
        }
        let positions: Box<dyn Iterator<Item = usize>> = if reverse {
            Box::new(range.rev())
        } else {
            Box::new(range)
        };
        for pos in positions {
            let knot = Knot {
                index: pos - 1,
                phase: self.table.at(pos),
            };
            if cx.debugs(Topic::Knot) {
                debug!(target: "planvisor::cycle", plan = cx.label(), index = knot.index, phase = knot.phase, "knot");
            }
            let res = guarded(|| self.actions.on_knot(cx, knot)).and_then(|r| r);
            if let Err(e) = res {
                cx.report(NoticeKind::ActionFailed, &e);
            }
        }
    }

    fn report_laps(&mut self, cx: &Cx<'_>, laps: i64) {
        if laps == 0 {
            return;
        }
        if cx.debugs(Topic::Cycle) {
            debug!(target: "planvisor::cycle", plan = cx.label(), laps, "on_cycles");
        }
        if let Err(e) = guarded(|| self.actions.on_cycles(cx, laps)) {
            cx.report(NoticeKind::ActionFailed, &e);
        }
    }
}

/// Free-running drive: advances the phase by elapsed time over period.
struct Drive {
    last: Option<f64>,
}

impl<A: CycleActions> Frame<Cycle<A>> for Drive {
    fn resume(&mut self, cycle: &mut Cycle<A>, cx: &Cx<'_>, input: Resume) -> Step<Cycle<A>> {
        if let Resume::Throw(e) = input {
            return Step::Fail(e);
        }
        let now = cx.now();
        let last = self.last.replace(now).unwrap_or(now);
        if cycle.period != 0.0 && now > last {
            let phi = cycle.phase + (now - last) / cycle.period;
            cycle.move_to_phase(cx, phi);
        }
        Step::Suspend
    }
}

impl<A: CycleActions> Behavior for Cycle<A> {
    fn name(&self) -> &str {
        self.actions.name()
    }

    fn entry(&mut self, _cx: &Cx<'_>) -> Box<dyn Frame<Self>> {
        Box::new(Drive { last: None })
    }

    fn on_event(&mut self, cx: &Cx<'_>, event: &Event) -> Result<bool, PlanError> {
        self.actions.on_event(cx, event)
    }
}

impl<A: CycleActions> Plan<Cycle<A>> {
    /// See [`Cycle::move_to_phase`].
    pub fn move_to_phase(&mut self, phi: f64) {
        self.scoped(|cycle, cx| cycle.move_to_phase(cx, phi));
    }

    /// See [`Cycle::set_period`].
    pub fn set_period(&mut self, period: f64) {
        self.behavior_mut().set_period(period);
    }

    /// See [`Cycle::set_frequency`].
    pub fn set_frequency(&mut self, freq: f64) {
        self.behavior_mut().set_frequency(freq);
    }

    /// Signed period in seconds.
    pub fn period(&self) -> f64 {
        self.behavior().period()
    }

    /// Signed frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.behavior().frequency()
    }

    /// Current phase.
    pub fn phase(&self) -> f64 {
        self.behavior().phase()
    }
}
