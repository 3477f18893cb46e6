//! # SheetPlan: one-shot replay of a timed table.
//!
//! Each row is applied once host time reaches `t0 + row.at / rate`, where
//! `t0` and `rate` are captured when the plan starts. The plan finishes after
//! the last row.
//!
//! ```text
//!  start ─► t0 = now
//!  row 0:  Call(UntilTime(t0 + at_0/rate)) ─► apply row 0
//!  row 1:  Call(UntilTime(t0 + at_1/rate)) ─► apply row 1
//!  ...
//!  last row applied ─► Done (PlanStopped: finished)
//! ```
//!
//! Rows whose time has already passed are applied in the same turn, in order.
//! A failing setter abandons the rest of its row and is reported as
//! `ActionFailed`; replay continues with the next row.

use tracing::debug;

use crate::config::Topic;
use crate::context::Context;
use crate::error::ConfigError;
use crate::notices::NoticeKind;
use crate::plan::{Behavior, Bindings, Cx, Frame, Plan, Resolve, Resume, Runnable, Step, UntilTime};

use super::table::{Sheet, Table};

/// Behavior of a [`SheetPlan`]: a bound table and the replay rate.
#[derive(Debug)]
pub struct SheetReplay {
    table: Table,
    rate: f64,
}

impl SheetReplay {
    /// Replays `table` at rate 1.
    pub fn new(table: Table) -> Self {
        Self { table, rate: 1.0 }
    }

    /// The bound table.
    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Replay rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Behavior for SheetReplay {
    fn name(&self) -> &str {
        "SheetPlan"
    }

    fn entry(&mut self, cx: &Cx<'_>) -> Box<dyn Frame<Self>> {
        Box::new(ReplayRows {
            t0: cx.now(),
            rate: self.rate,
            next: 0,
            waiting: false,
        })
    }
}

struct ReplayRows {
    t0: f64,
    rate: f64,
    next: usize,
    waiting: bool,
}

impl Frame<SheetReplay> for ReplayRows {
    fn resume(&mut self, state: &mut SheetReplay, cx: &Cx<'_>, input: Resume) -> Step<SheetReplay> {
        if let Resume::Throw(e) = input {
            return Step::Fail(e);
        }
        if self.waiting {
            self.waiting = false;
            if let Err(e) = state.table.apply_row(cx, self.next) {
                cx.report(NoticeKind::ActionFailed, &e);
            }
            self.next += 1;
        }
        match state.table.at(self.next) {
            Some(at) => {
                let due = self.t0 + at / self.rate;
                if cx.debugs(Topic::Sheet) {
                    debug!(target: "planvisor::sheet", plan = cx.label(), row = self.next, due, "waiting for row");
                }
                self.waiting = true;
                Step::call(UntilTime::new(due))
            }
            None => Step::Done,
        }
    }
}

/// Plan replaying a [`Sheet`] once against host time.
pub type SheetPlan = Plan<SheetReplay>;

impl Plan<SheetReplay> {
    /// Builds a stopped sheet plan; every column must be bound in `bindings`.
    pub fn with_sheet(
        context: &Context,
        sheet: Sheet,
        bindings: Bindings,
    ) -> Result<Self, ConfigError> {
        let table = Table::bind(sheet, &bindings)?;
        Ok(Plan::with_bindings(context, SheetReplay::new(table), bindings))
    }

    /// Builds a stopped sheet plan binding each column `name` to the setter
    /// `resolver` returns for `"<name>/@set_pos"`.
    pub fn with_resolver(
        context: &Context,
        sheet: Sheet,
        resolver: &dyn Resolve,
    ) -> Result<Self, ConfigError> {
        let bindings = Bindings::auto(sheet.columns(), resolver)?;
        Self::with_sheet(context, sheet, bindings)
    }

    /// Replay rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.behavior().rate
    }

    /// Sets the replay rate used by the next start. Must be `> 0`.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), ConfigError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRate { rate });
        }
        self.behavior_mut().rate = rate;
        Ok(())
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
        let table = Table::bind(sheet, self.bindings())?;
        self.behavior_mut().table = table;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tokio::sync::broadcast;

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::Config;
    use crate::error::PlanError;
    use crate::events::Event;
    use crate::notices::Notice;
    use crate::plan::{NoResolve, Setter};

    type Calls = Rc<RefCell<Vec<(f64, f64)>>>;

    fn setup() -> (Rc<ManualClock>, Context, Calls) {
        let clock = Rc::new(ManualClock::new(10.0));
        let cx = Context::new(clock.clone(), Config::default());
        (clock, cx, Rc::new(RefCell::new(Vec::new())))
    }

    fn timed_setter(name: &'static str, clock: &Rc<ManualClock>, calls: &Calls) -> Setter {
        let (clock, calls) = (clock.clone(), calls.clone());
        Setter::infallible(name, move |v| calls.borrow_mut().push((clock.now(), v)))
    }

    fn bind(setters: impl IntoIterator<Item = Setter>) -> Bindings {
        setters
            .into_iter()
            .fold(Bindings::builder(), |b, s| b.setter(s))
            .build(&NoResolve)
            .expect("no specs")
    }

    fn turn(plan: &mut dyn Runnable, clock: &ManualClock, dt: f64) {
        clock.advance(dt);
        plan.push(&[Event::tick(clock.now())]);
        plan.step();
    }

    fn kinds(rx: &mut broadcast::Receiver<Notice>) -> Vec<NoticeKind> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n.kind);
        }
        out
    }

    #[test]
    fn double_rate_halves_row_times_and_runs_once() {
        let (clock, cx, calls) = setup();
        let sheet = Sheet::dense(["t", "x"], vec![vec![0.0, 1.0], vec![1.0, 0.0]]).expect("valid");
        let mut plan =
            SheetPlan::with_sheet(&cx, sheet, bind([timed_setter("x", &clock, &calls)])).expect("bound");
        plan.set_rate(2.0).expect("positive");
        plan.start();

        turn(&mut plan, &clock, 0.0);
        assert_eq!(*calls.borrow(), [(10.0, 1.0)]);
        turn(&mut plan, &clock, 0.25);
        assert_eq!(calls.borrow().len(), 1);
        assert!(plan.is_running());

        turn(&mut plan, &clock, 0.25);
        assert_eq!(*calls.borrow(), [(10.0, 1.0), (10.5, 0.0)]);
        assert!(!plan.is_running());

        plan.push(&[Event::tick(clock.now())]);
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn overdue_rows_apply_in_one_turn() {
        let (clock, cx, calls) = setup();
        let sheet = Sheet::new(
            ["t", "x"],
            vec![
                vec![Some(0.0), Some(1.0)],
                vec![Some(0.5), None],
                vec![Some(1.0), Some(3.0)],
                vec![Some(5.0), Some(4.0)],
            ],
        )
        .expect("valid");
        let mut plan =
            SheetPlan::with_sheet(&cx, sheet, bind([timed_setter("x", &clock, &calls)])).expect("bound");
        plan.start();
        turn(&mut plan, &clock, 2.0);
        assert_eq!(*calls.borrow(), [(12.0, 1.0), (12.0, 3.0)]);
        assert!(plan.is_running());
    }

    #[test]
    fn invalid_rate_is_rejected() {
        let (clock, cx, calls) = setup();
        let sheet = Sheet::dense(["t", "x"], vec![vec![0.0, 1.0]]).expect("valid");
        let mut plan =
            SheetPlan::with_sheet(&cx, sheet, bind([timed_setter("x", &clock, &calls)])).expect("bound");
        assert_eq!(plan.set_rate(0.0), Err(ConfigError::InvalidRate { rate: 0.0 }));
        assert!(plan.set_rate(f64::NAN).is_err());
        assert_eq!(plan.rate(), 1.0);
    }

    #[test]
    fn unbound_columns_fail_at_construction() {
        let (clock, cx, calls) = setup();
        let sheet = Sheet::dense(["t", "x", "y"], vec![vec![0.0, 1.0, 2.0]]).expect("valid");
        let err = SheetPlan::with_sheet(&cx, sheet, bind([timed_setter("x", &clock, &calls)]))
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err, ConfigError::UnboundColumn { name: "y".into() });
    }

    #[test]
    fn resolver_binds_by_naming_convention() {
        let (clock, cx, calls) = setup();
        let setter = timed_setter("hip", &clock, &calls);
        let resolver = move |spec: &str| (spec == "hip/@set_pos").then(|| setter.clone());
        let sheet = Sheet::dense(["t", "hip"], vec![vec![0.0, 0.5]]).expect("valid");
        let mut plan = SheetPlan::with_resolver(&cx, sheet, &resolver).expect("resolved");
        plan.start();
        turn(&mut plan, &clock, 0.0);
        assert_eq!(*calls.borrow(), [(10.0, 0.5)]);

        let sheet = Sheet::dense(["t", "knee"], vec![vec![0.0, 0.5]]).expect("valid");
        assert!(matches!(
            SheetPlan::with_resolver(&cx, sheet, &resolver),
            Err(ConfigError::Unresolved { .. })
        ));
    }

    #[test]
    fn update_is_atomic_and_refused_while_running() {
        let (clock, cx, calls) = setup();
        let first = Sheet::dense(["t", "x"], vec![vec![0.0, 1.0], vec![1.0, 2.0]]).expect("valid");
        let mut plan =
            SheetPlan::with_sheet(&cx, first.clone(), bind([timed_setter("x", &clock, &calls)]))
                .expect("bound");

        let unbound = Sheet::dense(["t", "z"], vec![vec![0.0, 1.0]]).expect("valid");
        assert!(matches!(plan.update(unbound), Err(ConfigError::UnboundColumn { .. })));
        assert_eq!(plan.behavior().table().sheet(), &first);

        plan.start();
        let other = Sheet::dense(["t", "x"], vec![vec![0.0, 9.0]]).expect("valid");
        assert!(matches!(plan.update(other.clone()), Err(ConfigError::Running { .. })));
        assert_eq!(plan.behavior().table().sheet(), &first);

        plan.stop(false);
        plan.update(other.clone()).expect("stopped");
        assert_eq!(plan.behavior().table().sheet(), &other);
    }

    #[test]
    fn failing_setter_is_reported_and_replay_continues() {
        let (clock, cx, calls) = setup();
        let mut rx = cx.bus().subscribe();
        let bindings = bind([
            Setter::new("jam", |v| {
                if v > 0.0 {
                    Err(PlanError::fail("jammed"))
                } else {
                    Ok(())
                }
            }),
            timed_setter("x", &clock, &calls),
        ]);
        let sheet = Sheet::dense(
            ["t", "jam", "x"],
            vec![vec![0.0, 1.0, 1.0], vec![1.0, 0.0, 2.0]],
        )
        .expect("valid");
        let mut plan = SheetPlan::with_sheet(&cx, sheet, bindings).expect("bound");
        plan.start();
        turn(&mut plan, &clock, 1.0);
        assert_eq!(*calls.borrow(), [(11.0, 2.0)]);
        assert!(!plan.is_running());
        let seen = kinds(&mut rx);
        assert!(seen.contains(&NoticeKind::ActionFailed));
        assert_eq!(seen.last(), Some(&NoticeKind::PlanStopped));
    }
}
