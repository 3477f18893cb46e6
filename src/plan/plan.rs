//! # Plan: the cooperative resumption engine.
//!
//! [`Plan`] runs a [`Behavior`] as a stack of [`Frame`]s plus an event queue
//! and at most one active child plan.
//!
//! ## Architecture
//! ```text
//!  host turn:  push(events) ──► pending ──┐
//!                                         ▼
//!  step():   1. drain pending through on_event  (idle if none accepted)
//!            2. return while the active child runs
//!            3. idle → return
//!            4. resume top frame until it suspends:
//!                  Suspend  → stop
//!                  Spawn    → start child, stop
//!                  Call     → push frame, resume it
//!                  Done     → pop, resume frame below (Next)
//!                  Fail     → pop, resume frame below (Throw)
//!               stack empty → on_stop, PlanStopped
//! ```
//!
//! ## Rules
//! - `is_running() ⇔ frames non-empty`.
//! - `start()` on a running plan changes nothing (warning + `StartIgnored`).
//! - `start()` of a plan built with [`Plan::shared`] registers it with the
//!   host, so the host steps it whoever started it.
//! - A parent never steps or feeds its child; it only waits on `is_running()`.
//! - `stop()` stops the child first; `force` skips [`Frame::close`].
//! - Panics in user code are caught and handled as [`PlanError::Panicked`].
//! - A fault never escapes `step()`; it ends this plan at worst.
//! - `step()` on a plan that is not running is a contract violation and panics.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};

use crate::config::Topic;
use crate::context::{Context, PlanId};
use crate::error::PlanError;
use crate::events::Event;
use crate::notices::{Notice, NoticeKind, StopCause};

use super::behavior::Behavior;
use super::binding::Bindings;
use super::frame::{Cx, Frame, Resume, Step};

/// Shared, type-erased handle to a plan.
pub type PlanRef = Rc<RefCell<dyn Runnable>>;

/// Object-safe plan surface used by hosts and parent plans.
pub trait Runnable {
    /// Process-unique id.
    fn id(&self) -> PlanId;

    /// `name#id` label.
    fn label(&self) -> &str;

    /// True while the plan has frames.
    fn is_running(&self) -> bool;

    /// Installs the entry frame; ignored (with a warning) if running.
    fn start(&mut self);

    /// Stops the plan and its active child.
    fn stop(&mut self, force: bool);

    /// Queues events; dropped unless running.
    fn push(&mut self, events: &[Event]);

    /// Runs one scheduling turn.
    ///
    /// # Panics
    /// If the plan is not running.
    fn step(&mut self);
}

/// A behavior driven by the resumption engine.
pub struct Plan<B: Behavior> {
    id: PlanId,
    label: String,
    context: Context,
    bindings: Bindings,
    behavior: B,
    frames: Vec<Box<dyn Frame<B>>>,
    pending: VecDeque<Event>,
    child: Option<PlanRef>,
    this: Option<Weak<RefCell<dyn Runnable>>>,
}

impl<B: Behavior> Plan<B> {
    /// Creates a stopped plan without bindings.
    pub fn new(context: &Context, behavior: B) -> Self {
        Self::with_bindings(context, behavior, Bindings::default())
    }

    /// Creates a stopped plan with the given bindings.
    pub fn with_bindings(context: &Context, behavior: B, bindings: Bindings) -> Self {
        let id = PlanId::next();
        let label = format!("{}#{}", behavior.name(), id);
        Self {
            id,
            label,
            context: context.clone(),
            bindings,
            behavior,
            frames: Vec::new(),
            pending: VecDeque::new(),
            child: None,
            this: None,
        }
    }

    /// Wraps the plan for sharing; coerces to [`PlanRef`].
    ///
    /// Only a shared plan can register itself with the host on `start()`.
    pub fn shared(mut self) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|this: &Weak<RefCell<Self>>| {
            let this: Weak<RefCell<dyn Runnable>> = this.clone();
            self.this = Some(this);
            RefCell::new(self)
        })
    }

    /// The host context.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The plan's bindings.
    #[inline]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// The behavior state.
    #[inline]
    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Mutable behavior state.
    #[inline]
    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    /// Number of frames on the stack.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of queued, undispatched events.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The active child, if any.
    #[inline]
    pub fn child(&self) -> Option<&PlanRef> {
        self.child.as_ref()
    }

    /// Runs `f` with the behavior and this plan's [`Cx`].
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut B, &Cx<'_>) -> R) -> R {
        let cx = Cx::new(&self.context, &self.bindings, &self.label, self.id);
        f(&mut self.behavior, &cx)
    }
}

impl<B: Behavior> Runnable for Plan<B> {
    fn id(&self) -> PlanId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_running(&self) -> bool {
        !self.frames.is_empty()
    }

    fn start(&mut self) {
        let Self {
            id,
            label,
            context,
            bindings,
            behavior,
            frames,
            pending,
            child,
            this,
        } = self;
        let cx = Cx::new(context, bindings, label, *id);
        if !frames.is_empty() {
            warn!(target: "planvisor::plan", plan = %label, "start() ignored: already running");
            cx.publish(Notice::new(NoticeKind::StartIgnored));
            return;
        }
        pending.clear();
        *child = None;
        match guarded(|| behavior.entry(&cx)) {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                error!(target: "planvisor::plan", plan = %label, "entry frame failed: {}", e.as_message());
                cx.publish(Notice::new(NoticeKind::PlanFailed).with_reason(e.to_string()));
                return;
            }
        }
        match this.as_ref().and_then(Weak::upgrade) {
            Some(handle) => context.register(handle),
            None => debug!(target: "planvisor::plan", plan = %label, "started without a shared handle; not registered"),
        }
        cx.publish(Notice::new(NoticeKind::PlanStarted));
        if let Err(e) = guarded(|| behavior.on_start(&cx)) {
            cx.report(NoticeKind::ActionFailed, &e);
        }
    }

    fn stop(&mut self, force: bool) {
        let Self {
            id,
            label,
            context,
            bindings,
            behavior,
            frames,
            child,
            ..
        } = self;
        if frames.is_empty() {
            return;
        }
        let cx = Cx::new(context, bindings, label, *id);
        if let Some(c) = child.take() {
            match c.try_borrow_mut() {
                Ok(mut c) => c.stop(force),
                Err(_) => warn!(target: "planvisor::plan", plan = %label, "child busy during stop"),
            }
        }
        if force {
            frames.clear();
        } else {
            while let Some(mut frame) = frames.pop() {
                if let Err(e) = guarded(|| frame.close(behavior, &cx)) {
                    cx.report(NoticeKind::ActionFailed, &e);
                }
            }
        }
        conclude(
            behavior,
            &cx,
            if force {
                StopCause::Forced
            } else {
                StopCause::Cancelled
            },
        );
    }

    fn push(&mut self, events: &[Event]) {
        if self.frames.is_empty() {
            return;
        }
        self.pending.extend(events.iter().cloned());
    }

    fn step(&mut self) {
        assert!(
            !self.frames.is_empty(),
            "step() called on {} which is not running",
            self.label
        );
        let Self {
            id,
            label,
            context,
            bindings,
            behavior,
            frames,
            pending,
            child,
            ..
        } = self;
        let cx = Cx::new(context, bindings, label, *id);
        let verbose = cx.debugs(Topic::Step);
        if verbose {
            debug!(target: "planvisor::plan", plan = %label, depth = frames.len(), events = pending.len(), "begin step");
        }

        let mut idle = true;
        while let Some(ev) = pending.pop_front() {
            match guarded(|| behavior.on_event(&cx, &ev)) {
                Ok(Ok(true)) => idle = false,
                Ok(Ok(false)) => {}
                Ok(Err(e)) | Err(e) => cx.report(NoticeKind::HandlerFailed, &e),
            }
        }

        if let Some(c) = child.as_ref() {
            if c.try_borrow().map_or(true, |c| c.is_running()) {
                return;
            }
            *child = None;
        }

        if idle {
            return;
        }

        let budget = cx.config().resume_budget();
        let mut resumes = 0usize;
        let mut input = Resume::Next;
        while let Some(top) = frames.last_mut() {
            if matches!(input, Resume::Next) {
                if budget.is_some_and(|max| resumes >= max) {
                    warn!(target: "planvisor::plan", plan = %label, resumes, "resume budget exhausted; yielding turn");
                    break;
                }
                resumes += 1;
            }
            let arg = std::mem::replace(&mut input, Resume::Next);
            let outcome = guarded(|| top.resume(behavior, &cx, arg)).unwrap_or_else(Step::Fail);
            if verbose {
                debug!(target: "planvisor::plan", plan = %label, frame = top.name(), outcome = outcome.as_label(), "resumed");
            }
            match outcome {
                Step::Suspend => break,
                Step::Call(frame) => {
                    if cx.debugs(Topic::Nesting) {
                        debug!(target: "planvisor::plan", plan = %label, frame = frame.name(), "new sub-frame");
                    }
                    frames.push(frame);
                }
                Step::Spawn(plan) => {
                    let started = match plan.try_borrow_mut() {
                        Ok(mut p) if !p.is_running() => {
                            p.start();
                            Ok(p.label().to_string())
                        }
                        Ok(p) => Err(p.label().to_string()),
                        Err(_) => Err(String::from("<busy>")),
                    };
                    match started {
                        Ok(name) => {
                            if cx.debugs(Topic::Nesting) {
                                debug!(target: "planvisor::plan", plan = %label, child = %name, "new sub-plan");
                            }
                            *child = Some(plan);
                            break;
                        }
                        Err(name) => input = Resume::Throw(PlanError::ChildAlreadyRunning { plan: name }),
                    }
                }
                Step::Done => {
                    frames.pop();
                    if frames.is_empty() {
                        conclude(behavior, &cx, StopCause::Finished);
                        break;
                    }
                }
                Step::Fail(e) => {
                    frames.pop();
                    if frames.is_empty() {
                        error!(target: "planvisor::plan", plan = %label, label = e.as_label(), "unhandled: {}", e.as_message());
                        cx.publish(Notice::new(NoticeKind::PlanFailed).with_reason(e.to_string()));
                        conclude(behavior, &cx, StopCause::Failed);
                        break;
                    }
                    if verbose {
                        debug!(target: "planvisor::plan", plan = %label, "unwinding: {}", e.as_message());
                    }
                    cx.publish(Notice::new(NoticeKind::FrameFailed).with_reason(e.to_string()));
                    input = Resume::Throw(e);
                }
            }
        }
    }
}

impl<B: Behavior> fmt::Debug for Plan<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("label", &self.label)
            .field("depth", &self.frames.len())
            .field("pending", &self.pending.len())
            .field("child", &self.child.is_some())
            .finish()
    }
}

/// Runs user code, turning a panic into [`PlanError::Panicked`].
pub(crate) fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, PlanError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(PlanError::from_panic)
}

fn conclude<B: Behavior>(behavior: &mut B, cx: &Cx<'_>, cause: StopCause) {
    if let Err(e) = guarded(|| behavior.on_stop(cx)) {
        cx.report(NoticeKind::ActionFailed, &e);
    }
    cx.publish(Notice::new(NoticeKind::PlanStopped).with_cause(cause));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::Config;
    use crate::context::same_plan;
    use crate::host::Host;
    use crate::plan::{FnFrame, ForDuration};
    use tokio::sync::broadcast;

    type Log = Rc<RefCell<Vec<String>>>;
    type Factory = Box<dyn FnMut(&Log) -> Box<dyn Frame<Scripted>>>;

    struct Scripted {
        tag: &'static str,
        log: Log,
        accept: bool,
        entry: Factory,
    }

    impl Behavior for Scripted {
        fn name(&self) -> &str {
            self.tag
        }

        fn entry(&mut self, _cx: &Cx<'_>) -> Box<dyn Frame<Self>> {
            (self.entry)(&self.log)
        }

        fn on_event(&mut self, _cx: &Cx<'_>, ev: &Event) -> Result<bool, PlanError> {
            match ev.channel() {
                Some((_, v)) if v < 0.0 => Err(PlanError::fail("negative axis")),
                Some((_, v)) if v > 100.0 => panic!("axis overflow"),
                _ => Ok(self.accept),
            }
        }

        fn on_start(&mut self, _cx: &Cx<'_>) {
            self.log.borrow_mut().push(format!("{}:start", self.tag));
        }

        fn on_stop(&mut self, _cx: &Cx<'_>) {
            self.log.borrow_mut().push(format!("{}:stop", self.tag));
        }
    }

    fn setup() -> (Rc<ManualClock>, Context, Log) {
        let clock = Rc::new(ManualClock::new(0.0));
        let cx = Context::new(clock.clone(), Config::default());
        (clock, cx, Rc::new(RefCell::new(Vec::new())))
    }

    fn scripted(
        cx: &Context,
        tag: &'static str,
        log: &Log,
        entry: impl FnMut(&Log) -> Box<dyn Frame<Scripted>> + 'static,
    ) -> Plan<Scripted> {
        Plan::new(
            cx,
            Scripted {
                tag,
                log: log.clone(),
                accept: true,
                entry: Box::new(entry),
            },
        )
    }

    /// Suspends `n` times, then completes.
    fn suspends(n: u32) -> Box<dyn Frame<Scripted>> {
        let mut left = n;
        Box::new(FnFrame::new(move |_s: &mut Scripted, _cx: &Cx<'_>, input: Resume| {
            if let Resume::Throw(e) = input {
                return Step::Fail(e);
            }
            if left == 0 {
                Step::Done
            } else {
                left -= 1;
                Step::Suspend
            }
        }))
    }

    fn failing(msg: &'static str) -> Box<dyn Frame<Scripted>> {
        Box::new(FnFrame::new(move |_s: &mut Scripted, _cx: &Cx<'_>, _input: Resume| {
            Step::Fail(PlanError::fail(msg))
        }))
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
    fn running_only_between_start_and_termination() {
        let (clock, cx, log) = setup();
        let mut rx = cx.bus().subscribe();
        let mut p = scripted(&cx, "p", &log, |_| suspends(2));
        assert!(!p.is_running());
        p.start();
        assert!(p.is_running());
        turn(&mut p, &clock, 0.1);
        turn(&mut p, &clock, 0.1);
        assert!(p.is_running());
        turn(&mut p, &clock, 0.1);
        assert!(!p.is_running());
        assert_eq!(*log.borrow(), ["p:start", "p:stop"]);
        assert_eq!(kinds(&mut rx), [NoticeKind::PlanStarted, NoticeKind::PlanStopped]);

        p.start();
        assert!(p.is_running());
        p.stop(true);
        assert!(!p.is_running());
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn redundant_start_changes_nothing() {
        let (clock, cx, log) = setup();
        let mut rx = cx.bus().subscribe();
        let mut p = scripted(&cx, "p", &log, |_| {
            Box::new(FnFrame::new(|_s: &mut Scripted, _cx: &Cx<'_>, _i: Resume| {
                Step::call(ForDuration::new(10.0))
            }))
        });
        p.start();
        turn(&mut p, &clock, 0.1);
        p.push(&[Event::tick(0.2), Event::tick(0.3)]);
        let (depth, pending) = (p.depth(), p.pending());
        assert_eq!((depth, pending), (2, 2));

        p.start();
        assert_eq!((p.depth(), p.pending()), (depth, pending));
        assert_eq!(*log.borrow(), ["p:start"]);
        assert!(kinds(&mut rx).contains(&NoticeKind::StartIgnored));
    }

    #[test]
    fn events_are_dropped_while_stopped() {
        let (_clock, cx, log) = setup();
        let mut p = scripted(&cx, "p", &log, |_| suspends(1));
        p.push(&[Event::tick(0.0)]);
        assert_eq!(p.pending(), 0);
        p.start();
        p.push(&[Event::tick(0.0)]);
        assert_eq!(p.pending(), 1);
    }

    #[test]
    fn rejected_events_leave_plan_idle() {
        let (clock, cx, log) = setup();
        let mut p = scripted(&cx, "p", &log, |_| suspends(0));
        p.behavior_mut().accept = false;
        p.start();
        turn(&mut p, &clock, 0.1);
        assert!(p.is_running());
        p.step();
        assert!(p.is_running());

        p.behavior_mut().accept = true;
        turn(&mut p, &clock, 0.1);
        assert!(!p.is_running());
    }

    #[test]
    fn handler_faults_count_as_rejection() {
        let (_clock, cx, log) = setup();
        let mut rx = cx.bus().subscribe();
        let mut p = scripted(&cx, "p", &log, |_| suspends(0));
        p.start();
        p.push(&[Event::axis(0.0, 0, 0, -1.0), Event::axis(0.0, 0, 0, 500.0)]);
        p.step();
        assert!(p.is_running());
        let seen = kinds(&mut rx);
        assert_eq!(
            seen.iter()
                .filter(|k| **k == NoticeKind::HandlerFailed)
                .count(),
            2
        );
    }

    #[test]
    fn nested_failure_is_caught_by_enclosing_frame() {
        let (clock, cx, log) = setup();
        let mut rx = cx.bus().subscribe();
        let mut p = scripted(&cx, "p", &log, |_| {
            let mut stage = 0;
            Box::new(FnFrame::new(move |s: &mut Scripted, _cx: &Cx<'_>, input: Resume| {
                stage += 1;
                match (stage, input) {
                    (1, _) => {
                        let mut mid_stage = 0;
                        Step::call(FnFrame::new(move |_s: &mut Scripted, _cx: &Cx<'_>, input: Resume| {
                            mid_stage += 1;
                            match (mid_stage, input) {
                                (1, _) => Step::Suspend,
                                (2, _) => Step::Call(failing("deep")),
                                (_, Resume::Throw(e)) => Step::Fail(e),
                                _ => Step::Done,
                            }
                        }))
                    }
                    (_, Resume::Throw(e)) => {
                        s.log.borrow_mut().push(format!("caught {}", e.as_message()));
                        Step::Done
                    }
                    _ => Step::Fail(PlanError::fail("not reached")),
                }
            }))
        });
        p.start();
        turn(&mut p, &clock, 0.1);
        assert_eq!(p.depth(), 2);
        turn(&mut p, &clock, 0.1);
        assert!(!p.is_running());
        assert_eq!(*log.borrow(), ["p:start", "caught error: deep", "p:stop"]);
        let seen = kinds(&mut rx);
        assert_eq!(
            seen.iter().filter(|k| **k == NoticeKind::FrameFailed).count(),
            2
        );
        assert!(!seen.contains(&NoticeKind::PlanFailed));
    }

    #[test]
    fn uncaught_failure_terminates_only_that_plan() {
        let (clock, cx, log) = setup();
        let mut rx = cx.bus().subscribe();
        let mut bad = scripted(&cx, "bad", &log, |_| failing("boom"));
        let mut good = scripted(&cx, "good", &log, |_| suspends(5));
        bad.start();
        good.start();
        turn(&mut bad, &clock, 0.1);
        turn(&mut good, &clock, 0.0);
        assert!(!bad.is_running());
        assert!(good.is_running());
        assert!(log.borrow().contains(&"bad:stop".to_string()));
        assert!(kinds(&mut rx).contains(&NoticeKind::PlanFailed));
    }

    #[test]
    fn panicking_frame_is_handled_like_an_error() {
        let (clock, cx, log) = setup();
        let mut p = scripted(&cx, "p", &log, |_| {
            Box::new(FnFrame::new(|_s: &mut Scripted, _cx: &Cx<'_>, _i: Resume| -> Step<Scripted> {
                panic!("frame exploded")
            }))
        });
        p.start();
        turn(&mut p, &clock, 0.1);
        assert!(!p.is_running());
        assert_eq!(*log.borrow(), ["p:start", "p:stop"]);
    }

    fn parent_with_child(cx: &Context, log: &Log, child: PlanRef) -> Plan<Scripted> {
        scripted(cx, "parent", log, move |_| {
            let mut child = Some(child.clone());
            Box::new(
                FnFrame::new(move |_s: &mut Scripted, _cx: &Cx<'_>, input: Resume| {
                    if let Resume::Throw(e) = input {
                        return Step::Fail(e);
                    }
                    match child.take() {
                        Some(c) => Step::Spawn(c),
                        None => Step::Done,
                    }
                })
                .on_close(|s: &mut Scripted, _cx: &Cx<'_>| {
                    s.log.borrow_mut().push("parent:close".into());
                    Ok(())
                }),
            )
        })
    }

    fn closable_child(cx: &Context, log: &Log) -> Rc<RefCell<Plan<Scripted>>> {
        scripted(cx, "child", log, |_| {
            Box::new(
                FnFrame::new(|_s: &mut Scripted, _cx: &Cx<'_>, _i: Resume| Step::Suspend).on_close(
                    |s: &mut Scripted, _cx: &Cx<'_>| {
                        s.log.borrow_mut().push("child:close".into());
                        Ok(())
                    },
                ),
            )
        })
        .shared()
    }

    #[test]
    fn stop_unwinds_child_before_parent() {
        let (clock, cx, log) = setup();
        let child = closable_child(&cx, &log);
        let mut parent = parent_with_child(&cx, &log, child.clone());
        parent.start();
        turn(&mut parent, &clock, 0.1);
        assert!(child.borrow().is_running());
        turn(&mut parent, &clock, 0.1);
        assert!(parent.is_running());

        log.borrow_mut().clear();
        parent.stop(false);
        assert!(!child.borrow().is_running());
        assert_eq!(
            *log.borrow(),
            ["child:close", "child:stop", "parent:close", "parent:stop"]
        );
    }

    #[test]
    fn forced_stop_skips_cleanup_but_not_on_stop() {
        let (clock, cx, log) = setup();
        let child = closable_child(&cx, &log);
        let mut parent = parent_with_child(&cx, &log, child.clone());
        parent.start();
        turn(&mut parent, &clock, 0.1);

        log.borrow_mut().clear();
        parent.stop(true);
        assert_eq!(*log.borrow(), ["child:stop", "parent:stop"]);
        parent.stop(true);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn redundant_start_keeps_the_active_child() {
        let (clock, cx, log) = setup();
        let child = closable_child(&cx, &log);
        let child_ref: PlanRef = child.clone();
        let mut parent = parent_with_child(&cx, &log, child_ref.clone());
        parent.start();
        turn(&mut parent, &clock, 0.1);
        parent.push(&[Event::tick(0.2)]);
        let (depth, pending) = (parent.depth(), parent.pending());

        parent.start();
        assert_eq!((parent.depth(), parent.pending()), (depth, pending));
        assert!(parent.child().is_some_and(|c| same_plan(c, &child_ref)));
        assert!(child.borrow().is_running());
        assert_eq!(*log.borrow(), ["parent:start", "child:start"]);
    }

    #[test]
    fn parent_resumes_after_child_finishes() {
        let (_clock, cx, log) = setup();
        let mut host = Host::new(cx.clone());
        let child: PlanRef = scripted(&cx, "child", &log, |_| suspends(0)).shared();
        let parent = parent_with_child(&cx, &log, child.clone()).shared();
        host.launch(parent.clone());

        host.tick();
        assert!(child.borrow().is_running());
        host.tick();
        assert!(!child.borrow().is_running());
        assert!(parent.borrow().is_running());
        host.tick();
        assert!(!parent.borrow().is_running());
        assert_eq!(
            *log.borrow(),
            ["parent:start", "child:start", "child:stop", "parent:stop"]
        );
    }

    #[test]
    fn spawning_a_running_plan_throws_into_the_frame() {
        let (clock, cx, log) = setup();
        let busy: PlanRef = scripted(&cx, "busy", &log, |_| suspends(10)).shared();
        busy.borrow_mut().start();
        let target = busy.clone();
        let mut p = scripted(&cx, "p", &log, move |_| {
            let target = target.clone();
            let mut spawned = false;
            Box::new(FnFrame::new(move |s: &mut Scripted, _cx: &Cx<'_>, input: Resume| {
                match input {
                    Resume::Throw(PlanError::ChildAlreadyRunning { plan }) => {
                        s.log.borrow_mut().push(format!("refused {plan}"));
                        Step::Done
                    }
                    Resume::Throw(e) => Step::Fail(e),
                    Resume::Next if !spawned => {
                        spawned = true;
                        Step::Spawn(target.clone())
                    }
                    Resume::Next => Step::Done,
                }
            }))
        });
        p.start();
        turn(&mut p, &clock, 0.1);
        assert!(!p.is_running());
        let label = busy.borrow().label().to_string();
        assert!(log.borrow().contains(&format!("refused {label}")));
        assert!(busy.borrow().is_running());
    }

    #[test]
    fn resume_budget_bounds_a_turn() {
        let clock = Rc::new(ManualClock::new(0.0));
        let cfg = Config {
            resume_budget: 4,
            ..Config::default()
        };
        let cx = Context::new(clock.clone(), cfg);
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut p = scripted(&cx, "spin", &log, |_| {
            Box::new(FnFrame::new(|s: &mut Scripted, _cx: &Cx<'_>, _i: Resume| {
                s.log.borrow_mut().push("spin".into());
                Step::call(UntilTimeZero)
            }))
        });
        p.start();
        turn(&mut p, &clock, 0.1);
        assert!(p.is_running());
        assert_eq!(log.borrow().iter().filter(|l| *l == "spin").count(), 2);
    }

    /// Completes immediately.
    struct UntilTimeZero;

    impl Frame<Scripted> for UntilTimeZero {
        fn resume(&mut self, _: &mut Scripted, _: &Cx<'_>, input: Resume) -> Step<Scripted> {
            input.into_result().into()
        }
    }

    #[test]
    #[should_panic(expected = "not running")]
    fn stepping_a_stopped_plan_is_a_contract_violation() {
        let (_clock, cx, log) = setup();
        let mut p = scripted(&cx, "p", &log, |_| suspends(0));
        p.step();
    }
}
