//! # Resumable frames.
//!
//! A [`Frame`] is one resumable computation on a plan's stack: the plan's
//! entry frame, or an inline sub-frame it delegated to. Each call to
//! [`Frame::resume`] runs the frame up to its next suspension point and
//! reports what happened as a [`Step`].
//!
//! ## Step outcomes
//! ```text
//! Suspend        → nothing more this turn
//! Spawn(plan)    → start plan as the active child; parent waits on it
//! Call(frame)    → push frame and resume it immediately (same turn)
//! Done           → pop; the frame below resumes with Resume::Next
//! Fail(error)    → pop; the frame below resumes with Resume::Throw(error)
//! ```
//!
//! A frame that delegated via `Call` is resumed with [`Resume::Throw`] when
//! the sub-frame failed, and may recover by returning any other step. A
//! spawned plan fails on its own (`PlanFailed`); its parent resumes with
//! [`Resume::Next`] once it stops. Only spawning a plan that is already
//! running throws ([`PlanError::ChildAlreadyRunning`]).

use std::fmt;

use crate::context::{Context, PlanId};
use crate::config::{Config, Topic};
use crate::error::PlanError;
use crate::notices::{Notice, NoticeKind};

use super::binding::Bindings;
use super::plan::PlanRef;

/// Input delivered to a frame when it is resumed.
#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    /// Continue normally.
    Next,
    /// A delegate failed with this error.
    Throw(PlanError),
}

impl Resume {
    /// Turns a thrown error into `Err`.
    #[inline]
    pub fn into_result(self) -> Result<(), PlanError> {
        match self {
            Resume::Next => Ok(()),
            Resume::Throw(e) => Err(e),
        }
    }
}

/// Outcome of resuming a frame.
pub enum Step<S> {
    /// Suspend until the next turn.
    Suspend,
    /// Start an independent sub-plan and wait until it stops running.
    Spawn(PlanRef),
    /// Delegate inline to a sub-frame.
    Call(Box<dyn Frame<S>>),
    /// The frame completed.
    Done,
    /// The frame failed.
    Fail(PlanError),
}

impl<S> Step<S> {
    /// Delegates inline to `frame`.
    #[inline]
    pub fn call(frame: impl Frame<S> + 'static) -> Self {
        Step::Call(Box::new(frame))
    }

    /// Short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            Step::Suspend => "suspend",
            Step::Spawn(_) => "spawn",
            Step::Call(_) => "call",
            Step::Done => "done",
            Step::Fail(_) => "fail",
        }
    }
}

impl<S> From<Result<(), PlanError>> for Step<S> {
    /// `Ok` completes the frame; `Err` fails it.
    fn from(r: Result<(), PlanError>) -> Self {
        match r {
            Ok(()) => Step::Done,
            Err(e) => Step::Fail(e),
        }
    }
}

impl<S> fmt::Debug for Step<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Fail(e) => f.debug_tuple("Fail").field(e).finish(),
            Step::Call(frame) => f.debug_tuple("Call").field(&frame.name()).finish(),
            other => f.write_str(other.as_label()),
        }
    }
}

/// One resumable computation over behavior state `S`.
pub trait Frame<S> {
    /// Runs until the next suspension point.
    fn resume(&mut self, state: &mut S, cx: &Cx<'_>, input: Resume) -> Step<S>;

    /// Frame-local cleanup, run when the plan is stopped without force.
    fn close(&mut self, _state: &mut S, _cx: &Cx<'_>) {}

    /// Name used in debug output.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// Per-plan view of the host context handed to frames and hooks.
#[derive(Clone, Copy)]
pub struct Cx<'a> {
    context: &'a Context,
    bindings: &'a Bindings,
    label: &'a str,
    id: PlanId,
}

impl<'a> Cx<'a> {
    pub(crate) fn new(
        context: &'a Context,
        bindings: &'a Bindings,
        label: &'a str,
        id: PlanId,
    ) -> Self {
        Self {
            context,
            bindings,
            label,
            id,
        }
    }

    /// Current host time in seconds.
    #[inline]
    pub fn now(&self) -> f64 {
        self.context.now()
    }

    /// The host context.
    #[inline]
    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// Runtime configuration.
    #[inline]
    pub fn config(&self) -> &'a Config {
        self.context.config()
    }

    /// The plan's bindings.
    #[inline]
    pub fn bindings(&self) -> &'a Bindings {
        self.bindings
    }

    /// Label of the plan being run (`name#id`).
    #[inline]
    pub fn label(&self) -> &'a str {
        self.label
    }

    /// Id of the plan being run.
    #[inline]
    pub fn id(&self) -> PlanId {
        self.id
    }

    /// True if verbose output for `topic` is enabled.
    #[inline]
    pub fn debugs(&self, topic: Topic) -> bool {
        self.context.debugs(topic)
    }

    /// Calls the setter bound to `name`.
    #[inline]
    pub fn set(&self, name: &str, value: f64) -> Result<(), PlanError> {
        self.bindings.set(name, value)
    }

    /// Starts `plan` as an independent plan that this one does not wait on.
    #[inline]
    pub fn launch(&self, plan: PlanRef) {
        self.context.launch(plan);
    }

    /// Publishes a notice tagged with this plan.
    pub fn publish(&self, notice: Notice) {
        self.context
            .publish(notice.with_plan(self.label).with_plan_id(self.id.get()));
    }

    /// Logs a caught fault and publishes it as a `kind` notice.
    pub fn report(&self, kind: NoticeKind, err: &PlanError) {
        tracing::warn!(
            target: "planvisor::plan",
            plan = self.label,
            label = err.as_label(),
            "{}",
            err.as_message()
        );
        self.publish(Notice::new(kind).with_reason(err.to_string()));
    }
}

impl fmt::Debug for Cx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cx").field("plan", &self.label).finish()
    }
}

/// `path::to::Type<Args>` → `Type`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    head.rsplit("::").next().unwrap_or(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    impl Frame<()> for Marker {
        fn resume(&mut self, _: &mut (), _: &Cx<'_>, input: Resume) -> Step<()> {
            input.into_result().into()
        }
    }

    #[test]
    fn short_names_strip_paths_and_generics() {
        assert_eq!(short_type_name::<Marker>(), "Marker");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(Marker.name(), "Marker");
    }

    #[test]
    fn results_map_to_steps() {
        let done: Step<()> = Ok(()).into();
        assert_eq!(done.as_label(), "done");
        let fail: Step<()> = Err(PlanError::fail("x")).into();
        assert!(matches!(fail, Step::Fail(PlanError::Fail { .. })));
        assert_eq!(
            Resume::Throw(PlanError::fail("y")).into_result(),
            Err(PlanError::fail("y"))
        );
    }
}
