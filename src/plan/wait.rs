//! Ready-made frames: timed waits and closure-backed frames.

use std::fmt;

use crate::error::PlanError;

use super::frame::{Cx, Frame, Resume, Step};

/// Suspends until host time reaches a deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UntilTime {
    deadline: f64,
}

impl UntilTime {
    /// Waits until `deadline` (host seconds).
    pub fn new(deadline: f64) -> Self {
        Self { deadline }
    }
}

impl<S> Frame<S> for UntilTime {
    fn resume(&mut self, _state: &mut S, cx: &Cx<'_>, input: Resume) -> Step<S> {
        if let Resume::Throw(e) = input {
            return Step::Fail(e);
        }
        if cx.now() >= self.deadline {
            Step::Done
        } else {
            Step::Suspend
        }
    }
}

/// Suspends for a duration measured from the first resumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForDuration {
    duration: f64,
    deadline: Option<f64>,
}

impl ForDuration {
    /// Waits for `duration` seconds.
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }
}

impl<S> Frame<S> for ForDuration {
    fn resume(&mut self, _state: &mut S, cx: &Cx<'_>, input: Resume) -> Step<S> {
        if let Resume::Throw(e) = input {
            return Step::Fail(e);
        }
        let now = cx.now();
        let deadline = *self.deadline.get_or_insert(now + self.duration);
        if now >= deadline {
            Step::Done
        } else {
            Step::Suspend
        }
    }
}

type ResumeFn<S> = dyn FnMut(&mut S, &Cx<'_>, Resume) -> Step<S>;
type CloseFn<S> = dyn FnMut(&mut S, &Cx<'_>) -> Result<(), PlanError>;

/// Frame backed by closures, for ad-hoc state machines.
pub struct FnFrame<S> {
    resume: Box<ResumeFn<S>>,
    close: Option<Box<CloseFn<S>>>,
}

impl<S> FnFrame<S> {
    /// Frame whose every resumption calls `f`.
    pub fn new(f: impl FnMut(&mut S, &Cx<'_>, Resume) -> Step<S> + 'static) -> Self {
        Self {
            resume: Box::new(f),
            close: None,
        }
    }

    /// Adds cleanup run on a non-forced stop. A failed cleanup is reported
    /// as an `ActionFailed` notice.
    pub fn on_close(
        mut self,
        f: impl FnMut(&mut S, &Cx<'_>) -> Result<(), PlanError> + 'static,
    ) -> Self {
        self.close = Some(Box::new(f));
        self
    }
}

impl<S> Frame<S> for FnFrame<S> {
    fn resume(&mut self, state: &mut S, cx: &Cx<'_>, input: Resume) -> Step<S> {
        (self.resume)(state, cx, input)
    }

    fn close(&mut self, state: &mut S, cx: &Cx<'_>) {
        if let Some(f) = self.close.as_mut() {
            if let Err(e) = f(state, cx) {
                cx.report(crate::notices::NoticeKind::ActionFailed, &e);
            }
        }
    }
}

impl<S> fmt::Debug for FnFrame<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFrame")
            .field("close", &self.close.is_some())
            .finish()
    }
}
