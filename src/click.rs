//! # MultiClick: combining up/down input pairs.
//!
//! Keys, mouse buttons and joystick buttons report separate down and up
//! events. [`Clicks`] turns them into two higher-level callbacks:
//!
//! - **click**: an input released before the merge delay (counted from the
//!   most recent press) ran out;
//! - **multi-click**: the set of held inputs once it has been stable for the
//!   merge delay.
//!
//! ```text
//!  DOWN 1, UP 1            → click 1
//!  DOWN 1, DOWN 2, (wait)  → multi-click {1, 2}
//!  UP 1, (wait)            → multi-click {2}
//!  DOWN 3, UP 3, (wait)    → click 3, multi-click {2}
//!  UP 2, (wait)            → multi-click {}   (only with allow_empty)
//! ```
//!
//! Waiting is measured on `Tick` events. The plan's frames only run when a
//! handler returns `true`.

use std::collections::BTreeMap;

use tracing::trace;

use crate::context::Context;
use crate::error::PlanError;
use crate::events::Event;
use crate::plan::{Behavior, Cx, Frame, Plan, Resume, Step};

/// Receiver of click and multi-click callbacks.
///
/// A `true` return lets the owning plan's frames run this turn.
pub trait ClickHandler: 'static {
    /// A short press; `event` is the release.
    fn on_click(&mut self, _cx: &Cx<'_>, _event: &Event) -> bool {
        false
    }

    /// The stable set of held inputs, keyed by input name, valued by the
    /// press event.
    fn on_multi_click(&mut self, _cx: &Cx<'_>, _held: &BTreeMap<String, Event>) -> bool {
        false
    }
}

/// Behavior of a [`MultiClick`] plan.
#[derive(Debug)]
pub struct Clicks<H> {
    handler: H,
    delay: f64,
    allow_empty: bool,
    held: BTreeMap<String, Event>,
    when: Option<f64>,
}

impl<H: ClickHandler> Clicks<H> {
    /// Merges with `delay` seconds; empty sets are not reported.
    pub fn new(handler: H, delay: f64) -> Self {
        Self {
            handler,
            delay,
            allow_empty: false,
            held: BTreeMap::new(),
            when: None,
        }
    }

    /// The handler.
    #[inline]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable handler.
    #[inline]
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Names of currently held inputs.
    pub fn held(&self) -> impl Iterator<Item = &str> {
        self.held.keys().map(String::as_str)
    }

    /// Merge delay (seconds).
    #[inline]
    pub fn delay(&self) -> f64 {
        self.delay
    }
}

impl<H: ClickHandler> Behavior for Clicks<H> {
    fn name(&self) -> &str {
        "MultiClick"
    }

    fn entry(&mut self, _cx: &Cx<'_>) -> Box<dyn Frame<Self>> {
        Box::new(Hold)
    }

    fn on_start(&mut self, _cx: &Cx<'_>) {
        self.held.clear();
        self.when = None;
    }

    fn on_event(&mut self, cx: &Cx<'_>, event: &Event) -> Result<bool, PlanError> {
        let now = cx.now();
        if event.is_tick() {
            let Some(when) = self.when.filter(|w| now > *w) else {
                return Ok(false);
            };
            self.when = None;
            if self.held.is_empty() && !self.allow_empty {
                return Ok(false);
            }
            trace!(target: "planvisor::click", plan = cx.label(), held = self.held.len(), settled = when, "multi-click");
            return Ok(self.handler.on_multi_click(cx, &self.held));
        }

        let Some((name, down)) = event.click_name() else {
            return Ok(false);
        };
        if down {
            self.held.insert(name, event.clone());
            self.when = Some(now + self.delay);
            return Ok(false);
        }
        if self.held.remove(&name).is_none() {
            return Ok(false);
        }
        if self.when.is_some_and(|w| now < w) {
            Ok(self.handler.on_click(cx, event))
        } else {
            self.when = Some(now + self.delay);
            Ok(false)
        }
    }
}

/// Entry frame that never finishes on its own.
struct Hold;

impl<S> Frame<S> for Hold {
    fn resume(&mut self, _state: &mut S, _cx: &Cx<'_>, input: Resume) -> Step<S> {
        match input {
            Resume::Next => Step::Suspend,
            Resume::Throw(e) => Step::Fail(e),
        }
    }
}

/// Plan reporting clicks and multi-clicks to a [`ClickHandler`].
pub type MultiClick<H> = Plan<Clicks<H>>;

impl<H: ClickHandler> Plan<Clicks<H>> {
    /// Builds a stopped multi-click plan using the configured merge delay.
    pub fn with_handler(context: &Context, handler: H) -> Self {
        let delay = context.config().click_delay;
        Plan::new(context, Clicks::new(handler, delay))
    }

    /// Whether an empty held set is reported when the last input is released.
    pub fn set_allow_empty(&mut self, allow: bool) {
        self.behavior_mut().allow_empty = allow;
    }

    /// Changes the merge delay.
    pub fn set_delay(&mut self, delay: f64) {
        self.behavior_mut().delay = delay;
    }
}
