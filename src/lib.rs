//! # planvisor
//!
//! **Planvisor** runs cooperative, nestable behavior plans inside a
//! single-threaded host loop: sequencing of timed outputs, phase-indexed
//! cyclic motion, table replay and input filtering for robotics-style
//! control programs.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   mpsc<Event>   interval   CancellationToken   OS signals
//!        │           │               │               │
//!        ▼           ▼               ▼               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner (async, current-thread)                                   │
//! │  - batches external events, one Host::turn per interval tick      │
//! │  - SubscriberSet + AliveTracker fed from the Bus                  │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Host: push(events) then step() on every running plan             │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐      ┌────────────┐     ┌─────────────┐
//!   │ SheetPlan│      │ CyclePlan  │     │ StickFilter │   ... MultiClick
//!   │ (frames) │      │  (frames)  │     │  (frames)   │
//!   └────┬─────┘      └─────┬──────┘     └─────┬───────┘
//!        │ Setter calls     │ knot actions     │ getters
//!        ▼                  ▼                  ▼
//!                    outputs owned by the host
//!
//!  every plan ── publish(Notice) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                                 ├─► LogWriter
//!                                                                 └─► AliveTracker
//! ```
//!
//! ### Plan lifecycle
//! ```text
//! Plan::start() ──► entry frame installed, registered with the host, PlanStarted
//!
//! each turn:
//!   ├─► on_event(ev) for every pending event  (true = accepted)
//!   ├─► nothing accepted ──► idle, frames untouched
//!   └─► resume top frame:
//!         ├─ Suspend      ─► wait for the next accepted turn
//!         ├─ Call(frame)  ─► push, resume it in this turn
//!         ├─ Spawn(plan)  ─► start child (the host steps it), wait while it runs
//!         ├─ Done         ─► pop, resume the parent frame
//!         └─ Fail(e)      ─► pop, throw e into the parent frame
//!                             (bottom frame: PlanFailed, plan stops)
//!
//! Plan::stop(force) ──► child stopped first, frames closed (skipped if force),
//!                       on_stop(), PlanStopped
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Plans**         | Resumable frame stacks driven by a host turn loop.            | [`Plan`], [`Behavior`], [`Frame`], [`Step`] |
//! | **Cycles**        | Phase-indexed knot dispatch with signed period.               | [`CyclePlan`], [`FunctionCyclePlan`]        |
//! | **Sheets**        | Timed or phase-indexed replay of value tables.                | [`SheetPlan`], [`GaitCyclePlan`], [`Sheet`] |
//! | **Filtering**     | Sampled IIR filters on named input channels.                  | [`StickFilter`], [`DigitalFilter`]          |
//! | **Clicks**        | Click and multi-click detection from up/down pairs.           | [`MultiClick`], [`ClickHandler`]            |
//! | **Host**          | Synchronous turns and the async runner around them.           | [`Host`], [`Runner`]                        |
//! | **Subscriber API**| Hook into plan lifecycle notices.                             | [`Subscribe`], [`Notice`]                   |
//! | **Errors**        | Typed errors for construction, execution and the runner.      | [`ConfigError`], [`PlanError`], [`RuntimeError`] |
//! | **Configuration** | Centralized runtime settings and debug topics.                | [`Config`], [`Topic`]                       |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber (on by default).
//!
//! ## Example
//! ```rust
//! use std::rc::Rc;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//! use planvisor::{
//!     Bindings, Config, Context, Host, NoResolve, Runner, Setter, Sheet, SheetPlan, SystemClock,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config { exit_when_idle: true, ..Config::default() };
//!     let cx = Context::new(Rc::new(SystemClock::new()), config);
//!
//!     // Outputs are named setters fixed at construction.
//!     let bindings = Bindings::builder()
//!         .setter(Setter::infallible("x", |v| println!("x = {v}")))
//!         .build(&NoResolve)?;
//!     let sheet: Sheet = "t,x\n0,1\n0.05,0\n".parse()?;
//!     let plan = SheetPlan::with_sheet(&cx, sheet, bindings)?;
//!
//!     let mut host = Host::new(cx);
//!     host.launch(plan.shared());
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn planvisor::Subscribe>> = vec![Arc::new(planvisor::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn planvisor::Subscribe>> = Vec::new();
//!
//!     let (_events, inputs) = mpsc::channel(64);
//!     Runner::new(host, subs)
//!         .run(inputs, CancellationToken::new())
//!         .await?;
//!     Ok(())
//! }
//! ```

mod click;
mod clock;
mod config;
mod context;
mod cycle;
mod error;
mod events;
mod filter;
mod host;
mod notices;
mod plan;
mod sheet;
mod subscribers;

// ---- Public re-exports ----

pub use click::{ClickHandler, Clicks, MultiClick};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Topic};
pub use context::{Context, PlanId};
pub use cycle::{
    Action, Cycle, CycleActions, CyclePlan, FunctionCyclePlan, FunctionKnots, Knot, KnotActions,
    KnotTable, Knots, LapCount,
};
pub use error::{ConfigError, PlanError, RuntimeError};
pub use events::{Event, EventKind, Input, MidiKind};
pub use filter::{DigitalFilter, FilterBank, InputMap, StickFilter, DEFAULT_BOUND};
pub use host::{Host, Runner};
pub use notices::{Bus, Notice, NoticeKind, StopCause};
pub use plan::{
    Behavior, Bindings, BindingsBuilder, Cx, FnFrame, ForDuration, Frame, NoResolve, Plan, PlanRef,
    Resolve, Resume, Runnable, Setter, Step, UntilTime,
};
pub use sheet::{GaitCyclePlan, Row, Sheet, SheetKnots, SheetPlan, SheetReplay, Table, TIME_HEADING};
pub use subscribers::{AliveTracker, Subscribe};

// Optional: a built-in subscriber rendering notices through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
