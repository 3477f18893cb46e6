//! # Plans: cooperative, nestable behaviors.
//!
//! A plan runs a [`Behavior`] as a stack of resumable [`Frame`]s inside a
//! single-threaded host loop. Frames suspend explicitly, delegate inline to
//! sub-frames, or start an independent sub-plan and wait for it.
//!
//! ## Contents
//! - [`Plan`], [`Runnable`], [`PlanRef`] the engine and its object-safe handle
//! - [`Behavior`] per-plan state and hooks
//! - [`Frame`], [`Step`], [`Resume`], [`Cx`] the resumption protocol
//! - [`UntilTime`], [`ForDuration`], [`FnFrame`] ready-made frames
//! - [`Setter`], [`Bindings`], [`Resolve`] named outputs fixed at construction
//!
//! ## Composition
//! ```text
//!  Plan A frames: [entry] ──Call──► [entry, sub] ──Done──► [entry]
//!                    │
//!                    └──Spawn(B)──► A waits while B.is_running()
//!                                   (B is stepped from A's step)
//! ```

mod behavior;
mod binding;
mod frame;
#[allow(clippy::module_inception)]
mod plan;
mod wait;

pub use behavior::Behavior;
pub use binding::{Bindings, BindingsBuilder, NoResolve, Resolve, Setter};
pub use frame::{Cx, Frame, Resume, Step};
pub use plan::{Plan, PlanRef, Runnable};
pub use wait::{FnFrame, ForDuration, UntilTime};

pub(crate) use plan::guarded;
