//! # Notice subscribers for the planvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the runner's per-subscriber
//! queues and the built-in subscribers.
//!
//! ## Architecture
//! ```text
//! Notice flow:
//!   Plan / Host ── publish(Notice) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                                          │
//!                                                       ┌──────────────────┼───────────┐
//!                                                       ▼                  ▼           ▼
//!                                                   LogWriter        AliveTracker    Custom
//! ```
//!
//! ## Built-ins
//! - [`AliveTracker`] running-plan record, always installed by the runner
//! - [`LogWriter`] notices as `tracing` lines (feature `logging`)

mod alive;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use alive::AliveTracker;
pub(crate) use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
