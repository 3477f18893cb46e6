//! Lifecycle notices: types and broadcast bus.
//!
//! This module groups the notice **data model** and the **bus** used to
//! publish/subscribe to lifecycle notices emitted by plans, the host and the
//! runner.
//!
//! ## Contents
//! - [`NoticeKind`], [`Notice`] notice classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Plan` (start/stop/faults), `Host`, `Runner`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the runner's subscriber listener (fans out to
//!   `SubscriberSet`), or any receiver obtained from [`Bus::subscribe`].

mod bus;
mod notice;

pub use bus::Bus;
pub use notice::{Notice, NoticeKind, StopCause};
