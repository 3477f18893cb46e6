//! # Host runtime: the turn loop around plans.
//!
//! - [`Host`] owns every started plan and runs synchronous scheduling turns
//! - [`Runner`] drives a host from tokio: fixed-interval turns, external
//!   events, cancellation, OS signals and notice subscribers

#[allow(clippy::module_inception)]
mod host;
mod runner;
mod shutdown;

pub use host::Host;
pub use runner::Runner;
