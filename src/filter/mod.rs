//! # Input filtering.
//!
//! - [`DigitalFilter`] one channel's IIR state, with lowpass and integrator
//!   constructors
//! - [`StickFilter`] a plan owning named filters, fed by events and sampled
//!   on its own fixed interval

mod digital;
mod stick;

pub use digital::{DigitalFilter, InputMap, DEFAULT_BOUND};
pub use stick::{FilterBank, StickFilter};
