//! # Host clocks.
//!
//! Plans never read wall time directly; they ask the [`Clock`] held by their
//! [`Context`](crate::Context). Time is a monotonically increasing `f64` in
//! seconds.
//!
//! - [`SystemClock`]: seconds since the clock was created, from tokio's
//!   [`Instant`] (which follows the paused test clock under `test-util`).
//! - [`ManualClock`]: set or advanced explicitly; used by simulations and tests.

use std::cell::Cell;

use tokio::time::Instant;

/// Monotonic time source in seconds.
pub trait Clock {
    /// Returns the current time in seconds.
    fn now(&self) -> f64;
}

/// Clock backed by [`Instant`], starting at zero.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose zero is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Explicitly driven clock.
///
/// Share it with `Rc` to keep a handle after giving it to a context:
/// ```
/// use std::rc::Rc;
/// use planvisor::{Clock, ManualClock};
///
/// let clock = Rc::new(ManualClock::new(0.0));
/// clock.advance(0.25);
/// assert_eq!(clock.now(), 0.25);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    /// Creates a clock reading `t`.
    pub fn new(t: f64) -> Self {
        Self { now: Cell::new(t) }
    }

    /// Sets the clock. Moving backward is ignored to keep it monotonic.
    pub fn set(&self, t: f64) {
        if t > self.now.get() {
            self.now.set(t);
        }
    }

    /// Advances the clock by `dt` seconds (negative values are ignored).
    pub fn advance(&self, dt: f64) {
        if dt > 0.0 {
            self.now.set(self.now.get() + dt);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
