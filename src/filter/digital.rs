//! # DigitalFilter: a sampled linear IIR evaluator.
//!
//! Evaluates the difference equation
//! ```text
//!   A[0]·y[n] = B[0]·x[n] + B[1]·x[n-1] + .. + B[nb]·x[n-nb]
//!                         - A[1]·y[n-1] - .. - A[na]·y[n-na]
//! ```
//! on a fixed sample grid, clamping every output to `[lower, upper]`.
//!
//! ## Rules
//! - Input is sample-and-hold: a step consumes the pending sample if one was
//!   fed since the previous step, otherwise repeats the last input.
//! - The pending slot holds one sample; a newer feed overwrites it.
//! - [`DigitalFilter::run_to`] takes whole steps only and never moves the
//!   filter's time past the target.

use std::cell::Cell;
use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;

use crate::error::ConfigError;

/// Mapping applied to raw input values before they enter the filter.
pub type InputMap = Rc<dyn Fn(f64) -> f64>;

/// Default saturation bound magnitude.
pub const DEFAULT_BOUND: f64 = 1e9;

/// Tolerance, in samples, when counting whole steps up to a target time.
const STEP_EPSILON: f64 = 1e-9;

/// One channel's linear filter state.
pub struct DigitalFilter {
    a: Vec<f64>,
    b: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    pending: Option<f64>,
    last: f64,
    lower: f64,
    upper: f64,
    map: Option<InputMap>,
    out: Rc<Cell<f64>>,
}

impl DigitalFilter {
    /// Filter with denominator `a` and numerator `b`, zero initial state and
    /// bounds `±1e9`.
    pub fn new(a: Vec<f64>, b: Vec<f64>) -> Result<Self, ConfigError> {
        match a.first() {
            None => {
                return Err(ConfigError::LengthMismatch {
                    what: "A",
                    len: 0,
                    expected: 1,
                })
            }
            Some(a0) if *a0 == 0.0 || !a0.is_finite() => {
                return Err(ConfigError::ZeroLeadingCoefficient)
            }
            Some(_) => {}
        }
        if b.is_empty() {
            return Err(ConfigError::LengthMismatch {
                what: "B",
                len: 0,
                expected: 1,
            });
        }
        Ok(Self {
            x: vec![0.0; b.len()],
            y: vec![0.0; a.len()],
            a,
            b,
            pending: None,
            last: 0.0,
            lower: -DEFAULT_BOUND,
            upper: DEFAULT_BOUND,
            map: None,
            out: Rc::new(Cell::new(0.0)),
        })
    }

    /// First-order lowpass with time constant `tau` (in samples, `>= 2`).
    ///
    /// Unity gain at steady state.
    pub fn lowpass(tau: f64) -> Result<Self, ConfigError> {
        if tau.is_nan() || tau < 2.0 {
            return Err(ConfigError::InvalidTimeConstant { tau });
        }
        let a = (-PI / tau).exp();
        let b = (1.0 - a) / 2.0;
        Self::new(vec![1.0, -a], vec![b, b])
    }

    /// Integrator adding `gain · x` to the output every sample.
    pub fn integrator(gain: f64) -> Result<Self, ConfigError> {
        Self::new(vec![1.0, -1.0], vec![gain])
    }

    /// Replaces the initial input and output histories.
    pub fn with_state(mut self, x0: Vec<f64>, y0: Vec<f64>) -> Result<Self, ConfigError> {
        if x0.len() != self.b.len() {
            return Err(ConfigError::LengthMismatch {
                what: "x0",
                len: x0.len(),
                expected: self.b.len(),
            });
        }
        if y0.len() != self.a.len() {
            return Err(ConfigError::LengthMismatch {
                what: "y0",
                len: y0.len(),
                expected: self.a.len(),
            });
        }
        self.out.set(y0[0]);
        self.x = x0;
        self.y = y0;
        Ok(self)
    }

    /// Sets the saturation bounds.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// Maps raw input values before filtering.
    pub fn with_input_map(mut self, map: impl Fn(f64) -> f64 + 'static) -> Self {
        self.map = Some(Rc::new(map));
        self
    }

    /// Sets the filter's time without stepping.
    pub fn starting_at(mut self, t0: f64) -> Self {
        self.last = t0;
        self
    }

    /// Time of the last evaluated sample.
    #[inline]
    pub fn last(&self) -> f64 {
        self.last
    }

    /// Most recent output.
    #[inline]
    pub fn value(&self) -> f64 {
        self.y[0]
    }

    /// Saturation bounds `(lower, upper)`.
    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Shared cell mirroring [`value`](Self::value).
    pub(crate) fn output(&self) -> Rc<Cell<f64>> {
        Rc::clone(&self.out)
    }

    /// Makes this filter publish into `out` instead of its own cell.
    pub(crate) fn adopt_output(&mut self, out: Rc<Cell<f64>>) {
        out.set(self.y[0]);
        self.out = out;
    }

    /// Stores a sample for the next step, replacing any unconsumed one.
    pub fn feed(&mut self, raw: f64) {
        let v = match &self.map {
            Some(f) => f(raw),
            None => raw,
        };
        self.pending = Some(v);
    }

    /// Zeroes the input and output histories.
    pub fn reset(&mut self) {
        self.x.iter_mut().for_each(|v| *v = 0.0);
        self.y.iter_mut().for_each(|v| *v = 0.0);
        self.out.set(0.0);
    }

    /// Evaluates one sample.
    pub fn step(&mut self) -> f64 {
        let input = self.pending.take().unwrap_or(self.x[0]);
        self.x.rotate_right(1);
        self.x[0] = input;

        let z0: f64 = self.b.iter().zip(&self.x).map(|(b, x)| b * x).sum();
        let z1: f64 = self.a[1..].iter().zip(&self.y).map(|(a, y)| a * y).sum();
        let y = ((z0 - z1) / self.a[0]).max(self.lower).min(self.upper);

        self.y.rotate_right(1);
        self.y[0] = y;
        self.out.set(y);
        y
    }

    /// Steps every whole `dt` between the last sample time and `t`.
    ///
    /// Returns the number of steps taken.
    pub fn run_to(&mut self, t: f64, dt: f64) -> usize {
        if dt.is_nan() || dt <= 0.0 || t.is_nan() || t <= self.last {
            return 0;
        }
        let n = ((t - self.last) / dt + STEP_EPSILON).floor() as usize;
        for _ in 0..n {
            self.step();
        }
        self.last += n as f64 * dt;
        n
    }
}

impl fmt::Debug for DigitalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigitalFilter")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("value", &self.y[0])
            .field("last", &self.last)
            .field("bounds", &(self.lower, self.upper))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_converges_to_constant_input() {
        let mut f = DigitalFilter::lowpass(4.0).expect("tau ok");
        f.feed(2.5);
        let steps = f.run_to(10.0, 0.1);
        assert_eq!(steps, 100);
        assert!((f.value() - 2.5).abs() < 1e-6, "value = {}", f.value());
    }

    #[test]
    fn lowpass_rejects_short_time_constants() {
        assert_eq!(
            DigitalFilter::lowpass(1.5).map(|_| ()),
            Err(ConfigError::InvalidTimeConstant { tau: 1.5 })
        );
        assert!(DigitalFilter::lowpass(f64::NAN).is_err());
    }

    #[test]
    fn integrator_ramps_until_clamped() {
        let mut f = DigitalFilter::integrator(2.0)
            .expect("valid")
            .with_bounds(-1.0, 5.0);
        f.feed(0.5);
        for k in 1..=5 {
            assert_eq!(f.step(), k as f64);
        }
        f.run_to(1.0, 0.1);
        assert_eq!(f.value(), 5.0);
    }

    #[test]
    fn latest_sample_wins_then_holds() {
        let mut f = DigitalFilter::integrator(1.0).expect("valid");
        f.feed(1.0);
        f.feed(3.0);
        f.step();
        f.step();
        assert_eq!(f.value(), 6.0);
        f.feed(-1.0);
        f.step();
        assert_eq!(f.value(), 5.0);
    }

    #[test]
    fn run_to_takes_whole_steps_only() {
        let mut f = DigitalFilter::integrator(1.0).expect("valid").starting_at(1.0);
        f.feed(1.0);
        assert_eq!(f.run_to(1.35, 0.1), 3);
        assert!((f.last() - 1.3).abs() < 1e-12);
        assert_eq!(f.run_to(1.38, 0.1), 0);
        assert_eq!(f.run_to(1.40, 0.1), 1);
        assert_eq!(f.run_to(0.5, 0.1), 0);
        assert_eq!(f.value(), 4.0);
    }

    #[test]
    fn input_map_and_reset() {
        let mut f = DigitalFilter::integrator(1.0)
            .expect("valid")
            .with_input_map(|v| v * 10.0);
        let out = f.output();
        f.feed(0.2);
        f.step();
        assert_eq!(out.get(), 2.0);
        f.reset();
        assert_eq!((f.value(), out.get()), (0.0, 0.0));
    }

    #[test]
    fn state_and_coefficients_are_validated() {
        assert_eq!(
            DigitalFilter::new(vec![0.0, 1.0], vec![1.0]).map(|_| ()),
            Err(ConfigError::ZeroLeadingCoefficient)
        );
        assert!(matches!(
            DigitalFilter::new(vec![], vec![1.0]),
            Err(ConfigError::LengthMismatch { what: "A", .. })
        ));
        let f = || DigitalFilter::new(vec![1.0, -0.5], vec![1.0, 1.0]).expect("valid");
        assert_eq!(
            f().with_state(vec![0.0], vec![0.0, 0.0]).map(|_| ()),
            Err(ConfigError::LengthMismatch {
                what: "x0",
                len: 1,
                expected: 2
            })
        );
        let f = f().with_state(vec![1.0, 1.0], vec![4.0, 0.0]).expect("lengths match");
        assert_eq!(f.value(), 4.0);
    }
}
