//! Error types used by the planvisor runtime and plans.
//!
//! This module defines three error enums:
//!
//! - [`ConfigError`]: validation failures raised synchronously by constructors
//!   and updaters (malformed tables, out-of-range knots, unresolvable bindings).
//! - [`PlanError`]: faults raised while a plan's frames are being resumed.
//! - [`RuntimeError`]: errors raised by the async host runner itself.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced while building or updating a plan.
///
/// These are always raised before any state is mutated: a constructor or
/// updater either returns a fully validated value or one of these errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The first header of a table must name the time column `t`.
    #[error("first column of sheet must have heading \"t\", not {found:?}")]
    TimeHeader {
        /// The heading that was found instead.
        found: String,
    },

    /// A table has a header but no rows.
    #[error("sheet has no rows")]
    EmptySheet,

    /// A row width differs from the header width.
    #[error("sheet row {row} has {len} entries instead of {expected}")]
    RaggedRow {
        /// 1-based row index (header excluded).
        row: usize,
        /// Width of the offending row.
        len: usize,
        /// Width of the header row.
        expected: usize,
    },

    /// A row has a missing or non-increasing time stamp.
    #[error("sheet row {row} has non-increasing time {time}")]
    NonIncreasingTime {
        /// 1-based row index (header excluded).
        row: usize,
        /// The offending time value.
        time: f64,
    },

    /// A CSV cell is neither empty nor a number.
    #[error("sheet row {row} column {column} holds {text:?}, not a number")]
    BadCell {
        /// 1-based row index (header excluded).
        row: usize,
        /// 1-based column index.
        column: usize,
        /// Offending cell text.
        text: String,
    },

    /// A column header has no binding.
    #[error("sheet addresses property {name:?} which has no binding")]
    UnboundColumn {
        /// Column heading.
        name: String,
    },

    /// A binding spec could not be resolved by the host into a setter.
    #[error("cannot resolve binding {name:?} from spec {spec:?}")]
    Unresolved {
        /// Binding name.
        name: String,
        /// Host-side spec that failed to resolve.
        spec: String,
    },

    /// A cycle breakpoint lies outside `[0, 1]`.
    #[error("phase {phase} is outside valid range [0,1]")]
    PhaseOutOfRange {
        /// The offending phase.
        phase: f64,
    },

    /// Two breakpoints share the same phase.
    #[error("duplicate breakpoint at phase {phase}")]
    DuplicateKnot {
        /// The duplicated phase.
        phase: f64,
    },

    /// A function cycle needs either a positive knot count or explicit knots.
    #[error("must specify either positive knot count or knots")]
    NoKnots,

    /// Sheet replay rate must be strictly positive.
    #[error("rate {rate} should have been > 0")]
    InvalidRate {
        /// Rejected rate.
        rate: f64,
    },

    /// Maximal cycle frequency must be strictly positive.
    #[error("maximal frequency {freq} should have been > 0")]
    InvalidMaxFrequency {
        /// Rejected frequency.
        freq: f64,
    },

    /// Lowpass time constants below two samples are not supported.
    #[error("only tau >= 2 supported, got tau={tau}")]
    InvalidTimeConstant {
        /// Rejected time constant.
        tau: f64,
    },

    /// Filter sample interval must be strictly positive.
    #[error("sample interval {dt} should have been > 0")]
    InvalidSampleInterval {
        /// Rejected interval.
        dt: f64,
    },

    /// Filter coefficients or initial states have inconsistent lengths.
    #[error("{what} has length {len}; must equal {expected}")]
    LengthMismatch {
        /// Which vector is wrong.
        what: &'static str,
        /// Its length.
        len: usize,
        /// Expected length.
        expected: usize,
    },

    /// The leading denominator coefficient must be non-zero.
    #[error("leading denominator coefficient must be non-zero")]
    ZeroLeadingCoefficient,

    /// A plan cannot be reconfigured while it is running.
    #[error("cannot update {plan} while it is running")]
    Running {
        /// Label of the running plan.
        plan: String,
    },

    /// No filter has been configured for a channel.
    #[error("no filter for channel {channel:?}")]
    UnknownChannel {
        /// Channel name.
        channel: String,
    },

    /// An event carries no filterable channel.
    #[error("event {kind} has no filter channel")]
    NoChannel {
        /// Event kind label.
        kind: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use planvisor::ConfigError;
    ///
    /// let err = ConfigError::InvalidRate { rate: 0.0 };
    /// assert_eq!(err.as_label(), "config_invalid_rate");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::TimeHeader { .. } => "config_time_header",
            ConfigError::EmptySheet => "config_empty_sheet",
            ConfigError::RaggedRow { .. } => "config_ragged_row",
            ConfigError::NonIncreasingTime { .. } => "config_non_increasing_time",
            ConfigError::BadCell { .. } => "config_bad_cell",
            ConfigError::UnboundColumn { .. } => "config_unbound_column",
            ConfigError::Unresolved { .. } => "config_unresolved",
            ConfigError::PhaseOutOfRange { .. } => "config_phase_out_of_range",
            ConfigError::DuplicateKnot { .. } => "config_duplicate_knot",
            ConfigError::NoKnots => "config_no_knots",
            ConfigError::InvalidRate { .. } => "config_invalid_rate",
            ConfigError::InvalidMaxFrequency { .. } => "config_invalid_max_frequency",
            ConfigError::InvalidTimeConstant { .. } => "config_invalid_time_constant",
            ConfigError::InvalidSampleInterval { .. } => "config_invalid_sample_interval",
            ConfigError::LengthMismatch { .. } => "config_length_mismatch",
            ConfigError::ZeroLeadingCoefficient => "config_zero_leading_coefficient",
            ConfigError::Running { .. } => "config_running",
            ConfigError::UnknownChannel { .. } => "config_unknown_channel",
            ConfigError::NoChannel { .. } => "config_no_channel",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Faults raised while running a plan.
///
/// A `PlanError` returned from a frame is thrown into the next enclosing frame;
/// one that escapes the bottom frame terminates that plan only.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Behavior code failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A frame yielded a sub-plan that was already running.
    #[error("sub-plan {plan} is already running")]
    ChildAlreadyRunning {
        /// Label of the sub-plan.
        plan: String,
    },

    /// User code panicked; the panic was caught by the engine.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// An output setter failed.
    #[error("setter {name:?} failed: {error}")]
    Setter {
        /// Setter name.
        name: String,
        /// The underlying error message.
        error: String,
    },
}

impl PlanError {
    /// Creates a [`PlanError::Fail`] from anything printable.
    pub fn fail(error: impl Into<String>) -> Self {
        PlanError::Fail {
            error: error.into(),
        }
    }

    /// Builds a [`PlanError::Panicked`] from a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        PlanError::Panicked { info }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use planvisor::PlanError;
    ///
    /// assert_eq!(PlanError::fail("boom").as_label(), "plan_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PlanError::Fail { .. } => "plan_failed",
            PlanError::ChildAlreadyRunning { .. } => "plan_child_already_running",
            PlanError::Panicked { .. } => "plan_panicked",
            PlanError::Setter { .. } => "plan_setter_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PlanError::Fail { error } => format!("error: {error}"),
            PlanError::ChildAlreadyRunning { plan } => format!("already running: {plan}"),
            PlanError::Panicked { info } => format!("panic: {info}"),
            PlanError::Setter { name, error } => format!("setter {name}: {error}"),
        }
    }
}

/// # Errors produced by the async host runner.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// OS signal handlers could not be registered.
    #[error("cannot listen for shutdown signals: {error}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        error: std::io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Signal { .. } => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Signal { error } => format!("signal: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_messages() {
        let err = PlanError::from_panic(Box::new("boom"));
        assert_eq!(
            err,
            PlanError::Panicked {
                info: "boom".into()
            }
        );
        let err = PlanError::from_panic(Box::new(String::from("bang")));
        assert_eq!(err.as_message(), "panic: bang");
        let err = PlanError::from_panic(Box::new(17_u32));
        assert_eq!(err.as_label(), "plan_panicked");
    }

    #[test]
    fn config_errors_render_context() {
        let err = ConfigError::RaggedRow {
            row: 2,
            len: 3,
            expected: 2,
        };
        assert_eq!(err.to_string(), "sheet row 2 has 3 entries instead of 2");
        assert_eq!(err.as_label(), "config_ragged_row");
    }
}
