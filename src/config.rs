//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings shared by the host, the runner and
//! every plan (through [`Context`](crate::Context)).
//!
//! Config is used in two ways:
//! 1. **Context creation**: `Context::new(clock, config)`
//! 2. **Plan defaults**: cycle plans, stick filters and multi-click plans read
//!    their default frequency limit, sample interval and merge delay from it.
//!
//! ## Sentinel values
//! - `resume_budget = 0` → unlimited resumptions per turn
//! - `turn = 0s` → the runner uses 1 ms (an interval cannot be zero)

use std::collections::BTreeSet;
use std::time::Duration;

/// Debug topics enabling verbose `tracing::debug!` output per concern.
///
/// These replace a process-wide flag list: each plan reads them from its own
/// [`Context`](crate::Context).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    /// Frame stepping inside a plan.
    Step,
    /// Sub-plan and sub-frame creation.
    Nesting,
    /// Sheet replay timing.
    Sheet,
    /// Lap crossings in cycle plans.
    Cycle,
    /// Individual knot actions in cycle plans.
    Knot,
    /// Setter calls made by table replay.
    Setter,
    /// Host turns.
    Host,
}

/// Global configuration for the planvisor runtime.
///
/// ## Field semantics
/// - `turn`: interval between host turns when driven by the runner
/// - `bus_capacity`: notice bus ring buffer size (min 1; clamped by Bus)
/// - `resume_budget`: frame resumptions allowed per plan per turn (`0` = unlimited)
/// - `max_freq`: default maximal cycling frequency for cycle plans (Hz)
/// - `filter_dt`: default sample interval for stick filters (s)
/// - `click_delay`: default merge delay for multi-click plans (s)
/// - `exit_when_idle`: runner returns once no plan is running
/// - `debug`: enabled debug topics
#[derive(Clone, Debug)]
pub struct Config {
    /// Interval between host turns when driven by [`Runner`](crate::Runner).
    pub turn: Duration,

    /// Capacity of the notice bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Maximum number of frame resumptions a plan may perform in one turn.
    ///
    /// Frames that complete or delegate keep the turn going; this bound stops a
    /// behavior that never suspends from starving the host loop.
    pub resume_budget: usize,

    /// Default maximal cycling frequency for cycle plans (Hz).
    pub max_freq: f64,

    /// Default sample interval for stick filters (seconds).
    pub filter_dt: f64,

    /// Default merge delay for multi-click plans (seconds).
    pub click_delay: f64,

    /// Whether the runner returns once the host has no running plan.
    pub exit_when_idle: bool,

    /// Enabled debug topics.
    pub debug: BTreeSet<Topic>,
}

impl Config {
    /// Returns the per-turn resumption budget as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` resumptions per plan per turn
    #[inline]
    pub fn resume_budget(&self) -> Option<usize> {
        if self.resume_budget == 0 {
            None
        } else {
            Some(self.resume_budget)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the turn interval, never zero.
    #[inline]
    pub fn turn_interval(&self) -> Duration {
        if self.turn.is_zero() {
            Duration::from_millis(1)
        } else {
            self.turn
        }
    }

    /// Returns true if the given debug topic is enabled.
    #[inline]
    pub fn debugs(&self, topic: Topic) -> bool {
        self.debug.contains(&topic)
    }

    /// Returns a copy with the given debug topic enabled.
    pub fn with_debug(mut self, topic: Topic) -> Self {
        self.debug.insert(topic);
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `turn = 20ms`
    /// - `bus_capacity = 1024`
    /// - `resume_budget = 1024`
    /// - `max_freq = 10 Hz`
    /// - `filter_dt = 0.1 s`
    /// - `click_delay = 0.2 s`
    /// - `exit_when_idle = false`
    /// - no debug topics
    fn default() -> Self {
        Self {
            turn: Duration::from_millis(20),
            bus_capacity: 1024,
            resume_budget: 1024,
            max_freq: 10.0,
            filter_dt: 0.1,
            click_delay: 0.2,
            exit_when_idle: false,
            debug: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_options() {
        let mut cfg = Config::default();
        assert_eq!(cfg.resume_budget(), Some(1024));
        cfg.resume_budget = 0;
        assert_eq!(cfg.resume_budget(), None);
        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        cfg.turn = Duration::ZERO;
        assert_eq!(cfg.turn_interval(), Duration::from_millis(1));
    }

    #[test]
    fn debug_topics_are_opt_in() {
        let cfg = Config::default();
        assert!(!cfg.debugs(Topic::Cycle));
        let cfg = cfg.with_debug(Topic::Cycle);
        assert!(cfg.debugs(Topic::Cycle));
        assert!(!cfg.debugs(Topic::Knot));
    }
}
