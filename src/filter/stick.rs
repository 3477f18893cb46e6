//! # StickFilter: periodically sampled input channels.
//!
//! Input devices report only changes. A [`StickFilter`] turns those sparse
//! events into regularly sampled signals: each configured channel owns a
//! [`DigitalFilter`], events overwrite the channel's pending sample, and every
//! `dt` the plan advances all channels to the current time.
//!
//! ```text
//!  Axis/Ball/Hat/Position/Midi ──on_event──► feed(channel) ──► pending slot
//!  Tick ──on_event──► frames run:
//!        loop { ForDuration(dt); for each channel: run_to(now, dt) }
//! ```
//!
//! Channel names follow [`Event::channel`]: `joy<j>axis<a>`, `joy<j>ball<b>`,
//! `joy<j>hat<h>`, `Nx<HH>`, `midi<dev>sc<scene><kind><index>`. Events for
//! channels without a filter are ignored.

use std::collections::BTreeMap;

use tracing::trace;

use crate::context::Context;
use crate::error::{ConfigError, PlanError};
use crate::events::Event;
use crate::plan::{Behavior, Cx, ForDuration, Frame, Plan, Resume, Step};

use super::digital::{DigitalFilter, DEFAULT_BOUND};

/// Behavior of a [`StickFilter`]: named filters sampled every `dt`.
#[derive(Debug)]
pub struct FilterBank {
    filters: BTreeMap<String, DigitalFilter>,
    dt: f64,
    time: Option<f64>,
}

impl FilterBank {
    /// Empty bank sampling every `dt` seconds.
    pub fn new(dt: f64) -> Result<Self, ConfigError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidSampleInterval { dt });
        }
        Ok(Self {
            filters: BTreeMap::new(),
            dt,
            time: None,
        })
    }

    /// Sample interval.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Configured channel names, sorted.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Filter of `channel`.
    pub fn filter(&self, channel: &str) -> Option<&DigitalFilter> {
        self.filters.get(channel)
    }

    /// Installs `filter` for `channel`.
    ///
    /// Replacing a filter keeps getters obtained for the channel working.
    pub fn set_filter(&mut self, channel: impl Into<String>, mut filter: DigitalFilter) {
        let channel = channel.into();
        if let Some(old) = self.filters.get(&channel) {
            filter.adopt_output(old.output());
        }
        self.filters.insert(channel, filter);
    }

    /// Feeds the event's value to its channel. Returns false if the event has
    /// no channel or the channel has no filter.
    pub fn feed(&mut self, event: &Event) -> bool {
        match event.channel() {
            Some((name, value)) => self.feed_value(&name, value).is_ok(),
            None => false,
        }
    }

    /// Feeds a raw value to `channel`.
    pub fn feed_value(&mut self, channel: &str, value: f64) -> Result<(), ConfigError> {
        self.filter_mut(channel)?.feed(value);
        Ok(())
    }

    /// Zeroes the histories of `channel`.
    pub fn set_to_zero(&mut self, channel: &str) -> Result<(), ConfigError> {
        self.filter_mut(channel)?.reset();
        Ok(())
    }

    /// Latest output of `channel`.
    pub fn value(&self, channel: &str) -> Result<f64, ConfigError> {
        self.filters
            .get(channel)
            .map(DigitalFilter::value)
            .ok_or_else(|| unknown(channel))
    }

    /// Latest output of the channel `event` addresses.
    pub fn value_of(&self, event: &Event) -> Result<f64, ConfigError> {
        let (name, _) = event.channel().ok_or(ConfigError::NoChannel {
            kind: event.kind().as_label(),
        })?;
        self.value(&name)
    }

    /// Closure reading the latest output of `channel`.
    pub fn getter_of(&self, channel: &str) -> Result<impl Fn() -> f64 + 'static, ConfigError> {
        let out = self
            .filters
            .get(channel)
            .map(DigitalFilter::output)
            .ok_or_else(|| unknown(channel))?;
        Ok(move || out.get())
    }

    /// Evaluation time used instead of the host clock, if set.
    #[inline]
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// Pins (or with `None`, releases) the evaluation time.
    pub fn set_time(&mut self, time: Option<f64>) {
        self.time = time;
    }

    /// Advances every channel to `t`.
    pub fn run_to(&mut self, t: f64) {
        for (name, filter) in &mut self.filters {
            let steps = filter.run_to(t, self.dt);
            if steps > 0 {
                trace!(target: "planvisor::filter", channel = %name, steps, value = filter.value(), "advanced");
            }
        }
    }

    fn filter_mut(&mut self, channel: &str) -> Result<&mut DigitalFilter, ConfigError> {
        self.filters.get_mut(channel).ok_or_else(|| unknown(channel))
    }
}

fn unknown(channel: &str) -> ConfigError {
    ConfigError::UnknownChannel {
        channel: channel.to_string(),
    }
}

impl Behavior for FilterBank {
    fn name(&self) -> &str {
        "StickFilter"
    }

    fn entry(&mut self, _cx: &Cx<'_>) -> Box<dyn Frame<Self>> {
        Box::new(Sample { waited: false })
    }

    fn on_event(&mut self, _cx: &Cx<'_>, event: &Event) -> Result<bool, PlanError> {
        if event.is_tick() {
            return Ok(true);
        }
        self.feed(event);
        Ok(false)
    }
}

struct Sample {
    waited: bool,
}

impl Frame<FilterBank> for Sample {
    fn resume(&mut self, bank: &mut FilterBank, cx: &Cx<'_>, input: Resume) -> Step<FilterBank> {
        if let Resume::Throw(e) = input {
            return Step::Fail(e);
        }
        if self.waited {
            let t = bank.time.unwrap_or_else(|| cx.now());
            bank.run_to(t);
        }
        self.waited = true;
        Step::call(ForDuration::new(bank.dt))
    }
}

/// Plan sampling input channels through digital filters.
pub type StickFilter = Plan<FilterBank>;

impl Plan<FilterBank> {
    /// Builds a stopped stick filter sampling every `dt` seconds.
    pub fn with_dt(context: &Context, dt: f64) -> Result<Self, ConfigError> {
        Ok(Plan::new(context, FilterBank::new(dt)?))
    }

    /// Builds a stopped stick filter using the configured sample interval.
    pub fn from_config(context: &Context) -> Result<Self, ConfigError> {
        Self::with_dt(context, context.config().filter_dt)
    }

    /// Installs a general filter for `channel`, starting at `t0` (default:
    /// now).
    pub fn set_filter(&mut self, channel: impl Into<String>, filter: DigitalFilter, t0: Option<f64>) {
        let t0 = t0.unwrap_or_else(|| self.context().now());
        self.behavior_mut().set_filter(channel, filter.starting_at(t0));
    }

    /// Installs a lowpass with time constant `tau` (samples) for `channel`.
    pub fn set_lowpass(
        &mut self,
        channel: impl Into<String>,
        tau: f64,
        t0: Option<f64>,
    ) -> Result<(), ConfigError> {
        self.set_filter(channel, DigitalFilter::lowpass(tau)?, t0);
        Ok(())
    }

    /// Installs an integrator with `gain` and output clamp `[lower, upper]`
    /// (default `±1e9`) for `channel`.
    pub fn set_integrator(
        &mut self,
        channel: impl Into<String>,
        gain: f64,
        bounds: Option<(f64, f64)>,
        t0: Option<f64>,
    ) -> Result<(), ConfigError> {
        let (lower, upper) = bounds.unwrap_or((-DEFAULT_BOUND, DEFAULT_BOUND));
        let filter = DigitalFilter::integrator(gain)?.with_bounds(lower, upper);
        self.set_filter(channel, filter, t0);
        Ok(())
    }

    /// See [`FilterBank::feed`].
    pub fn feed(&mut self, event: &Event) -> bool {
        self.behavior_mut().feed(event)
    }

    /// See [`FilterBank::set_to_zero`].
    pub fn set_to_zero(&mut self, channel: &str) -> Result<(), ConfigError> {
        self.behavior_mut().set_to_zero(channel)
    }

    /// See [`FilterBank::value`].
    pub fn value(&self, channel: &str) -> Result<f64, ConfigError> {
        self.behavior().value(channel)
    }

    /// See [`FilterBank::getter_of`].
    pub fn getter_of(&self, channel: &str) -> Result<impl Fn() -> f64 + 'static, ConfigError> {
        self.behavior().getter_of(channel)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::Config;
    use crate::events::Input;
    use crate::plan::Runnable;

    fn setup() -> (Rc<ManualClock>, Context) {
        let clock = Rc::new(ManualClock::new(0.0));
        let cx = Context::new(clock.clone(), Config::default());
        (clock, cx)
    }

    fn turn(plan: &mut StickFilter, clock: &ManualClock, dt: f64, events: &[Event]) {
        clock.advance(dt);
        plan.push(events);
        plan.push(&[Event::tick(clock.now())]);
        plan.step();
    }

    #[test]
    fn integrator_channel_follows_held_axis() {
        let (clock, cx) = setup();
        let mut plan = StickFilter::with_dt(&cx, 0.25).expect("dt ok");
        plan.set_integrator("joy0axis1", 2.0, Some((-10.0, 3.0)), None)
            .expect("valid");
        let read = plan.getter_of("joy0axis1").expect("configured");
        plan.start();

        turn(&mut plan, &clock, 0.0, &[Event::axis(0.0, 0, 1, 0.5)]);
        assert_eq!(read(), 0.0);
        turn(&mut plan, &clock, 0.25, &[]);
        assert_eq!(read(), 1.0);
        turn(&mut plan, &clock, 0.25, &[]);
        assert_eq!(plan.value("joy0axis1"), Ok(2.0));
        turn(&mut plan, &clock, 1.0, &[]);
        assert_eq!(read(), 3.0);

        plan.set_to_zero("joy0axis1").expect("configured");
        assert_eq!(read(), 0.0);
    }

    #[test]
    fn unconfigured_channels_are_ignored() {
        let (clock, cx) = setup();
        let mut plan = StickFilter::from_config(&cx).expect("default dt");
        plan.set_lowpass("Nx3C", 4.0, None).expect("valid");
        plan.start();
        let hat = Event::new(0.0, Input::Hat { joy: 1, hat: 0, value: 1.0 });
        assert!(!plan.feed(&hat));
        assert!(plan.feed(&Event::new(0.0, Input::Position { node: 0x3c, pos: 1.0 })));
        turn(&mut plan, &clock, 0.5, &[hat]);
        assert!(plan.is_running());

        assert_eq!(
            plan.value("joy1hat0"),
            Err(ConfigError::UnknownChannel {
                channel: "joy1hat0".into()
            })
        );
        assert!(plan.set_to_zero("joy1hat0").is_err());
        assert_eq!(
            plan.behavior().value_of(&Event::tick(0.0)),
            Err(ConfigError::NoChannel { kind: "tick" })
        );
    }

    #[test]
    fn lowpass_approaches_fed_value() {
        let (clock, cx) = setup();
        let mut plan = StickFilter::with_dt(&cx, 0.1).expect("dt ok");
        plan.set_lowpass("joy0axis0", 2.0, None).expect("valid");
        plan.start();
        turn(&mut plan, &clock, 0.0, &[Event::axis(0.0, 0, 0, 1.0)]);
        for _ in 0..50 {
            turn(&mut plan, &clock, 0.1, &[]);
        }
        let v = plan.value("joy0axis0").expect("configured");
        assert!((v - 1.0).abs() < 1e-3, "v = {v}");
    }

    #[test]
    fn replacing_a_filter_keeps_getters() {
        let (_clock, cx) = setup();
        let mut plan = StickFilter::with_dt(&cx, 0.1).expect("dt ok");
        plan.set_integrator("joy0axis0", 1.0, None, None).expect("valid");
        let read = plan.getter_of("joy0axis0").expect("configured");
        let replacement = DigitalFilter::integrator(1.0)
            .expect("valid")
            .with_state(vec![0.0], vec![7.0, 0.0])
            .expect("lengths");
        plan.set_filter("joy0axis0", replacement, None);
        assert_eq!(read(), 7.0);
    }

    #[test]
    fn pinned_time_overrides_clock() {
        let (clock, cx) = setup();
        let mut plan = StickFilter::with_dt(&cx, 0.1).expect("dt ok");
        plan.set_integrator("joy0axis0", 1.0, None, Some(0.0)).expect("valid");
        plan.behavior_mut().set_time(Some(0.3));
        plan.start();
        turn(&mut plan, &clock, 0.0, &[Event::axis(0.0, 0, 0, 1.0)]);
        turn(&mut plan, &clock, 0.1, &[]);
        turn(&mut plan, &clock, 5.0, &[]);
        assert_eq!(plan.value("joy0axis0"), Ok(3.0));
        assert_eq!(
            StickFilter::with_dt(&cx, 0.0).map(|_| ()),
            Err(ConfigError::InvalidSampleInterval { dt: 0.0 })
        );
    }
}
