//! # Host context shared by every plan.
//!
//! [`Context`] replaces a process-wide application object: each plan holds a
//! clone, and through it reads the clock, publishes notices, reads the
//! [`Config`] and hands every started plan to the host.
//!
//! ## Architecture
//! ```text
//!            ┌──────────── Context (Rc, cheap to clone) ────────────┐
//!            │  clock: Rc<dyn Clock>   bus: Bus   config: Config    │
//!            │  launched: RefCell<Vec<PlanRef>>                     │
//!            └──────┬──────────────────┬─────────────────┬──────────┘
//!                   │                  │                 │
//!             Plan::step()       Plan::start()       Host::turn()
//!             now(), debugs()    register(plan)      take_launched()
//! ```
//!
//! ## Rules
//! - A context is single-threaded (`!Send`); plans live on one thread.
//! - Every successful `start()` of a shared plan registers it here; the host
//!   adopts it on its next turn, whoever started it.
//! - The queue holds each plan at most once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, Topic};
use crate::notices::{Bus, Notice};
use crate::plan::PlanRef;

static PLAN_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique plan identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlanId(u64);

impl PlanId {
    /// Allocates the next identifier.
    pub(crate) fn next() -> Self {
        PlanId(PLAN_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Numeric value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Inner {
    clock: Rc<dyn Clock>,
    bus: Bus,
    config: Config,
    launched: RefCell<Vec<PlanRef>>,
}

/// Explicit host context held by every plan.
#[derive(Clone)]
pub struct Context {
    inner: Rc<Inner>,
}

impl Context {
    /// Creates a context with a fresh notice bus sized from `config`.
    pub fn new(clock: Rc<dyn Clock>, config: Config) -> Self {
        let bus = Bus::new(config.bus_capacity_clamped());
        Self::with_bus(clock, config, bus)
    }

    /// Creates a context publishing to an existing bus.
    pub fn with_bus(clock: Rc<dyn Clock>, config: Config, bus: Bus) -> Self {
        Self {
            inner: Rc::new(Inner {
                clock,
                bus,
                config,
                launched: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Context on a [`SystemClock`] with default configuration.
    pub fn system() -> Self {
        Self::new(Rc::new(SystemClock::new()), Config::default())
    }

    /// Current host time in seconds.
    #[inline]
    pub fn now(&self) -> f64 {
        self.inner.clock.now()
    }

    /// The notice bus.
    #[inline]
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// The runtime configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// True if verbose output for `topic` is enabled.
    #[inline]
    pub fn debugs(&self, topic: Topic) -> bool {
        self.inner.config.debugs(topic)
    }

    /// Publishes a notice on the bus.
    #[inline]
    pub fn publish(&self, notice: Notice) {
        self.inner.bus.publish(notice);
    }

    /// Starts `plan` and queues it for adoption by the host.
    ///
    /// A plan that is already running is still queued; the host ignores
    /// plans it already holds.
    pub fn launch(&self, plan: PlanRef) {
        match plan.try_borrow_mut() {
            Ok(mut p) => p.start(),
            Err(_) => {
                tracing::warn!(target: "planvisor::host", "launch: plan is busy, not started");
                return;
            }
        }
        self.register(plan);
    }

    /// Queues a started plan for adoption by the host.
    ///
    /// Called by `Plan::start`; the plan may be mutably borrowed meanwhile.
    pub(crate) fn register(&self, plan: PlanRef) {
        let mut queue = self.inner.launched.borrow_mut();
        if !queue.iter().any(|q| same_plan(q, &plan)) {
            queue.push(plan);
        }
    }

    /// Drains the launch queue.
    pub fn take_launched(&self) -> Vec<PlanRef> {
        std::mem::take(&mut *self.inner.launched.borrow_mut())
    }

    /// Number of launched plans not yet adopted.
    pub(crate) fn pending_launches(&self) -> usize {
        self.inner.launched.borrow().len()
    }

    /// True if both handles refer to the same context.
    #[inline]
    pub fn same(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// True if both handles point at the same plan.
#[inline]
pub(crate) fn same_plan(a: &PlanRef, b: &PlanRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("now", &self.now())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
