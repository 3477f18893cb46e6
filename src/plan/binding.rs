//! # Output bindings.
//!
//! A [`Setter`] is a named single-argument output: the only thing the engine
//! knows about an actuator. [`Bindings`] maps logical names to setters and is
//! fixed when a plan is built; string specs are resolved once through a
//! host-provided [`Resolve`] and never again at run time.
//!
//! ```text
//! BindingsBuilder ──bind("x", Setter)──────────────┐
//!                 ──spec("y", "Nx3C/@set_pos")──┐  │
//!                                               ▼  ▼
//!                          build(&dyn Resolve) ─► Bindings { x, y }
//!                                   │
//!                                   └─ Err(ConfigError::Unresolved) on the first miss
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{ConfigError, PlanError};

type SetFn = dyn Fn(f64) -> Result<(), PlanError>;

/// Named output callable.
#[derive(Clone)]
pub struct Setter {
    name: Arc<str>,
    f: Rc<SetFn>,
}

impl Setter {
    /// Wraps a fallible callable.
    pub fn new(
        name: impl Into<Arc<str>>,
        f: impl Fn(f64) -> Result<(), PlanError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Rc::new(f),
        }
    }

    /// Wraps a callable that cannot fail.
    pub fn infallible(name: impl Into<Arc<str>>, f: impl Fn(f64) + 'static) -> Self {
        Self::new(name, move |v| {
            f(v);
            Ok(())
        })
    }

    /// The setter's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same callable under another name.
    pub fn renamed(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            f: Rc::clone(&self.f),
        }
    }

    /// Invokes the setter. Failures are reported as [`PlanError::Setter`].
    pub fn set(&self, value: f64) -> Result<(), PlanError> {
        (self.f)(value).map_err(|e| match e {
            e @ PlanError::Setter { .. } => e,
            other => PlanError::Setter {
                name: self.name.to_string(),
                error: other.as_message(),
            },
        })
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Setter").field(&self.name).finish()
    }
}

/// Host-side resolution of a string spec into a setter.
pub trait Resolve {
    /// Returns the setter addressed by `spec`, if any.
    fn resolve(&self, spec: &str) -> Option<Setter>;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Option<Setter>,
{
    fn resolve(&self, spec: &str) -> Option<Setter> {
        self(spec)
    }
}

/// Resolver that knows nothing; every spec fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolve;

impl Resolve for NoResolve {
    fn resolve(&self, _spec: &str) -> Option<Setter> {
        None
    }
}

/// Immutable name → setter map.
#[derive(Clone, Default)]
pub struct Bindings {
    map: BTreeMap<String, Setter>,
}

impl Bindings {
    /// Starts a builder.
    pub fn builder() -> BindingsBuilder {
        BindingsBuilder::default()
    }

    /// Binds every header to the setter the resolver returns for
    /// `"<header>/@set_pos"`.
    pub fn auto<H: AsRef<str>>(headers: &[H], resolver: &dyn Resolve) -> Result<Self, ConfigError> {
        headers
            .iter()
            .fold(Bindings::builder(), |b, h| {
                let h = h.as_ref();
                b.spec(h, format!("{h}/@set_pos"))
            })
            .build(resolver)
    }

    /// Setter bound to `name`.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Setter> {
        self.map.get(name)
    }

    /// True if `name` is bound.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Number of bindings.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if nothing is bound.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Calls the setter bound to `name`.
    pub fn set(&self, name: &str, value: f64) -> Result<(), PlanError> {
        match self.map.get(name) {
            Some(s) => s.set(value),
            None => Err(PlanError::Setter {
                name: name.to_string(),
                error: "not bound".to_string(),
            }),
        }
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

/// Builder for [`Bindings`].
#[derive(Default)]
pub struct BindingsBuilder {
    direct: Vec<(String, Setter)>,
    specs: Vec<(String, String)>,
}

impl BindingsBuilder {
    /// Binds `name` to a setter directly.
    pub fn bind(mut self, name: impl Into<String>, setter: Setter) -> Self {
        self.direct.push((name.into(), setter));
        self
    }

    /// Binds a setter under its own name.
    pub fn setter(self, setter: Setter) -> Self {
        let name = setter.name().to_string();
        self.bind(name, setter)
    }

    /// Binds `name` to whatever `spec` resolves to at build time.
    pub fn spec(mut self, name: impl Into<String>, spec: impl Into<String>) -> Self {
        self.specs.push((name.into(), spec.into()));
        self
    }

    /// Resolves all specs. Later entries for the same name win.
    pub fn build(self, resolver: &dyn Resolve) -> Result<Bindings, ConfigError> {
        let mut map = BTreeMap::new();
        for (name, setter) in self.direct {
            map.insert(name, setter);
        }
        for (name, spec) in self.specs {
            match resolver.resolve(&spec) {
                Some(setter) => {
                    map.insert(name, setter);
                }
                None => return Err(ConfigError::Unresolved { name, spec }),
            }
        }
        Ok(Bindings { map })
    }
}
