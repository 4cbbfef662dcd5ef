//! Optimization engines and the registry that selects them.
//!
//! An engine adapter owns the whole round trip to its solver: translate the
//! domain model, call the solver, translate the answer back. The registry
//! is a plain ordered list looked up by [`Engine`].

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{OptimizationError, OptimizationState, Route};

/// Known solver engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Engine {
    /// The VROOM vehicle-routing service.
    Vroom,
    /// Google's route optimization service.
    Google,
}

impl Engine {
    /// Canonical upper-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vroom => "VROOM",
            Self::Google => "GOOGLE",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = OptimizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VROOM" => Ok(Self::Vroom),
            "GOOGLE" => Ok(Self::Google),
            _ => Err(OptimizationError::UnknownEngine { name: s.to_owned() }),
        }
    }
}

/// A solver adapter.
///
/// Calls block until the solver answers; implementations must be safe to
/// share between independent runs.
///
/// # Examples
///
/// ```
/// use fieldroute_core::{Engine, OptimizationEngine, OptimizationError, OptimizationState, OptimizationStatus, Route};
///
/// struct Identity;
///
/// impl OptimizationEngine for Identity {
///     fn engine(&self) -> Engine {
///         Engine::Google
///     }
///
///     fn optimize(&self, state: &OptimizationState) -> Result<OptimizationState, OptimizationError> {
///         Ok(state.derive(OptimizationStatus::Post)?)
///     }
///
///     fn optimize_single_route(&self, route: &Route) -> Result<Route, OptimizationError> {
///         Ok(route.clone())
///     }
/// }
///
/// assert_eq!(Identity.engine().to_string(), "GOOGLE");
/// ```
pub trait OptimizationEngine: Send + Sync {
    /// Engine this adapter implements.
    fn engine(&self) -> Engine;

    /// Solve a whole run, returning its POST state.
    ///
    /// # Errors
    ///
    /// Returns an [`OptimizationError`] if the solver fails or its answer
    /// cannot be reconciled with the request.
    fn optimize(&self, state: &OptimizationState) -> Result<OptimizationState, OptimizationError>;

    /// Re-solve one route in isolation.
    ///
    /// # Errors
    ///
    /// As for [`OptimizationEngine::optimize`].
    fn optimize_single_route(&self, route: &Route) -> Result<Route, OptimizationError>;
}

impl<T: OptimizationEngine + ?Sized> OptimizationEngine for &T {
    fn engine(&self) -> Engine {
        (**self).engine()
    }

    fn optimize(&self, state: &OptimizationState) -> Result<OptimizationState, OptimizationError> {
        (**self).optimize(state)
    }

    fn optimize_single_route(&self, route: &Route) -> Result<Route, OptimizationError> {
        (**self).optimize_single_route(route)
    }
}

/// Registered engine adapters.
#[derive(Default)]
pub struct EngineRegistry {
    engines: Vec<Box<dyn OptimizationEngine>>,
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.engines.iter().map(|engine| engine.engine()))
            .finish()
    }
}

impl EngineRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, builder style.
    #[must_use]
    pub fn with_engine(mut self, engine: impl OptimizationEngine + 'static) -> Self {
        self.register(engine);
        self
    }

    /// Register an adapter. Earlier registrations win lookups.
    pub fn register(&mut self, engine: impl OptimizationEngine + 'static) {
        self.engines.push(Box::new(engine));
    }

    /// The adapter for `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizationError::EngineNotRegistered`] if none matches.
    pub fn get(&self, engine: Engine) -> Result<&dyn OptimizationEngine, OptimizationError> {
        self.engines
            .iter()
            .find(|candidate| candidate.engine() == engine)
            .map(|candidate| candidate.as_ref())
            .ok_or(OptimizationError::EngineNotRegistered { engine })
    }

    /// The adapter for an engine name.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizationError::UnknownEngine`] for unknown names and
    /// [`OptimizationError::EngineNotRegistered`] for known but absent ones.
    pub fn get_by_name(&self, name: &str) -> Result<&dyn OptimizationEngine, OptimizationError> {
        self.get(name.parse()?)
    }
}
