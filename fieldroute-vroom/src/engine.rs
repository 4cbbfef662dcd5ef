//! [`OptimizationEngine`] backed by VROOM.

use fieldroute_core::{Engine, OptimizationEngine, OptimizationError, OptimizationState, Route};

use crate::client::{SolverTransport, VroomClient};
use crate::inbound::{apply_to_route, apply_to_state};
use crate::outbound::{translate_route, translate_state};

/// Translates states and routes to VROOM requests and back.
///
/// The transport is generic so tests can script solver answers.
#[derive(Debug)]
pub struct VroomEngine<T = VroomClient> {
    transport: T,
}

impl<T: SolverTransport> VroomEngine<T> {
    /// Engine posting through `transport`.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: SolverTransport> OptimizationEngine for VroomEngine<T> {
    fn engine(&self) -> Engine {
        Engine::Vroom
    }

    fn optimize(&self, state: &OptimizationState) -> Result<OptimizationState, OptimizationError> {
        let outbound = translate_state(state)?;
        let response = self.transport.solve(&outbound.request)?;
        apply_to_state(state, outbound.pending, response)
    }

    fn optimize_single_route(&self, route: &Route) -> Result<Route, OptimizationError> {
        let outbound = translate_route(route)?;
        let response = self.transport.solve(&outbound.request)?;
        log::debug!(
            "route {}: solver placed {} of {} jobs",
            route.id,
            response
                .routes
                .iter()
                .flat_map(|solved| &solved.steps)
                .filter(|step| step.step_type == "job")
                .count(),
            outbound.request.jobs.len()
        );
        apply_to_route(route, outbound.pending, response)
    }
}
