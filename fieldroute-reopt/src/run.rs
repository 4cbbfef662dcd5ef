//! Whole-run orchestration: solve, repair, derive.

use fieldroute_core::{EngineRegistry, OptimizationError, OptimizationState, OptimizationStatus};

use crate::{ReoptimizationConfig, ReoptimizationPipeline, RepairReport};

/// Final state of a run and what the repair pipeline did to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// POST state, or SIMULATION state for simulation runs.
    pub state: OptimizationState,
    /// Repair summary; empty when the run built a plan.
    pub report: RepairReport,
}

/// Solve `pre` with its registered engine and repair the result.
///
/// Plan-building runs skip the repair pipeline. Simulation runs end in a
/// SIMULATION state that keeps the POST state's audit trail.
///
/// # Errors
///
/// Returns [`OptimizationError::EngineNotRegistered`] when `pre.engine` has
/// no adapter, [`OptimizationError::StateTransition`] when `pre` is not a
/// PRE or PLAN state, and any solver or protocol error from the engine.
///
/// # Examples
///
/// ```
/// use fieldroute_core::test_support::{office, window};
/// use fieldroute_core::{Engine, EngineRegistry, OptimizationError, OptimizationParams, OptimizationState};
/// use fieldroute_reopt::{ReoptimizationConfig, optimize_and_repair};
///
/// let pre = OptimizationState::new(
///     Engine::Vroom,
///     office(),
///     window("08:00", "17:00"),
///     OptimizationParams::default(),
/// );
/// let err = optimize_and_repair(&pre, &EngineRegistry::new(), &ReoptimizationConfig::default())
///     .expect_err("nothing registered");
/// assert_eq!(err, OptimizationError::EngineNotRegistered { engine: Engine::Vroom });
/// ```
pub fn optimize_and_repair(
    pre: &OptimizationState,
    registry: &EngineRegistry,
    config: &ReoptimizationConfig,
) -> Result<RunOutcome, OptimizationError> {
    let engine = registry.get(pre.engine)?;
    log::debug!(
        "optimizing {} routes for office {} with {}",
        pre.routes.len(),
        pre.office.id,
        pre.engine
    );
    let mut post = engine.optimize(pre)?;

    let report = if pre.params.build_plan {
        log::debug!("plan-building run; skipping repairs");
        RepairReport::default()
    } else {
        ReoptimizationPipeline::new(config).run(&mut post, engine)?
    };

    if !post.params.simulation_run {
        return Ok(RunOutcome {
            state: post,
            report,
        });
    }
    let mut simulation = post.derive(OptimizationStatus::Simulation)?;
    simulation.rule_executions = post.rule_executions;
    Ok(RunOutcome {
        state: simulation,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroute_core::test_support::{RouteBuilder, StubEngine, appointment, office, window};
    use fieldroute_core::{Engine, OptimizationEngine, OptimizationParams, Waiting};
    use rstest::{fixture, rstest};

    #[fixture]
    fn pre() -> OptimizationState {
        let mut state = OptimizationState::new(
            Engine::Vroom,
            office(),
            window("08:00", "17:00"),
            OptimizationParams::default(),
        )
        .with_id(7);
        state.routes.push(
            RouteBuilder::new(1)
                .event(appointment(1, "Visit").scheduled(window("08:00", "08:30")))
                .event(Waiting::new(1, window("08:30", "10:30")))
                .event(appointment(2, "Visit").scheduled(window("10:30", "11:00")))
                .build(),
        );
        state
    }

    fn registry() -> EngineRegistry {
        EngineRegistry::new().with_engine(StubEngine::identity(Engine::Vroom))
    }

    #[rstest]
    fn regular_runs_are_repaired(pre: OptimizationState) {
        let outcome = optimize_and_repair(&pre, &registry(), &ReoptimizationConfig::default())
            .expect("stub never fails");

        assert_eq!(outcome.state.status(), OptimizationStatus::Post);
        assert_eq!(outcome.state.previous_state_id(), Some(7));
        assert_eq!(outcome.report.routes.len(), 1);
        assert_eq!(outcome.state.rule_executions.len(), 4);
    }

    #[rstest]
    fn plan_runs_skip_repairs(mut pre: OptimizationState) {
        pre.params.build_plan = true;
        let engine = StubEngine::identity(Engine::Vroom);

        let post = engine.optimize(&pre).expect("stub never fails");
        let outcome = optimize_and_repair(&pre, &registry(), &ReoptimizationConfig::default())
            .expect("stub never fails");

        assert!(outcome.report.routes.is_empty());
        assert!(outcome.state.rule_executions.is_empty());
        assert_eq!(outcome.state.routes, post.routes);
    }

    #[rstest]
    fn simulation_runs_keep_the_audit_trail(mut pre: OptimizationState) {
        pre.params.simulation_run = true;

        let outcome = optimize_and_repair(&pre, &registry(), &ReoptimizationConfig::default())
            .expect("stub never fails");

        assert_eq!(outcome.state.status(), OptimizationStatus::Simulation);
        assert_eq!(outcome.state.rule_executions.len(), 4);
    }

    #[rstest]
    fn missing_engines_are_configuration_errors(mut pre: OptimizationState) {
        pre.engine = Engine::Google;

        let err = optimize_and_repair(&pre, &registry(), &ReoptimizationConfig::default())
            .expect_err("google is not registered");

        assert_eq!(
            err,
            OptimizationError::EngineNotRegistered {
                engine: Engine::Google
            }
        );
    }
}
