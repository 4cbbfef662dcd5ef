//! Validate-and-repair loop over every route of a solved run.
//!
//! Per route and per validator the loop is
//! `validate → (prepare → act → re-solve → validate)*` until the route
//! passes, the action has nothing to change or its budget runs out. None of
//! these outcomes is an error; only solver and protocol failures abort.

use std::fmt;

use fieldroute_core::{
    OptimizationEngine, OptimizationError, OptimizationState, Route, RouteId, RuleExecution,
};

use crate::ReoptimizationConfig;
use crate::action::{ActionOutcome, AttemptLedger, Reoptimizer, SkipReason};
use crate::validator::{RouteValidator, standard_validators};

/// Terminal state of one validator on one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRepairState {
    /// The route passes, possibly after repairs.
    Valid,
    /// The route still fails after every allowed attempt.
    BudgetExhausted,
    /// The route fails but the repair action has nothing to change.
    NotApplicable,
    /// The rule is disabled for this run.
    Disabled,
}

impl fmt::Display for RouteRepairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "valid",
            Self::BudgetExhausted => "budget exhausted",
            Self::NotApplicable => "not applicable",
            Self::Disabled => "disabled",
        })
    }
}

/// How one validator ended on one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Rule identifier.
    pub rule: &'static str,
    /// Whether the rule failed at least once.
    pub triggered: bool,
    /// Final state.
    pub state: RouteRepairState,
    /// Solver calls made by the rule's repair action.
    pub attempts: u32,
}

/// Outcomes for one route, in validator order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRepair {
    /// Route examined.
    pub route_id: RouteId,
    /// One entry per validator.
    pub outcomes: Vec<RuleOutcome>,
}

impl RouteRepair {
    /// Whether every enabled rule ended valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.outcomes.iter().all(|outcome| {
            matches!(
                outcome.state,
                RouteRepairState::Valid | RouteRepairState::Disabled
            )
        })
    }
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// One entry per route, in state order.
    pub routes: Vec<RouteRepair>,
}

impl RepairReport {
    /// Solver calls made across all routes.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.routes
            .iter()
            .flat_map(|route| &route.outcomes)
            .map(|outcome| outcome.attempts)
            .sum()
    }

    /// Routes that still fail some enabled rule.
    #[must_use]
    pub fn unresolved(&self) -> Vec<RouteId> {
        self.routes
            .iter()
            .filter(|route| !route.is_valid())
            .map(|route| route.route_id)
            .collect()
    }

    /// Outcome of `rule` on `route_id`.
    #[must_use]
    pub fn outcome(&self, route_id: RouteId, rule: &str) -> Option<&RuleOutcome> {
        self.routes
            .iter()
            .find(|route| route.route_id == route_id)
            .and_then(|route| route.outcomes.iter().find(|outcome| outcome.rule == rule))
    }
}

/// Runs the validators over every route and repairs failures.
pub struct ReoptimizationPipeline {
    validators: Vec<Box<dyn RouteValidator>>,
}

impl fmt::Debug for ReoptimizationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<_> = self.validators.iter().map(|validator| validator.rule()).collect();
        f.debug_struct("ReoptimizationPipeline")
            .field("validators", &rules)
            .finish()
    }
}

impl ReoptimizationPipeline {
    /// Pipeline with the standard validators.
    #[must_use]
    pub fn new(config: &ReoptimizationConfig) -> Self {
        Self::with_validators(standard_validators(config))
    }

    /// Pipeline with a custom validator list, evaluated in order.
    #[must_use]
    pub fn with_validators(validators: Vec<Box<dyn RouteValidator>>) -> Self {
        Self { validators }
    }

    /// Validate and repair every route of `state` in place.
    ///
    /// Appends one [`RuleExecution`] per validator per route to the state's
    /// audit trail.
    ///
    /// # Errors
    ///
    /// Propagates solver and protocol errors from re-solves. The state is
    /// left unchanged.
    pub fn run(
        &self,
        state: &mut OptimizationState,
        engine: &dyn OptimizationEngine,
    ) -> Result<RepairReport, OptimizationError> {
        let mut ledger = AttemptLedger::default();
        let mut report = RepairReport::default();
        let mut executions = Vec::new();
        let mut repaired = Vec::with_capacity(state.routes.len());

        for route in &state.routes {
            let (fixed, repair) = self.repair_route(route, state, engine, &mut ledger)?;
            executions.extend(repair.outcomes.iter().map(|outcome| {
                RuleExecution::new(outcome.rule, outcome.triggered, describe(outcome))
            }));
            repaired.push(fixed);
            report.routes.push(repair);
        }

        state.routes = repaired;
        for execution in executions {
            state.record_rule(execution);
        }
        Ok(report)
    }

    fn repair_route(
        &self,
        original: &Route,
        state: &OptimizationState,
        engine: &dyn OptimizationEngine,
        ledger: &mut AttemptLedger,
    ) -> Result<(Route, RouteRepair), OptimizationError> {
        let mut route = original.clone();
        let mut outcomes = Vec::with_capacity(self.validators.len());
        for validator in &self.validators {
            let rule = validator.rule();
            let outcome = if state.params.is_rule_disabled(rule) {
                log::debug!("route {}: {rule} disabled", route.id);
                RuleOutcome {
                    rule,
                    triggered: false,
                    state: RouteRepairState::Disabled,
                    attempts: 0,
                }
            } else {
                enforce(validator.as_ref(), &mut route, engine, ledger)?
            };
            outcomes.push(outcome);
        }
        let repair = RouteRepair {
            route_id: route.id,
            outcomes,
        };
        if repair.is_valid() {
            log::info!("route {} accepted", route.id);
        }
        Ok((route, repair))
    }
}

fn enforce(
    validator: &dyn RouteValidator,
    route: &mut Route,
    engine: &dyn OptimizationEngine,
    ledger: &mut AttemptLedger,
) -> Result<RuleOutcome, OptimizationError> {
    let rule = validator.rule();
    let action = validator.repair_action();
    let before = ledger.attempts(route.id, action);
    let mut triggered = false;
    let state = loop {
        if validator.validate(route) {
            log::debug!("route {}: {rule} passes", route.id);
            break RouteRepairState::Valid;
        }
        triggered = true;
        validator.prepare(route);
        match Reoptimizer::process(action, route, engine, ledger)? {
            ActionOutcome::Reoptimized(candidate) => accept_if_complete(route, candidate),
            ActionOutcome::Skipped(SkipReason::BudgetExhausted) => {
                log::warn!("route {}: {rule} still failing, {action} budget exhausted", route.id);
                break RouteRepairState::BudgetExhausted;
            }
            ActionOutcome::Skipped(SkipReason::NotApplicable) => {
                log::warn!("route {}: {rule} failing, {action} not applicable", route.id);
                break RouteRepairState::NotApplicable;
            }
        }
    };
    Ok(RuleOutcome {
        rule,
        triggered,
        state,
        attempts: ledger.attempts(route.id, action).saturating_sub(before),
    })
}

/// Keep `candidate` unless it leaves more appointments unscheduled.
fn accept_if_complete(route: &mut Route, candidate: Route) {
    if candidate.unscheduled_appointment_count() > route.unscheduled_appointment_count() {
        log::warn!(
            "route {}: re-solve dropped appointments; keeping previous schedule",
            route.id
        );
        return;
    }
    *route = candidate;
}

fn describe(outcome: &RuleOutcome) -> String {
    match (outcome.triggered, outcome.state) {
        (false, state) => state.to_string(),
        (true, state) => format!("{state} after {} repair attempt(s)", outcome.attempts),
    }
}
