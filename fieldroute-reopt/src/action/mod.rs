//! Corrective actions applied to a single route before it is re-solved.
//!
//! Actions are stateless. The number of attempts made per route lives in
//! an [`AttemptLedger`] owned by the caller, keyed by route and action.

mod transforms;

use std::collections::BTreeMap;
use std::fmt;

use fieldroute_core::{OptimizationEngine, OptimizationError, Route, RouteId};

/// Identifies a corrective action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    /// Open the first appointment to the whole day and pull the last one
    /// before midday.
    ReverseRoute,
    /// Move the end of the working window earlier by half the idle time.
    ReduceWorkTimeRange,
    /// Bound the first appointment's arrival by the lead travel.
    LimitFirstAppointmentExpectedArrival,
    /// Pin breaks and lunches around their current midpoint.
    LimitBreakTimeFrames,
}

impl ActionKind {
    /// Every action, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::ReverseRoute,
        Self::ReduceWorkTimeRange,
        Self::LimitFirstAppointmentExpectedArrival,
        Self::LimitBreakTimeFrames,
    ];

    /// Solver calls allowed per route.
    #[must_use]
    pub const fn budget(self) -> u32 {
        match self {
            Self::ReverseRoute | Self::LimitFirstAppointmentExpectedArrival => 1,
            Self::ReduceWorkTimeRange | Self::LimitBreakTimeFrames => 2,
        }
    }

    /// Stable snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReverseRoute => "reverse_route",
            Self::ReduceWorkTimeRange => "reduce_work_time_range",
            Self::LimitFirstAppointmentExpectedArrival => {
                "limit_first_appointment_expected_arrival"
            }
            Self::LimitBreakTimeFrames => "limit_break_time_frames",
        }
    }

    /// Mutate `route` in preparation for a re-solve.
    ///
    /// Returns `false`, leaving the route untouched, when the action has
    /// nothing to change.
    fn apply(self, route: &mut Route) -> Result<bool, OptimizationError> {
        match self {
            Self::ReverseRoute => transforms::reverse_route(route),
            Self::ReduceWorkTimeRange => transforms::reduce_work_time_range(route),
            Self::LimitFirstAppointmentExpectedArrival => {
                transforms::limit_first_appointment_expected_arrival(route)
            }
            Self::LimitBreakTimeFrames => transforms::limit_break_time_frames(route),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempts made per `(route, action)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptLedger {
    attempts: BTreeMap<(RouteId, ActionKind), u32>,
}

impl AttemptLedger {
    /// Attempts recorded so far.
    #[must_use]
    pub fn attempts(&self, route_id: RouteId, kind: ActionKind) -> u32 {
        self.attempts.get(&(route_id, kind)).copied().unwrap_or(0)
    }

    /// Attempts still allowed.
    #[must_use]
    pub fn remaining(&self, route_id: RouteId, kind: ActionKind) -> u32 {
        kind.budget()
            .saturating_sub(self.attempts(route_id, kind))
    }

    /// Attempts recorded for every action on `route_id`.
    #[must_use]
    pub fn total(&self, route_id: RouteId) -> u32 {
        ActionKind::ALL
            .iter()
            .map(|&kind| self.attempts(route_id, kind))
            .sum()
    }

    fn record(&mut self, route_id: RouteId, kind: ActionKind) {
        let count = self.attempts.entry((route_id, kind)).or_insert(0);
        *count = count.saturating_add(1);
    }
}

/// Why an action did not call the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The route has used every attempt of this action.
    BudgetExhausted,
    /// The action has nothing to change on this route.
    NotApplicable,
}

/// Result of [`Reoptimizer::process`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The route was transformed and re-solved.
    Reoptimized(Route),
    /// The solver was not called.
    Skipped(SkipReason),
}

/// Applies actions and re-solves the transformed route.
#[derive(Debug)]
pub struct Reoptimizer;

impl Reoptimizer {
    /// Apply `kind` to a copy of `route` and re-solve it with `engine`.
    ///
    /// The attempt is recorded before the solver is called, so a failing
    /// call still consumes budget. `route` itself is never modified.
    ///
    /// # Errors
    ///
    /// Propagates errors from the transformation and the solver.
    pub fn process(
        kind: ActionKind,
        route: &Route,
        engine: &dyn OptimizationEngine,
        ledger: &mut AttemptLedger,
    ) -> Result<ActionOutcome, OptimizationError> {
        if ledger.remaining(route.id, kind) == 0 {
            log::debug!("route {}: {kind} budget exhausted", route.id);
            return Ok(ActionOutcome::Skipped(SkipReason::BudgetExhausted));
        }
        let mut candidate = route.clone();
        if !kind.apply(&mut candidate)? {
            log::debug!("route {}: {kind} not applicable", route.id);
            return Ok(ActionOutcome::Skipped(SkipReason::NotApplicable));
        }
        ledger.record(route.id, kind);
        log::debug!(
            "route {}: {kind} attempt {} of {}",
            route.id,
            ledger.attempts(route.id, kind),
            kind.budget()
        );
        engine
            .optimize_single_route(&candidate)
            .map(ActionOutcome::Reoptimized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroute_core::test_support::{RouteBuilder, StubEngine, appointment, window};
    use fieldroute_core::{Engine, ReservedTime, Waiting};
    use rstest::{fixture, rstest};

    #[fixture]
    fn idle_route() -> Route {
        RouteBuilder::new(3)
            .event(appointment(1, "Visit").scheduled(window("08:00", "08:30")))
            .event(Waiting::new(1, window("08:30", "10:30")))
            .event(appointment(2, "Visit").scheduled(window("10:30", "11:00")))
            .build()
    }

    #[rstest]
    #[case(ActionKind::ReverseRoute, 1)]
    #[case(ActionKind::ReduceWorkTimeRange, 2)]
    #[case(ActionKind::LimitFirstAppointmentExpectedArrival, 1)]
    #[case(ActionKind::LimitBreakTimeFrames, 2)]
    fn budgets_match_action(#[case] kind: ActionKind, #[case] budget: u32) {
        assert_eq!(kind.budget(), budget);
    }

    #[rstest]
    fn reduce_calls_the_solver_at_most_twice(idle_route: Route) {
        let engine = StubEngine::identity(Engine::Vroom);
        let mut ledger = AttemptLedger::default();
        let outcomes: Vec<_> = (0..4)
            .map(|_| {
                Reoptimizer::process(ActionKind::ReduceWorkTimeRange, &idle_route, &engine, &mut ledger)
                    .expect("stub never fails")
            })
            .collect();

        assert_eq!(engine.single_route_calls(), 2);
        assert!(matches!(outcomes.first(), Some(ActionOutcome::Reoptimized(_))));
        assert_eq!(
            outcomes.last(),
            Some(&ActionOutcome::Skipped(SkipReason::BudgetExhausted))
        );
        assert_eq!(ledger.attempts(idle_route.id, ActionKind::ReduceWorkTimeRange), 2);
    }

    #[rstest]
    fn reduce_skips_routes_with_reserved_time(idle_route: Route) {
        let mut route = idle_route;
        route.push_event(ReservedTime::new(9, "Court", window("15:00", "16:00")));
        let engine = StubEngine::identity(Engine::Vroom);
        let mut ledger = AttemptLedger::default();

        let outcome = Reoptimizer::process(ActionKind::ReduceWorkTimeRange, &route, &engine, &mut ledger)
            .expect("stub never fails");

        assert_eq!(outcome, ActionOutcome::Skipped(SkipReason::NotApplicable));
        assert_eq!(engine.single_route_calls(), 0);
        assert_eq!(ledger.total(route.id), 0);
    }

    #[rstest]
    fn ledgers_are_keyed_by_route(idle_route: Route) {
        let engine = StubEngine::identity(Engine::Vroom);
        let mut ledger = AttemptLedger::default();
        let mut other = idle_route.clone();
        other.id = RouteId::new(4);

        for route in [&idle_route, &other] {
            let outcome = Reoptimizer::process(ActionKind::ReverseRoute, route, &engine, &mut ledger)
                .expect("stub never fails");
            assert!(matches!(outcome, ActionOutcome::Reoptimized(_)));
        }

        assert_eq!(ledger.remaining(idle_route.id, ActionKind::ReverseRoute), 0);
        assert_eq!(ledger.remaining(other.id, ActionKind::ReverseRoute), 0);
        assert_eq!(ledger.remaining(other.id, ActionKind::ReduceWorkTimeRange), 2);
    }

    #[rstest]
    fn solver_failures_still_consume_budget(idle_route: Route) {
        let engine = StubEngine::with_handler(Engine::Vroom, |_| {
            Err(OptimizationError::ServiceError {
                code: 3,
                message: "routing error".to_owned(),
            })
        });
        let mut ledger = AttemptLedger::default();

        let result = Reoptimizer::process(ActionKind::ReverseRoute, &idle_route, &engine, &mut ledger);

        assert!(result.is_err());
        assert_eq!(ledger.remaining(idle_route.id, ActionKind::ReverseRoute), 0);
    }
}
