//! One optimization attempt for one office and one service date.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Engine, Office, PriorityConfig, Route, RouteId, TimeWindow, WorkEvent};

/// Where a state sits in the optimization lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OptimizationStatus {
    /// Input assembled from the business system.
    Pre,
    /// Input for a plan-building run.
    Plan,
    /// Solved output.
    Post,
    /// Solved output of a simulation run.
    Simulation,
}

impl fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pre => "PRE",
            Self::Plan => "PLAN",
            Self::Post => "POST",
            Self::Simulation => "SIMULATION",
        })
    }
}

/// Errors returned by [`OptimizationState::derive`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateTransitionError {
    /// The lifecycle has no edge between the two statuses.
    #[error("cannot derive a {to} state from a {from} state")]
    Unsupported {
        /// Status of the parent state.
        from: OptimizationStatus,
        /// Requested status.
        to: OptimizationStatus,
    },
    /// A simulation state was requested for a non-simulation run.
    #[error("simulation states can only be derived from simulation runs")]
    NotSimulationRun,
}

/// Identifier of a validator that an office may disable.
pub const RULE_LONG_INACTIVITY: &str = "long_inactivity";
/// Identifier of the average idle-time validator.
pub const RULE_AVERAGE_INACTIVITY: &str = "average_inactivity";
/// Identifier of the idle-before-first-appointment validator.
pub const RULE_INACTIVITY_BEFORE_FIRST_APPOINTMENT: &str = "inactivity_before_first_appointment";
/// Identifier of the back-to-back breaks validator.
pub const RULE_TWO_BREAKS_IN_A_ROW: &str = "two_breaks_in_a_row";

/// Flags controlling a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptimizationParams {
    /// The output is a what-if simulation.
    pub simulation_run: bool,
    /// The run builds an initial plan; repairs are skipped.
    pub build_plan: bool,
    /// Final run for the date.
    pub last_run: bool,
    /// Rule identifiers the repair pipeline must skip.
    pub disabled_rules: BTreeSet<String>,
}

impl OptimizationParams {
    /// Whether `rule` is disabled for this run.
    #[must_use]
    pub fn is_rule_disabled(&self, rule: &str) -> bool {
        self.disabled_rules.contains(rule)
    }
}

/// Weather at the office on the service date.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeatherInfo {
    /// Forecast temperature.
    pub temperature_celsius: f64,
    /// Short forecast label.
    pub condition: String,
    /// Whether outdoor work is likely to be disrupted.
    pub is_inclement: bool,
}

/// One rule evaluation recorded for auditing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleExecution {
    /// Rule identifier.
    pub rule: String,
    /// Whether the rule fired.
    pub triggered: bool,
    /// What happened.
    pub description: String,
}

impl RuleExecution {
    /// Build an audit entry.
    pub fn new(rule: impl Into<String>, triggered: bool, description: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            triggered,
            description: description.into(),
        }
    }
}

/// One optimization attempt.
///
/// States are created as [`OptimizationStatus::Pre`] and move forward only
/// through [`OptimizationState::derive`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationState {
    #[cfg_attr(feature = "serde", serde(default))]
    id: Option<u64>,
    status: OptimizationStatus,
    created_at: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default))]
    previous_state_id: Option<u64>,
    /// Solver used for the run.
    pub engine: Engine,
    /// Office being optimized.
    pub office: Office,
    /// Window the run covers.
    pub time_window: TimeWindow,
    /// Run flags.
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: OptimizationParams,
    /// Routes in upstream order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub routes: Vec<Route>,
    /// Work no route could take.
    #[cfg_attr(feature = "serde", serde(default))]
    pub unassigned: Vec<WorkEvent>,
    /// Weather context.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weather: Option<WeatherInfo>,
    /// Rule evaluations in the order they ran.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rule_executions: Vec<RuleExecution>,
}

impl OptimizationState {
    /// A fresh, unpersisted PRE state.
    #[must_use]
    pub fn new(
        engine: Engine,
        office: Office,
        time_window: TimeWindow,
        params: OptimizationParams,
    ) -> Self {
        Self {
            id: None,
            status: OptimizationStatus::Pre,
            created_at: Utc::now(),
            previous_state_id: None,
            engine,
            office,
            time_window,
            params,
            routes: Vec::new(),
            unassigned: Vec::new(),
            weather: None,
            rule_executions: Vec::new(),
        }
    }

    /// Set the persisted id, builder style.
    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Persisted id, if any.
    #[must_use]
    pub const fn id(&self) -> Option<u64> {
        self.id
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> OptimizationStatus {
        self.status
    }

    /// When the state was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The state this one was derived from.
    #[must_use]
    pub const fn previous_state_id(&self) -> Option<u64> {
        self.previous_state_id
    }

    /// Clone this state into the next lifecycle status.
    ///
    /// PRE and PLAN derive POST; POST derives SIMULATION only for
    /// simulation runs. The child keeps routes, unassigned work, params and
    /// weather, links back to this state and starts a fresh audit trail.
    ///
    /// # Errors
    ///
    /// Returns [`StateTransitionError`] for any other transition.
    pub fn derive(&self, status: OptimizationStatus) -> Result<Self, StateTransitionError> {
        match (self.status, status) {
            (OptimizationStatus::Pre | OptimizationStatus::Plan, OptimizationStatus::Post) => {}
            (OptimizationStatus::Post, OptimizationStatus::Simulation) => {
                if !self.params.simulation_run {
                    return Err(StateTransitionError::NotSimulationRun);
                }
            }
            (from, to) => return Err(StateTransitionError::Unsupported { from, to }),
        }
        log::debug!(
            "deriving {status} state from {} state {:?} for office {}",
            self.status,
            self.id,
            self.office.id
        );
        Ok(Self {
            id: None,
            status,
            created_at: Utc::now(),
            previous_state_id: self.id,
            engine: self.engine,
            office: self.office.clone(),
            time_window: self.time_window,
            params: self.params.clone(),
            routes: self.routes.clone(),
            unassigned: self.unassigned.clone(),
            weather: self.weather.clone(),
            rule_executions: Vec::new(),
        })
    }

    /// Look up a route by id.
    #[must_use]
    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.iter().find(|route| route.id == id)
    }

    /// Look up a route by id for mutation.
    pub fn route_mut(&mut self, id: RouteId) -> Option<&mut Route> {
        self.routes.iter_mut().find(|route| route.id == id)
    }

    /// Append an audit entry.
    pub fn record_rule(&mut self, execution: RuleExecution) {
        self.rule_executions.push(execution);
    }

    /// Reclassify every appointment, routed or unassigned.
    pub fn reclassify_appointments(&mut self, config: &PriorityConfig) {
        let routed = self.routes.iter_mut().flat_map(|route| route.events_mut().iter_mut());
        routed
            .chain(self.unassigned.iter_mut())
            .filter_map(WorkEvent::as_appointment_mut)
            .for_each(|appointment| appointment.reclassify(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{appointment, office, window};
    use rstest::{fixture, rstest};

    #[fixture]
    fn pre() -> OptimizationState {
        OptimizationState::new(
            Engine::Vroom,
            office(),
            window("00:00", "23:59"),
            OptimizationParams::default(),
        )
        .with_id(41)
    }

    #[rstest]
    fn pre_derives_post_with_lineage(pre: OptimizationState) {
        let mut parent = pre;
        parent.record_rule(RuleExecution::new("x", true, "fired"));
        let post = parent.derive(OptimizationStatus::Post).expect("valid transition");
        assert_eq!(post.status(), OptimizationStatus::Post);
        assert_eq!(post.previous_state_id(), Some(41));
        assert_eq!(post.id(), None);
        assert!(post.rule_executions.is_empty());
    }

    #[rstest]
    #[case(OptimizationStatus::Pre)]
    #[case(OptimizationStatus::Simulation)]
    fn pre_rejects_other_targets(pre: OptimizationState, #[case] target: OptimizationStatus) {
        let err = pre.derive(target).expect_err("invalid transition");
        assert_eq!(
            err,
            StateTransitionError::Unsupported {
                from: OptimizationStatus::Pre,
                to: target
            }
        );
    }

    #[rstest]
    fn simulation_requires_flag(pre: OptimizationState) {
        let post = pre.derive(OptimizationStatus::Post).expect("valid transition");
        assert_eq!(
            post.derive(OptimizationStatus::Simulation),
            Err(StateTransitionError::NotSimulationRun)
        );

        let mut flagged = post;
        flagged.params.simulation_run = true;
        let simulation = flagged
            .derive(OptimizationStatus::Simulation)
            .expect("simulation run");
        assert_eq!(simulation.status(), OptimizationStatus::Simulation);
    }

    #[rstest]
    fn reclassify_touches_unassigned(pre: OptimizationState) {
        let mut state = pre;
        state.unassigned.push(appointment(5, "Initial").into());
        let config = PriorityConfig {
            initial: 77,
            ..PriorityConfig::default()
        };
        state.reclassify_appointments(&config);
        let priority = state
            .unassigned
            .first()
            .and_then(WorkEvent::as_appointment)
            .map(|appointment| appointment.priority());
        assert_eq!(priority, Some(77));
    }
}
