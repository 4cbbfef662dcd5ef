//! Predicates flagging undesirable schedules on a solved route.
//!
//! Validators run in a fixed order because a repair made for an earlier
//! rule changes what later rules observe.

mod breaks;
mod inactivity;

use fieldroute_core::Route;

use crate::ReoptimizationConfig;
use crate::action::ActionKind;

pub use breaks::{TwoBreaksInARow, annotate_min_appointments_before};
pub use inactivity::{AverageInactivity, InactivityBeforeFirstAppointment, LongInactivity};

/// A rule checked after every solve of a route.
pub trait RouteValidator: Send + Sync {
    /// Identifier used in audit entries and to disable the rule.
    fn rule(&self) -> &'static str;

    /// `true` when the route is acceptable.
    fn validate(&self, route: &Route) -> bool;

    /// Action that repairs a failing route.
    fn repair_action(&self) -> ActionKind;

    /// Annotate a failing route before its repair action runs.
    fn prepare(&self, _route: &mut Route) {}
}

/// The four standard validators in evaluation order.
#[must_use]
pub fn standard_validators(config: &ReoptimizationConfig) -> Vec<Box<dyn RouteValidator>> {
    vec![
        Box::new(LongInactivity::new(config.long_inactivity)),
        Box::new(AverageInactivity::new(config.average_inactivity)),
        Box::new(InactivityBeforeFirstAppointment::new(
            config.inactivity_before_first_appointment,
        )),
        Box::new(TwoBreaksInARow),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroute_core::{
        RULE_AVERAGE_INACTIVITY, RULE_INACTIVITY_BEFORE_FIRST_APPOINTMENT, RULE_LONG_INACTIVITY,
        RULE_TWO_BREAKS_IN_A_ROW,
    };
    use rstest::rstest;

    #[rstest]
    fn standard_order_is_fixed() {
        let validators = standard_validators(&ReoptimizationConfig::default());
        let plan: Vec<_> = validators
            .iter()
            .map(|validator| (validator.rule(), validator.repair_action()))
            .collect();
        assert_eq!(
            plan,
            vec![
                (RULE_LONG_INACTIVITY, ActionKind::ReverseRoute),
                (RULE_AVERAGE_INACTIVITY, ActionKind::ReduceWorkTimeRange),
                (
                    RULE_INACTIVITY_BEFORE_FIRST_APPOINTMENT,
                    ActionKind::LimitFirstAppointmentExpectedArrival
                ),
                (RULE_TWO_BREAKS_IN_A_ROW, ActionKind::LimitBreakTimeFrames),
            ]
        );
    }
}
