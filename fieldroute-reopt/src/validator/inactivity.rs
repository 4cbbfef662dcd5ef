//! Idle-time rules.

use std::time::Duration;

use fieldroute_core::{
    RULE_AVERAGE_INACTIVITY, RULE_INACTIVITY_BEFORE_FIRST_APPOINTMENT, RULE_LONG_INACTIVITY,
    Route,
};

use super::RouteValidator;
use crate::action::ActionKind;
use crate::idle;

/// Fails when any single idle gap exceeds a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongInactivity {
    limit: Duration,
}

impl LongInactivity {
    /// Rule with ceiling `limit`.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl RouteValidator for LongInactivity {
    fn rule(&self) -> &'static str {
        RULE_LONG_INACTIVITY
    }

    fn validate(&self, route: &Route) -> bool {
        idle::idle_gaps(route).iter().all(|gap| *gap <= self.limit)
    }

    fn repair_action(&self) -> ActionKind {
        ActionKind::ReverseRoute
    }
}

/// Fails when the mean idle gap exceeds a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageInactivity {
    limit: Duration,
}

impl AverageInactivity {
    /// Rule with ceiling `limit`.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl RouteValidator for AverageInactivity {
    fn rule(&self) -> &'static str {
        RULE_AVERAGE_INACTIVITY
    }

    fn validate(&self, route: &Route) -> bool {
        let gaps = idle::idle_gaps(route);
        let total = gaps.iter().fold(Duration::ZERO, |sum, gap| sum.saturating_add(*gap));
        let count = u32::try_from(gaps.len()).unwrap_or(u32::MAX);
        // mean <= limit, without dividing
        self.limit
            .checked_mul(count)
            .is_none_or(|allowance| total <= allowance)
    }

    fn repair_action(&self) -> ActionKind {
        ActionKind::ReduceWorkTimeRange
    }
}

/// Fails when the technician idles too long before the first appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityBeforeFirstAppointment {
    limit: Duration,
}

impl InactivityBeforeFirstAppointment {
    /// Rule with ceiling `limit`.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl RouteValidator for InactivityBeforeFirstAppointment {
    fn rule(&self) -> &'static str {
        RULE_INACTIVITY_BEFORE_FIRST_APPOINTMENT
    }

    fn validate(&self, route: &Route) -> bool {
        idle::idle_before_first(route) <= self.limit
    }

    fn repair_action(&self) -> ActionKind {
        ActionKind::LimitFirstAppointmentExpectedArrival
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroute_core::test_support::{HOME, RouteBuilder, appointment, at, window};
    use fieldroute_core::{Distance, StartLocation, Travel, Waiting};
    use rstest::{fixture, rstest};

    const HALF_HOUR: Duration = Duration::from_secs(1800);

    /// Idle gaps of 20 and 70 minutes.
    #[fixture]
    fn uneven_route() -> Route {
        RouteBuilder::new(1)
            .event(Waiting::new(1, window("08:00", "08:20")))
            .event(appointment(1, "Visit").scheduled(window("08:20", "08:50")))
            .event(Waiting::new(2, window("08:50", "10:00")))
            .event(appointment(2, "Visit").scheduled(window("10:00", "10:30")))
            .build()
    }

    #[rstest]
    #[case(60, false)]
    #[case(70, true)]
    #[case(90, true)]
    fn long_inactivity_checks_the_longest_gap(
        uneven_route: Route,
        #[case] minutes: u64,
        #[case] valid: bool,
    ) {
        let rule = LongInactivity::new(Duration::from_secs(minutes * 60));
        assert_eq!(rule.validate(&uneven_route), valid);
    }

    #[rstest]
    #[case(44, false)]
    #[case(45, true)]
    fn average_inactivity_checks_the_mean(
        uneven_route: Route,
        #[case] minutes: u64,
        #[case] valid: bool,
    ) {
        let rule = AverageInactivity::new(Duration::from_secs(minutes * 60));
        assert_eq!(rule.validate(&uneven_route), valid);
    }

    #[rstest]
    fn average_inactivity_accepts_routes_without_gaps() {
        let route = RouteBuilder::new(1)
            .event(appointment(1, "Visit").scheduled(window("08:00", "08:30")))
            .build();
        assert!(AverageInactivity::new(Duration::ZERO).validate(&route));
    }

    #[rstest]
    #[case(HALF_HOUR, true)]
    #[case(Duration::from_secs(10 * 60), false)]
    fn idle_before_first_appointment(
        uneven_route: Route,
        #[case] limit: Duration,
        #[case] valid: bool,
    ) {
        let rule = InactivityBeforeFirstAppointment::new(limit);
        assert_eq!(rule.validate(&uneven_route), valid);
    }

    #[rstest]
    fn late_departure_counts_towards_idle_before_first_appointment() {
        let route = RouteBuilder::new(1)
            .event(Waiting::new(1, window("08:00", "09:30")))
            .event(StartLocation::new(HOME, at("09:30")))
            .event(Travel::new(1, window("09:30", "09:45"), Distance::from_meters(7_500)))
            .event(appointment(1, "Visit").scheduled(window("09:45", "10:15")))
            .build();

        assert!(!InactivityBeforeFirstAppointment::new(HALF_HOUR).validate(&route));
        assert!(LongInactivity::new(HALF_HOUR).validate(&route));
    }
}
