//! Back-to-back break detection.

use fieldroute_core::{RULE_TWO_BREAKS_IN_A_ROW, Route, WorkEvent, WorkEventKind};

use super::RouteValidator;
use crate::action::ActionKind;

/// Fails when two breaks or lunches follow each other with no appointment
/// in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TwoBreaksInARow;

impl RouteValidator for TwoBreaksInARow {
    fn rule(&self) -> &'static str {
        RULE_TWO_BREAKS_IN_A_ROW
    }

    fn validate(&self, route: &Route) -> bool {
        let mut after_break = false;
        for event in scheduled_sequence(route) {
            if event.is_break() {
                if after_break {
                    return false;
                }
                after_break = true;
            } else {
                after_break = false;
            }
        }
        true
    }

    fn repair_action(&self) -> ActionKind {
        ActionKind::LimitBreakTimeFrames
    }

    fn prepare(&self, route: &mut Route) {
        annotate_min_appointments_before(route);
    }
}

/// Scheduled appointments, breaks and lunches in schedule order.
fn scheduled_sequence(route: &Route) -> impl Iterator<Item = &WorkEvent> {
    route.chronological().into_iter().filter(|event| {
        event.time_window().is_some() && (event.is_break() || event.as_appointment().is_some())
    })
}

/// Record on every scheduled break and lunch how many appointments must
/// precede it.
///
/// A break's value is the number of appointments scheduled before it. A
/// break directly following another break gets the previous break's value
/// plus one, so the solver is pushed to separate them.
pub fn annotate_min_appointments_before(route: &mut Route) {
    let mut seen: u32 = 0;
    let mut previous: Option<(u32, u32)> = None;
    let mut values: Vec<(WorkEventKind, u64, u32)> = Vec::new();
    for event in scheduled_sequence(route) {
        if event.as_appointment().is_some() {
            seen = seen.saturating_add(1);
            continue;
        }
        let Some(id) = event.id() else { continue };
        let value = match previous {
            Some((count, value)) if count == seen => value.saturating_add(1),
            _ => seen,
        };
        previous = Some((seen, value));
        values.push((event.kind(), id, value));
    }

    for event in route.events_mut() {
        let key = (event.kind(), event.id());
        if let Some(&(_, _, value)) = values
            .iter()
            .find(|(kind, id, _)| (*kind, Some(*id)) == key)
        {
            event.set_min_appointments_before(value);
        }
    }
    log::debug!("route {}: annotated {} breaks", route.id, values.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroute_core::test_support::{RouteBuilder, appointment, at};
    use fieldroute_core::{Lunch, TimeWindow, WorkBreak};
    use rstest::rstest;
    use std::time::Duration;

    const SLOT: Duration = Duration::from_secs(1800);

    /// `A` appointment, `B` work break, `L` lunch; half an hour each from
    /// 08:00.
    fn route_from(pattern: &str) -> Route {
        let mut builder = RouteBuilder::new(1);
        let mut start = at("08:00");
        for (id, code) in (1_u64..).zip(pattern.chars()) {
            let window = TimeWindow::starting_at(start, SLOT).expect("window");
            builder = match code {
                'A' => builder.event(appointment(id, "Visit").scheduled(window)),
                'B' => builder.event(WorkBreak::new(id, "Break", SLOT).scheduled(window)),
                'L' => builder.event(Lunch::new(id, "Lunch", SLOT).scheduled(window)),
                other => panic!("unknown pattern code {other}"),
            };
            start = window.end();
        }
        builder.build()
    }

    fn annotations(route: &Route) -> Vec<Option<u32>> {
        route
            .events()
            .iter()
            .filter(|event| event.is_break())
            .map(WorkEvent::min_appointments_before)
            .collect()
    }

    #[rstest]
    #[case("ABLA", false)]
    #[case("ABALA", true)]
    #[case("BLA", false)]
    #[case("BALA", true)]
    #[case("AAB", true)]
    fn detects_adjacent_breaks(#[case] pattern: &str, #[case] valid: bool) {
        assert_eq!(TwoBreaksInARow.validate(&route_from(pattern)), valid);
    }

    #[rstest]
    #[case("ABLA", vec![Some(1), Some(2)])]
    #[case("ABALA", vec![Some(1), Some(2)])]
    #[case("BLA", vec![Some(0), Some(1)])]
    #[case("ABLBA", vec![Some(1), Some(2), Some(3)])]
    fn annotates_minimum_appointments(#[case] pattern: &str, #[case] expected: Vec<Option<u32>>) {
        let mut route = route_from(pattern);

        TwoBreaksInARow.prepare(&mut route);

        assert_eq!(annotations(&route), expected);
    }

    #[rstest]
    fn unscheduled_breaks_are_ignored() {
        let mut route = route_from("AB");
        route.push_event(Lunch::new(9, "Lunch", SLOT));

        assert!(TwoBreaksInARow.validate(&route));
        annotate_min_appointments_before(&mut route);
        assert_eq!(annotations(&route), vec![Some(1), None]);
    }
}
