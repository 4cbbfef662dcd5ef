//! Idle and travel measurements over a solved route.

use std::time::Duration;

use fieldroute_core::{Route, Timestamp, WorkEventKind};

/// Instant the technician leaves the start location, falling back to the
/// working-hours start when the route has no start marker.
pub(crate) fn route_start(route: &Route) -> Timestamp {
    route
        .start_location()
        .and_then(|start| start.details.time_window)
        .map_or_else(|| route.working_hours().start(), |window| window.start())
}

/// Idle periods from the route start onwards, in schedule order.
pub(crate) fn idle_gaps(route: &Route) -> Vec<Duration> {
    let start = route_start(route);
    route
        .chronological()
        .into_iter()
        .filter_map(|event| {
            let window = event.time_window()?;
            (event.kind() == WorkEventKind::Waiting && window.start() >= start)
                .then(|| window.duration())
        })
        .collect()
}

/// Sum of the route's idle gaps.
pub(crate) fn total_gap(route: &Route) -> Duration {
    idle_gaps(route)
        .into_iter()
        .fold(Duration::ZERO, Duration::saturating_add)
}

/// Idle time between the working-hours start and the first scheduled
/// appointment.
///
/// Waiting before the start marker counts: a solver that delays the
/// departure reports the late start as lead waiting.
pub(crate) fn idle_before_first(route: &Route) -> Duration {
    let Some(first) = first_start(route) else {
        return Duration::ZERO;
    };
    let opening = route.working_hours().start();
    route
        .waitings()
        .filter_map(|waiting| waiting.details.time_window)
        .filter(|window| window.start() >= opening && window.end() <= first)
        .map(|window| window.duration())
        .fold(Duration::ZERO, Duration::saturating_add)
}

/// Travel time before the first scheduled appointment.
pub(crate) fn travel_before_first(route: &Route) -> Duration {
    let Some(first) = first_start(route) else {
        return Duration::ZERO;
    };
    route
        .travels()
        .filter_map(|travel| travel.details.time_window)
        .filter(|window| window.end() <= first)
        .map(|window| window.duration())
        .fold(Duration::ZERO, Duration::saturating_add)
}

fn first_start(route: &Route) -> Option<Timestamp> {
    route
        .first_appointment()
        .and_then(|first| first.details.time_window)
        .map(|window| window.start())
}
