//! Route mutations behind each [`ActionKind`](super::ActionKind).
//!
//! Each function returns `Ok(false)` without touching the route when it has
//! nothing to change.

use std::time::Duration;

use fieldroute_core::time::{add_duration, sub_duration};
use fieldroute_core::{OptimizationError, Route, TimeWindow, WorkEvent};

use crate::idle;

const BREAK_MARGIN: Duration = Duration::from_secs(15 * 60);
const LUNCH_MARGIN: Duration = Duration::from_secs(15 * 60);

/// First appointment may arrive any time of day; the last one must arrive
/// before midday. Locked appointments are left alone.
pub(super) fn reverse_route(route: &mut Route) -> Result<bool, OptimizationError> {
    let scheduled: Vec<(u64, TimeWindow, bool)> = route
        .chronological()
        .into_iter()
        .filter_map(WorkEvent::as_appointment)
        .filter_map(|appointment| {
            appointment
                .details
                .time_window
                .map(|window| (appointment.id, window, appointment.locked))
        })
        .collect();
    let (Some(&(first_id, first_window, first_locked)), Some(&(last_id, last_window, last_locked))) =
        (scheduled.first(), scheduled.last())
    else {
        return Ok(false);
    };
    if first_id == last_id {
        return Ok(false);
    }

    let mut changed = false;
    if !first_locked && let Some(first) = route.appointment_mut(first_id) {
        first.details.expected_arrival = Some(first_window.whole_day());
        changed = true;
    }
    if !last_locked && let Some(last) = route.appointment_mut(last_id) {
        last.details.expected_arrival =
            Some(TimeWindow::new(last_window.day_start(), last_window.midday())?);
        changed = true;
    }
    Ok(changed)
}

/// Pull the end of the working window in by half the current idle time.
/// Routes holding reserved time are externally fixed and left alone.
pub(super) fn reduce_work_time_range(route: &mut Route) -> Result<bool, OptimizationError> {
    if route.has_reserved_time() {
        return Ok(false);
    }
    let half = idle::total_gap(route) / 2;
    if half.is_zero() {
        return Ok(false);
    }
    let hours = route.working_hours();
    let end = sub_duration(hours.end(), half)?;
    if end <= hours.start() {
        return Ok(false);
    }
    log::debug!("route {}: working window now ends at {end}", route.id);
    route.set_working_hours(hours.with_end(end)?);
    Ok(true)
}

/// The first appointment must arrive between local midnight and the
/// working-hours start plus the lead travel and its own duration.
pub(super) fn limit_first_appointment_expected_arrival(
    route: &mut Route,
) -> Result<bool, OptimizationError> {
    let Some((id, window, duration, locked)) = route.first_appointment().and_then(|first| {
        first
            .details
            .time_window
            .map(|window| (first.id, window, first.details.duration, first.locked))
    }) else {
        return Ok(false);
    };
    if locked {
        return Ok(false);
    }
    let lead = idle::travel_before_first(route).saturating_add(duration);
    let latest = add_duration(route.working_hours().start(), lead)?;
    let expected = TimeWindow::new(window.day_start(), latest)?;
    let Some(first) = route.appointment_mut(id) else {
        return Ok(false);
    };
    first.details.expected_arrival = Some(expected);
    Ok(true)
}

/// Every scheduled break and lunch may only start within a margin of its
/// current midpoint.
pub(super) fn limit_break_time_frames(route: &mut Route) -> Result<bool, OptimizationError> {
    let mut changed = false;
    for event in route.events_mut() {
        let margin = match event {
            WorkEvent::WorkBreak(_) => BREAK_MARGIN,
            WorkEvent::Lunch(_) => LUNCH_MARGIN,
            _ => continue,
        };
        let Some(window) = event.time_window() else {
            continue;
        };
        let midpoint = window.midpoint();
        let expected = TimeWindow::new(
            sub_duration(midpoint, margin)?,
            add_duration(midpoint, margin)?,
        )?;
        event.details_mut().expected_arrival = Some(expected);
        changed = true;
    }
    Ok(changed)
}
