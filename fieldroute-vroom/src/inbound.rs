//! Solver response to domain model.
//!
//! The solver reports, per vehicle, an ordered list of steps with arrival
//! instants, service seconds, idle seconds and cumulative travel. Jobs and
//! breaks are matched back to the events that were sent; travel and idle
//! time are synthesised from the differences between consecutive steps.
//!
//! Arrival instants are epoch seconds and are expressed in the offset of
//! the route's working hours. Step locations are `[longitude, latitude]`.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use fieldroute_core::time::sub_duration;
use fieldroute_core::{
    Coordinate, Distance, EndLocation, OptimizationError, OptimizationState, OptimizationStatus,
    Route, RouteGeometry, RouteId, StartLocation, TimeWindow, Timestamp, Travel, Waiting, WorkEvent,
};

use crate::pending::PendingEvents;
use crate::wire::{ResponseRoute, Step, UnassignedJob, VroomResponse};

/// Build the POST state for `pre` from a whole-run response.
///
/// Routes the solver did not use keep only their breaks. Unassigned jobs
/// are collected on the state.
///
/// # Errors
///
/// Returns a protocol error when the response references unknown vehicles,
/// jobs or breaks, repeats an unassigned id, uses an unknown step type or
/// leaves a job unaccounted for.
pub fn apply_to_state(
    pre: &OptimizationState,
    mut pending: PendingEvents,
    response: VroomResponse,
) -> Result<OptimizationState, OptimizationError> {
    let mut post = pre.derive(OptimizationStatus::Post)?;
    let mut solved = index_routes(response.routes, post.routes.iter().map(|route| route.id.get()))?;
    for route in &mut post.routes {
        let vehicle = route.id.get();
        route.clear_events();
        route.geometry = None;
        match solved.remove(&vehicle) {
            Some(solution) => rebuild_route(route, &solution, &mut pending)?,
            None => {
                log::debug!("route {} unused by the solver; keeping its breaks", route.id);
                route.set_events(pending.drain_breaks(vehicle));
            }
        }
    }
    post.unassigned = take_unassigned(&response.unassigned, &mut pending)?;
    pending.ensure_accounted(None)?;
    log::debug!(
        "solved office {}: {} routes, {} unassigned",
        post.office.id,
        post.routes.len(),
        post.unassigned.len()
    );
    Ok(post)
}

/// Rebuild `route` from a single-route response.
///
/// Jobs the solver could not place stay on the route without a window.
///
/// # Errors
///
/// As for [`apply_to_state`].
pub fn apply_to_route(
    route: &Route,
    mut pending: PendingEvents,
    response: VroomResponse,
) -> Result<Route, OptimizationError> {
    let vehicle = route.id.get();
    let mut solved = index_routes(response.routes, std::iter::once(vehicle))?;
    let mut rebuilt = route.clone();
    rebuilt.clear_events();
    rebuilt.geometry = None;
    match solved.remove(&vehicle) {
        Some(solution) => rebuild_route(&mut rebuilt, &solution, &mut pending)?,
        None => rebuilt.set_events(pending.drain_breaks(vehicle)),
    }
    for event in take_unassigned(&response.unassigned, &mut pending)? {
        rebuilt.push_event(event);
    }
    pending.ensure_accounted(Some(route.id))?;
    Ok(rebuilt)
}

fn index_routes(
    routes: Vec<ResponseRoute>,
    known: impl Iterator<Item = u64>,
) -> Result<BTreeMap<u64, ResponseRoute>, OptimizationError> {
    let known: BTreeSet<u64> = known.collect();
    let mut solved = BTreeMap::new();
    for solution in routes {
        let vehicle = solution.vehicle;
        if !known.contains(&vehicle) || solved.contains_key(&vehicle) {
            return Err(OptimizationError::UnknownVehicle { vehicle });
        }
        solved.insert(vehicle, solution);
    }
    Ok(solved)
}

fn take_unassigned(
    unassigned: &[UnassignedJob],
    pending: &mut PendingEvents,
) -> Result<Vec<WorkEvent>, OptimizationError> {
    unassigned
        .iter()
        .map(|job| {
            let mut event = pending.take_unassigned(job.id)?;
            let details = event.details_mut();
            details.time_window = None;
            details.route_id = None;
            Ok(event)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Start,
    Job,
    Break,
    End,
}

impl StepKind {
    fn parse(step: &Step) -> Result<Self, OptimizationError> {
        match step.step_type.as_str() {
            "start" => Ok(Self::Start),
            "job" => Ok(Self::Job),
            "break" => Ok(Self::Break),
            "end" => Ok(Self::End),
            other => Err(OptimizationError::UnknownStepType {
                step_type: other.to_owned(),
            }),
        }
    }
}

/// Sequential ids for synthesised events, restarting at 1 per route.
#[derive(Debug)]
struct Counters {
    travel: u64,
    waiting: u64,
}

impl Counters {
    const fn new() -> Self {
        Self {
            travel: 0,
            waiting: 0,
        }
    }

    const fn next_travel(&mut self) -> u64 {
        self.travel += 1;
        self.travel
    }

    const fn next_waiting(&mut self) -> u64 {
        self.waiting += 1;
        self.waiting
    }
}

fn rebuild_route(
    route: &mut Route,
    solution: &ResponseRoute,
    pending: &mut PendingEvents,
) -> Result<(), OptimizationError> {
    let hours = route.working_hours();
    let offset = *hours.start().offset();
    let vehicle = route.id.get();
    let mut counters = Counters::new();
    let mut previous: Option<&Step> = None;

    for step in &solution.steps {
        let kind = StepKind::parse(step)?;
        let arrival = timestamp(step.arrival, offset)?;

        if kind == StepKind::Start && hours.start() < arrival {
            let lead = TimeWindow::new(hours.start(), arrival)?;
            route.push_event(Waiting::new(counters.next_waiting(), lead));
        }
        if let Some(before) = previous
            && let Some(travel) = travel_between(route, before, step, arrival, &mut counters)?
        {
            route.push_event(travel);
        }

        let service = TimeWindow::starting_at(
            arrival,
            Duration::from_secs(step.setup.saturating_add(step.service)),
        )?;
        let location = step.location.map(Coordinate::from_lon_lat);
        match kind {
            StepKind::Start => route.push_event(StartLocation::new(
                location.unwrap_or(route.service_pro.start_location),
                arrival,
            )),
            StepKind::End => route.push_event(EndLocation::new(
                location.unwrap_or(route.service_pro.end_location),
                arrival,
            )),
            StepKind::Job => {
                let id = step_id(route.id, step, "job")?;
                let mut event = pending.take_job(id)?;
                event.details_mut().time_window = Some(service);
                route.push_event(event);
            }
            StepKind::Break => {
                let id = step_id(route.id, step, "break")?;
                let mut event = pending.take_break(vehicle, id)?;
                event.details_mut().time_window = Some(service);
                route.push_event(event);
            }
        }

        if step.waiting_time > 0 {
            let idle = TimeWindow::starting_at(service.end(), Duration::from_secs(step.waiting_time))?;
            route.push_event(Waiting::new(counters.next_waiting(), idle));
        }
        previous = Some(step);
    }

    for event in pending.drain_breaks(vehicle) {
        route.push_event(event);
    }
    route.geometry = solution.geometry.clone().map(RouteGeometry::new);
    log::debug!(
        "rebuilt route {} with {} events from {} steps",
        route.id,
        route.events().len(),
        solution.steps.len()
    );
    Ok(())
}

/// Travel covering the growth in cumulative duration between two steps,
/// ending at the later step's arrival.
fn travel_between(
    route: &Route,
    before: &Step,
    step: &Step,
    arrival: Timestamp,
    counters: &mut Counters,
) -> Result<Option<Travel>, OptimizationError> {
    if step.duration == before.duration {
        return Ok(None);
    }
    let Some(travelled) = step.duration.checked_sub(before.duration) else {
        return Err(OptimizationError::InconsistentTimeline {
            route_id: route.id,
            message: format!(
                "cumulative duration fell from {}s to {}s",
                before.duration, step.duration
            ),
        });
    };
    let window = TimeWindow::new(
        sub_duration(arrival, Duration::from_secs(travelled))?,
        arrival,
    )?;
    let distance = Distance::from_meters(step.distance.saturating_sub(before.distance));
    Ok(Some(Travel::new(counters.next_travel(), window, distance)))
}

fn step_id(route_id: RouteId, step: &Step, kind: &'static str) -> Result<u64, OptimizationError> {
    step.id.ok_or_else(|| OptimizationError::InconsistentTimeline {
        route_id,
        message: format!("{kind} step at {} has no id", step.arrival),
    })
}

fn timestamp(seconds: i64, offset: FixedOffset) -> Result<Timestamp, OptimizationError> {
    DateTime::from_timestamp(seconds, 0)
        .map(|instant| instant.with_timezone(&offset))
        .ok_or(OptimizationError::InvalidTimestamp { seconds })
}
