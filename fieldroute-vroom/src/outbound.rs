//! Domain model to solver request.
//!
//! Each route becomes one vehicle; its appointments and meetings become
//! jobs and its breaks, lunches and reserved time become vehicle breaks.
//! Travel, waiting and the start/end markers are not sent: they are rebuilt
//! from the response.

use std::collections::{BTreeSet, VecDeque};

use fieldroute_core::{
    Appointment, Meeting, OptimizationError, OptimizationState, Route, Skill, TimeWindow,
    WorkEvent,
};

use crate::pending::{PendingEvents, solver_id};
use crate::wire::{Break, EpochWindow, Job, Options, StepType, Vehicle, VehicleStep, VroomRequest};

const MAX_PRIORITY: u32 = 100;

/// A request together with the events it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// Body to post.
    pub request: VroomRequest,
    /// Events awaiting the answer.
    pub pending: PendingEvents,
}

/// Build a whole-run request.
///
/// Unassigned work carried over from the state is sent without time
/// windows or technician pinning.
///
/// # Errors
///
/// Returns [`OptimizationError::DuplicateEventId`] when two events share a
/// solver id.
pub fn translate_state(state: &OptimizationState) -> Result<OutboundRequest, OptimizationError> {
    let mut builder = RequestBuilder::default();
    for route in &state.routes {
        builder.add_route(route, false)?;
    }
    for event in &state.unassigned {
        builder.add_unassigned(event)?;
    }
    log::debug!(
        "built request for office {} with {} vehicles and {} jobs",
        state.office.id,
        builder.vehicles.len(),
        builder.jobs.len()
    );
    Ok(builder.finish(None))
}

/// Build a single-route request that lists the current order as preferred
/// steps and asks for geometry and solver-chosen arrival times.
///
/// # Errors
///
/// As for [`translate_state`].
pub fn translate_route(route: &Route) -> Result<OutboundRequest, OptimizationError> {
    let mut builder = RequestBuilder::default();
    builder.add_route(route, true)?;
    log::debug!(
        "built single-route request for route {} with {} jobs",
        route.id,
        builder.jobs.len()
    );
    Ok(builder.finish(Some(Options {
        geometry: true,
        choose_eta: true,
    })))
}

#[derive(Default)]
struct RequestBuilder {
    vehicles: Vec<Vehicle>,
    jobs: Vec<Job>,
    pending: PendingEvents,
}

impl RequestBuilder {
    fn add_route(&mut self, route: &Route, with_steps: bool) -> Result<(), OptimizationError> {
        let vehicle_id = route.id.get();
        let hours = route.working_hours();
        let personal = route.service_pro.personal_skill().solver_id();
        let mut breaks = Vec::new();
        let mut included = BTreeSet::new();
        for event in route.events() {
            if let Some(job) = job_for(event, Some(personal)) {
                self.push_job(job, event)?;
            } else if event.is_unavailable_time() {
                match break_for(event, &hours) {
                    Some(entry) => {
                        self.pending.insert_break(vehicle_id, entry.id, event.clone())?;
                        included.insert(entry.id);
                        breaks.push(entry);
                    }
                    None => {
                        log::debug!(
                            "withholding {} {:?} outside the working window of route {}",
                            event.kind(),
                            event.id(),
                            route.id
                        );
                        self.pending.exclude(vehicle_id, event.clone());
                    }
                }
            }
        }
        let steps = if with_steps {
            preferred_steps(route, &included)
        } else {
            Vec::new()
        };
        let pro = &route.service_pro;
        self.vehicles.push(Vehicle {
            id: vehicle_id,
            description: pro.name.clone(),
            start: pro.start_location.to_lon_lat(),
            end: pro.end_location.to_lon_lat(),
            time_window: epoch_window(&hours),
            capacity: vec![route.actual_capacity],
            skills: pro.skills().map(Skill::solver_id).collect(),
            breaks,
            steps,
        });
        Ok(())
    }

    fn add_unassigned(&mut self, event: &WorkEvent) -> Result<(), OptimizationError> {
        match job_for(event, None) {
            Some(job) => self.push_job(job, event),
            None => {
                log::debug!("ignoring unassigned {} event {:?}", event.kind(), event.id());
                Ok(())
            }
        }
    }

    fn push_job(&mut self, job: Job, event: &WorkEvent) -> Result<(), OptimizationError> {
        self.pending.insert_job(job.id, event.clone())?;
        self.jobs.push(job);
        Ok(())
    }

    fn finish(self, options: Option<Options>) -> OutboundRequest {
        OutboundRequest {
            request: VroomRequest {
                vehicles: self.vehicles,
                jobs: self.jobs,
                options,
            },
            pending: self.pending,
        }
    }
}

/// Job for an appointment or meeting. `personal` is the owning technician's
/// personal skill id; `None` sends the job unconstrained.
fn job_for(event: &WorkEvent, personal: Option<u64>) -> Option<Job> {
    let id = solver_id(event)?;
    match event {
        WorkEvent::Appointment(appointment) => Some(appointment_job(id, appointment, personal)),
        WorkEvent::Meeting(meeting) => Some(meeting_job(id, meeting, personal)),
        _ => None,
    }
}

fn appointment_job(id: u64, appointment: &Appointment, personal: Option<u64>) -> Job {
    let mut skills: Vec<u64> = appointment
        .required_skills
        .iter()
        .copied()
        .map(Skill::solver_id)
        .collect();
    let mut time_windows = Vec::new();
    if let Some(personal) = personal {
        if appointment.locked {
            skills.push(personal);
        }
        let details = &appointment.details;
        let constraint = details.expected_arrival.or_else(|| {
            details
                .time_window
                .filter(|_| appointment.locked)
                .map(|window| TimeWindow::instant(window.start()))
        });
        time_windows.extend(constraint.as_ref().map(epoch_window));
    }
    Job {
        id,
        description: appointment.details.description.clone(),
        location: appointment.location.to_lon_lat(),
        service: appointment.details.duration.as_secs(),
        setup: appointment.setup_duration().as_secs(),
        skills,
        time_windows,
        priority: appointment.priority().min(MAX_PRIORITY),
        delivery: vec![1],
    }
}

fn meeting_job(id: u64, meeting: &Meeting, personal: Option<u64>) -> Job {
    let details = &meeting.details;
    let constraint = personal.and_then(|_| {
        details
            .expected_arrival
            .or_else(|| details.time_window.map(|window| TimeWindow::instant(window.start())))
    });
    Job {
        id,
        description: details.description.clone(),
        location: meeting.location.to_lon_lat(),
        service: details.duration.as_secs(),
        setup: 0,
        skills: personal.into_iter().collect(),
        time_windows: constraint.as_ref().map(epoch_window).into_iter().collect(),
        priority: MAX_PRIORITY,
        delivery: vec![0],
    }
}

/// Vehicle break for a break, lunch or reserved time, or `None` when the
/// event has no window inside the vehicle's working hours.
fn break_for(event: &WorkEvent, hours: &TimeWindow) -> Option<Break> {
    let id = solver_id(event)?;
    let start_window = match event {
        WorkEvent::ReservedTime(reserved) => {
            let occupied = reserved.details.time_window?;
            if !hours.contains_window(&occupied) {
                return None;
            }
            TimeWindow::instant(occupied.start())
        }
        WorkEvent::WorkBreak(_) | WorkEvent::Lunch(_) => {
            let window = event.expected_arrival().or_else(|| event.time_window())?;
            if !hours.contains_window(&window) {
                return None;
            }
            window
        }
        _ => return None,
    };
    Some(Break {
        id,
        time_windows: vec![epoch_window(&start_window)],
        service: event.duration().as_secs(),
        description: event.description().to_owned(),
    })
}

/// Current order as solver steps. A break that needs more appointments
/// before it than have been listed waits until enough have been.
fn preferred_steps(route: &Route, included_breaks: &BTreeSet<u64>) -> Vec<VehicleStep> {
    let mut steps = vec![VehicleStep::marker(StepType::Start)];
    let mut appointments_listed: u32 = 0;
    let mut deferred: VecDeque<(u32, u64)> = VecDeque::new();
    for event in route.chronological() {
        let Some(id) = solver_id(event) else {
            continue;
        };
        if event.is_job() {
            steps.push(VehicleStep::with_id(StepType::Job, id));
            if event.as_appointment().is_some() {
                appointments_listed = appointments_listed.saturating_add(1);
                while let Some(&(required, break_id)) = deferred.front() {
                    if required > appointments_listed {
                        break;
                    }
                    deferred.pop_front();
                    steps.push(VehicleStep::with_id(StepType::Break, break_id));
                }
            }
        } else if included_breaks.contains(&id) {
            let required = event.min_appointments_before().unwrap_or(0);
            if required > appointments_listed || !deferred.is_empty() {
                deferred.push_back((required, id));
            } else {
                steps.push(VehicleStep::with_id(StepType::Break, id));
            }
        }
    }
    steps.extend(
        deferred
            .into_iter()
            .map(|(_, id)| VehicleStep::with_id(StepType::Break, id)),
    );
    steps.push(VehicleStep::marker(StepType::End));
    steps
}

fn epoch_window(window: &TimeWindow) -> EpochWindow {
    [window.start().timestamp(), window.end().timestamp()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroute_core::test_support::{RouteBuilder, appointment, appointment_data, at, office, window};
    use fieldroute_core::{
        Appointment, Coordinate, Engine, Lunch, Meeting, OptimizationParams, PriorityConfig,
        ReservedTime, WorkBreak,
    };
    use rstest::rstest;
    use std::time::Duration;

    fn locked(id: u64) -> Appointment {
        let mut data = appointment_data(id, "Locked visit");
        data.locked = true;
        data.time_window = Some(window("10:00", "10:30"));
        Appointment::new(data, &PriorityConfig::default())
    }

    #[rstest]
    fn route_becomes_vehicle() {
        let route = RouteBuilder::new(7).hours("08:00", "16:00").capacity(6).build();
        let outbound = translate_route(&route).expect("translates");
        let vehicle = outbound.request.vehicles.first().expect("one vehicle");
        assert_eq!(vehicle.id, 7);
        assert_eq!(
            vehicle.time_window,
            [at("08:00").timestamp(), at("16:00").timestamp()]
        );
        assert_eq!(vehicle.capacity, vec![6]);
        assert_eq!(vehicle.skills, vec![1_000_007]);
        assert_eq!(vehicle.start, [-97.74, 30.27]);
    }

    #[rstest]
    fn locked_appointments_are_pinned() {
        let route = RouteBuilder::new(7)
            .event(locked(1))
            .event(appointment(2, "Quarterly"))
            .build();
        let outbound = translate_route(&route).expect("translates");
        let jobs = &outbound.request.jobs;
        let pinned = jobs.iter().find(|job| job.id == 1).expect("locked job");
        let free = jobs.iter().find(|job| job.id == 2).expect("free job");
        assert_eq!(pinned.skills, vec![1_000_007]);
        assert_eq!(pinned.time_windows, vec![[at("10:00").timestamp(); 2]]);
        assert_eq!(pinned.priority, PriorityConfig::default().locked);
        assert!(free.skills.is_empty());
        assert!(free.time_windows.is_empty());
        assert_eq!(free.setup, 180);
        assert_eq!(free.delivery, vec![1]);
    }

    #[rstest]
    fn meetings_are_offset_and_pinned() {
        let mut meeting =
            Meeting::new(3, "Safety", Duration::from_secs(1800), Coordinate::new(30.0, -97.0));
        meeting.details.time_window = Some(window("12:00", "12:30"));
        let route = RouteBuilder::new(7).event(meeting).build();
        let outbound = translate_state_of(route);
        let job = outbound.request.jobs.first().expect("meeting job");
        assert_eq!(job.id, 2_000_000_003);
        assert_eq!(job.skills, vec![1_000_007]);
        assert_eq!(job.location, [-97.0, 30.0]);
        assert_eq!(job.delivery, vec![0]);
        assert_eq!(job.time_windows, vec![[at("12:00").timestamp(); 2]]);
    }

    #[rstest]
    fn breaks_outside_working_hours_are_withheld() {
        let route = RouteBuilder::new(7)
            .hours("08:00", "12:00")
            .event(WorkBreak::new(10, "Break", Duration::from_secs(900)).expected(window("10:00", "10:30")))
            .event(Lunch::new(11, "Lunch", Duration::from_secs(1800)).expected(window("12:00", "13:00")))
            .event(WorkBreak::new(12, "Floating", Duration::from_secs(900)))
            .event(ReservedTime::new(13, "Dentist", window("09:00", "09:45")))
            .build();
        let outbound = translate_route(&route).expect("translates");
        let vehicle = outbound.request.vehicles.first().expect("one vehicle");
        let ids: Vec<_> = vehicle.breaks.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![10, 3_000_000_013]);
        let reserved = vehicle.breaks.get(1).expect("reserved break");
        assert_eq!(reserved.time_windows, vec![[at("09:00").timestamp(); 2]]);
        assert_eq!(reserved.service, 45 * 60);
        assert_eq!(outbound.pending.excluded(7).len(), 2);
    }

    #[rstest]
    fn single_route_steps_defer_breaks_needing_more_appointments() {
        let mut lunch = Lunch::new(20, "Lunch", Duration::from_secs(1800))
            .scheduled(window("09:30", "10:00"))
            .expected(window("09:00", "13:00"));
        lunch.min_appointments_before = Some(2);
        let route = RouteBuilder::new(7)
            .event(appointment(1, "A").scheduled(window("09:00", "09:30")))
            .event(lunch)
            .event(appointment(2, "B").scheduled(window("10:00", "10:30")))
            .event(appointment(3, "C").scheduled(window("11:00", "11:30")))
            .build();
        let outbound = translate_route(&route).expect("translates");
        let vehicle = outbound.request.vehicles.first().expect("one vehicle");
        assert_eq!(
            vehicle.steps,
            vec![
                VehicleStep::marker(StepType::Start),
                VehicleStep::with_id(StepType::Job, 1),
                VehicleStep::with_id(StepType::Job, 2),
                VehicleStep::with_id(StepType::Break, 20),
                VehicleStep::with_id(StepType::Job, 3),
                VehicleStep::marker(StepType::End),
            ]
        );
        assert_eq!(
            outbound.request.options,
            Some(Options {
                geometry: true,
                choose_eta: true
            })
        );
    }

    #[rstest]
    fn whole_run_carries_unassigned_work_unconstrained() {
        let mut state = OptimizationState::new(
            Engine::Vroom,
            office(),
            window("00:00", "23:59"),
            OptimizationParams::default(),
        );
        state.routes.push(RouteBuilder::new(7).event(appointment(1, "A")).build());
        let mut floating = locked(2);
        floating.details.expected_arrival = Some(window("09:00", "10:00"));
        state.unassigned.push(floating.into());
        let outbound = translate_state(&state).expect("translates");
        assert_eq!(outbound.request.options, None);
        assert!(outbound.request.vehicles.iter().all(|v| v.steps.is_empty()));
        let carried = outbound
            .request
            .jobs
            .iter()
            .find(|job| job.id == 2)
            .expect("carried job");
        assert!(carried.skills.is_empty());
        assert!(carried.time_windows.is_empty());
        assert_eq!(outbound.pending.job_count(), 2);
    }

    #[rstest]
    fn repeated_ids_are_rejected() {
        let route = RouteBuilder::new(7)
            .event(appointment(1, "A"))
            .event(appointment(1, "A again"))
            .build();
        assert_eq!(
            translate_route(&route).err(),
            Some(OptimizationError::DuplicateEventId { id: 1 })
        );
    }

    fn translate_state_of(route: Route) -> OutboundRequest {
        let mut state = OptimizationState::new(
            Engine::Vroom,
            office(),
            window("00:00", "23:59"),
            OptimizationParams::default(),
        );
        state.routes.push(route);
        translate_state(&state).expect("translates")
    }
}
