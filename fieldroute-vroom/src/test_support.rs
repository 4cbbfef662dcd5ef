//! Test doubles for [`SolverTransport`].
//!
//! [`ScriptedTransport`] replays canned answers. [`EchoTransport`] plays a
//! well-behaved solver that keeps a route's current schedule and fills the
//! gaps with travel and idle time.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use fieldroute_core::{OptimizationError, Route, Timestamp};

use crate::client::SolverTransport;
use crate::pending::solver_id;
use crate::wire::{LonLat, ResponseRoute, Step, UnassignedJob, VroomRequest, VroomResponse};

/// Meters credited per second of synthetic travel.
const METERS_PER_SECOND: u64 = 10;

/// Geometry returned when the request asks for it.
pub const SAMPLE_GEOMETRY: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

/// A step of `step_type` arriving at `arrival` with every other field zero.
#[must_use]
pub fn step(step_type: &str, id: Option<u64>, arrival: Timestamp) -> Step {
    step_at(step_type, id, arrival.timestamp())
}

/// A successful response with no routes.
#[must_use]
pub const fn empty_response() -> VroomResponse {
    VroomResponse {
        code: 0,
        error: None,
        summary: None,
        routes: Vec::new(),
        unassigned: Vec::new(),
    }
}

fn record(requests: &Mutex<Vec<VroomRequest>>, request: &VroomRequest) {
    requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request.clone());
}

fn recorded(requests: &Mutex<Vec<VroomRequest>>) -> Vec<VroomRequest> {
    requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replays canned replies in order, repeating the last one.
#[derive(Debug)]
pub struct ScriptedTransport {
    replies: Vec<Result<VroomResponse, OptimizationError>>,
    requests: Mutex<Vec<VroomRequest>>,
}

impl ScriptedTransport {
    /// Replies with `responses` in order.
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = VroomResponse>) -> Self {
        Self {
            replies: responses.into_iter().map(Ok).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with `error`.
    #[must_use]
    pub fn failing(error: OptimizationError) -> Self {
        Self {
            replies: vec![Err(error)],
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<VroomRequest> {
        recorded(&self.requests)
    }
}

impl SolverTransport for ScriptedTransport {
    fn solve(&self, request: &VroomRequest) -> Result<VroomResponse, OptimizationError> {
        record(&self.requests, request);
        let answered = recorded(&self.requests).len().saturating_sub(1);
        self.replies
            .get(answered)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or_else(|| {
                Err(OptimizationError::ParseError {
                    message: "no scripted reply".to_owned(),
                })
            })
    }
}

/// Solver double that keeps a route's schedule.
///
/// Every scheduled job or break of the route that appears in the request
/// is placed at its current start. Between consecutive stops the double
/// travels for at most `leg` and idles for the rest. The day starts `leg`
/// before the first stop (never before the working window) and ends `leg`
/// after the last. Jobs it cannot place are reported unassigned. Other
/// vehicles are left unused.
#[derive(Debug)]
pub struct EchoTransport {
    route: Route,
    leg: u64,
    requests: Mutex<Vec<VroomRequest>>,
}

struct Placed {
    step_type: &'static str,
    id: u64,
    location: Option<LonLat>,
    arrival: i64,
    setup: u64,
    service: u64,
}

impl EchoTransport {
    /// Echo `route`'s current schedule with `leg` of travel per hop.
    #[must_use]
    pub fn new(route: &Route, leg: Duration) -> Self {
        Self {
            route: route.clone(),
            leg: leg.as_secs(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<VroomRequest> {
        recorded(&self.requests)
    }

    fn place(&self, request: &VroomRequest) -> Vec<Placed> {
        let vehicle_id = self.route.id.get();
        let jobs: BTreeMap<u64, _> = request.jobs.iter().map(|job| (job.id, job)).collect();
        let breaks: BTreeMap<u64, _> = request
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.id == vehicle_id)
            .flat_map(|vehicle| &vehicle.breaks)
            .map(|work_break| (work_break.id, work_break))
            .collect();

        self.route
            .chronological()
            .into_iter()
            .filter_map(|event| {
                let start = event.scheduled_start()?.timestamp();
                let id = solver_id(event)?;
                if event.is_job() {
                    jobs.get(&id).map(|job| Placed {
                        step_type: "job",
                        id,
                        location: Some(job.location),
                        arrival: start,
                        setup: job.setup,
                        service: job.service,
                    })
                } else {
                    breaks.get(&id).map(|work_break| Placed {
                        step_type: "break",
                        id,
                        location: None,
                        arrival: start,
                        setup: 0,
                        service: work_break.service,
                    })
                }
            })
            .collect()
    }

    fn echo(&self, request: &VroomRequest) -> VroomResponse {
        let vehicle_id = self.route.id.get();
        let Some(vehicle) = request.vehicles.iter().find(|vehicle| vehicle.id == vehicle_id)
        else {
            return unassign_all(request, &BTreeSet::new());
        };
        let placed = self.place(request);
        let leg = i64::try_from(self.leg).unwrap_or(i64::MAX);
        let [day_start, _] = vehicle.time_window;
        let first = placed.first().map_or(day_start, |stop| stop.arrival);
        let start_arrival = first.saturating_sub(first.saturating_sub(day_start).clamp(0, leg));

        let mut steps = vec![Step {
            location: Some(vehicle.start),
            ..step_at("start", None, start_arrival)
        }];
        let mut travelled: u64 = 0;
        let mut free_at = start_arrival;
        let mut served = BTreeSet::new();
        for stop in &placed {
            let arrival = stop.arrival.max(free_at);
            let gap = u64::try_from(arrival.saturating_sub(free_at)).unwrap_or(0);
            let travel = gap.min(self.leg);
            if let Some(previous) = steps.last_mut() {
                previous.waiting_time = gap.saturating_sub(travel);
            }
            travelled = travelled.saturating_add(travel);
            steps.push(Step {
                id: Some(stop.id),
                location: stop.location,
                service: stop.service,
                setup: stop.setup,
                distance: travelled.saturating_mul(METERS_PER_SECOND),
                duration: travelled,
                ..step_at(stop.step_type, None, arrival)
            });
            if stop.step_type == "job" {
                served.insert(stop.id);
            }
            let busy = i64::try_from(stop.setup.saturating_add(stop.service)).unwrap_or(i64::MAX);
            free_at = arrival.saturating_add(busy);
        }
        travelled = travelled.saturating_add(self.leg);
        steps.push(Step {
            location: Some(vehicle.end),
            distance: travelled.saturating_mul(METERS_PER_SECOND),
            duration: travelled,
            ..step_at("end", None, free_at.saturating_add(leg))
        });

        let wants_geometry = request.options.is_some_and(|options| options.geometry);
        let mut response = unassign_all(request, &served);
        response.routes.push(ResponseRoute {
            vehicle: vehicle_id,
            distance: travelled.saturating_mul(METERS_PER_SECOND),
            duration: travelled,
            geometry: wants_geometry.then(|| SAMPLE_GEOMETRY.to_owned()),
            steps,
        });
        response
    }
}

fn step_at(step_type: &str, id: Option<u64>, arrival: i64) -> Step {
    Step {
        step_type: step_type.to_owned(),
        id,
        location: None,
        arrival,
        service: 0,
        setup: 0,
        distance: 0,
        duration: 0,
        waiting_time: 0,
    }
}

fn unassign_all(request: &VroomRequest, served: &BTreeSet<u64>) -> VroomResponse {
    VroomResponse {
        unassigned: request
            .jobs
            .iter()
            .filter(|job| !served.contains(&job.id))
            .map(|job| UnassignedJob {
                id: job.id,
                location: Some(job.location),
            })
            .collect(),
        ..empty_response()
    }
}

impl SolverTransport for EchoTransport {
    fn solve(&self, request: &VroomRequest) -> Result<VroomResponse, OptimizationError> {
        record(&self.requests, request);
        Ok(self.echo(request))
    }
}
