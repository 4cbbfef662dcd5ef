//! VROOM request and response bodies.
//!
//! Coordinates are `[longitude, latitude]` and instants are Unix epoch
//! seconds throughout.
//!
//! See: <https://github.com/VROOM-Project/vroom/blob/master/docs/API.md>

use serde::{Deserialize, Serialize};

/// A `[longitude, latitude]` pair.
pub type LonLat = [f64; 2];

/// An `[start, end]` pair of epoch seconds.
pub type EpochWindow = [i64; 2];

/// Body posted to the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VroomRequest {
    /// One vehicle per route.
    pub vehicles: Vec<Vehicle>,
    /// Appointments and meetings to place.
    pub jobs: Vec<Job>,
    /// Solver options; omitted for whole-run requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

/// A technician's day as the solver sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Route id.
    pub id: u64,
    /// Technician name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Start position.
    pub start: LonLat,
    /// End position.
    pub end: LonLat,
    /// Working window.
    pub time_window: EpochWindow,
    /// Appointment capacity.
    pub capacity: Vec<u32>,
    /// Skill ids held.
    #[serde(default)]
    pub skills: Vec<u64>,
    /// Breaks to place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breaks: Vec<Break>,
    /// Preferred visiting order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<VehicleStep>,
}

/// A break the solver must place on a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Break {
    /// Solver id of the break.
    pub id: u64,
    /// Windows the break may start in.
    pub time_windows: Vec<EpochWindow>,
    /// Break length in seconds.
    pub service: u64,
    /// Break description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A stop the solver must place on some vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Solver id of the job.
    pub id: u64,
    /// Job description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Stop position.
    pub location: LonLat,
    /// Service length in seconds.
    pub service: u64,
    /// Setup length in seconds.
    #[serde(default)]
    pub setup: u64,
    /// Skill ids a vehicle needs.
    #[serde(default)]
    pub skills: Vec<u64>,
    /// Windows the service may start in; empty means any time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_windows: Vec<EpochWindow>,
    /// Priority in `[0, 100]`.
    #[serde(default)]
    pub priority: u32,
    /// Capacity consumed.
    #[serde(default)]
    pub delivery: Vec<u32>,
}

/// Kinds of step in a vehicle's preferred order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// Leave the start position.
    Start,
    /// Serve a job.
    Job,
    /// Take a break.
    Break,
    /// Arrive at the end position.
    End,
}

/// One entry of a vehicle's preferred order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStep {
    /// Step kind.
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Job or break id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl VehicleStep {
    /// A step without an id.
    #[must_use]
    pub const fn marker(step_type: StepType) -> Self {
        Self {
            step_type,
            id: None,
        }
    }

    /// A job or break step.
    #[must_use]
    pub const fn with_id(step_type: StepType, id: u64) -> Self {
        Self {
            step_type,
            id: Some(id),
        }
    }
}

/// Solver options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Return an encoded polyline per route.
    pub geometry: bool,
    /// Let the solver choose arrival times.
    #[serde(rename = "g")]
    pub choose_eta: bool,
}

/// Body returned by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VroomResponse {
    /// `0` on success.
    pub code: i64,
    /// Error message when `code` is not `0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Totals over all routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    /// One entry per used vehicle.
    #[serde(default)]
    pub routes: Vec<ResponseRoute>,
    /// Jobs the solver could not place.
    #[serde(default)]
    pub unassigned: Vec<UnassignedJob>,
}

impl VroomResponse {
    /// Whether the solver reported success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Totals over all routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Total travel seconds.
    #[serde(default)]
    pub duration: u64,
    /// Total meters.
    #[serde(default)]
    pub distance: u64,
}

/// One vehicle's solved route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRoute {
    /// Vehicle (route) id.
    pub vehicle: u64,
    /// Total meters.
    #[serde(default)]
    pub distance: u64,
    /// Total travel seconds.
    #[serde(default)]
    pub duration: u64,
    /// Encoded polyline, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
    /// Ordered steps.
    pub steps: Vec<Step>,
}

/// One scheduled unit of a solved route.
///
/// `duration` and `distance` are cumulative from the route start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// `start`, `job`, `break` or `end`; kept as text so unknown kinds can
    /// be reported.
    #[serde(rename = "type")]
    pub step_type: String,
    /// Job or break id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Step position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LonLat>,
    /// Arrival instant.
    pub arrival: i64,
    /// Service seconds.
    #[serde(default)]
    pub service: u64,
    /// Setup seconds.
    #[serde(default)]
    pub setup: u64,
    /// Cumulative meters.
    #[serde(default)]
    pub distance: u64,
    /// Cumulative travel seconds.
    #[serde(default)]
    pub duration: u64,
    /// Idle seconds reported for the step.
    #[serde(default)]
    pub waiting_time: u64,
}

/// A job the solver could not place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedJob {
    /// Job id.
    pub id: u64,
    /// Job position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LonLat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialise_solved_response() {
        let json = r#"{
            "code": 0,
            "summary": {"cost": 10, "duration": 1800, "distance": 9000},
            "unassigned": [{"id": 7, "location": [-97.7, 30.3], "type": "job"}],
            "routes": [{
                "vehicle": 3,
                "cost": 10,
                "duration": 1800,
                "distance": 9000,
                "geometry": "_p~iF~ps|U",
                "steps": [
                    {"type": "start", "location": [-97.74, 30.27], "arrival": 1709643600, "duration": 0, "distance": 0},
                    {"type": "job", "id": 1, "location": [-97.7, 30.3], "arrival": 1709645400,
                     "service": 1800, "setup": 180, "waiting_time": 0, "duration": 1800, "distance": 9000}
                ]
            }]
        }"#;

        let response: VroomResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(response.is_ok());
        assert_eq!(response.unassigned.len(), 1);
        let route = response.routes.first().expect("one route");
        assert_eq!(route.vehicle, 3);
        assert_eq!(route.geometry.as_deref(), Some("_p~iF~ps|U"));
        let job = route.steps.get(1).expect("job step");
        assert_eq!(job.step_type, "job");
        assert_eq!(job.id, Some(1));
        assert_eq!(job.setup, 180);
    }

    #[rstest]
    fn deserialise_error_response() {
        let json = r#"{"code": 2, "error": "Invalid vehicle id"}"#;

        let response: VroomResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(!response.is_ok());
        assert_eq!(response.error.as_deref(), Some("Invalid vehicle id"));
        assert!(response.routes.is_empty());
    }

    #[rstest]
    fn options_use_solver_field_names() {
        let options = Options {
            geometry: true,
            choose_eta: true,
        };
        let json = serde_json::to_value(options).expect("serialise");
        assert_eq!(json, serde_json::json!({"geometry": true, "g": true}));
    }

    #[rstest]
    fn vehicle_steps_are_tagged_by_type() {
        let steps = vec![
            VehicleStep::marker(StepType::Start),
            VehicleStep::with_id(StepType::Job, 4),
        ];
        let json = serde_json::to_value(&steps).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!([{"type": "start"}, {"type": "job", "id": 4}])
        );
    }
}
