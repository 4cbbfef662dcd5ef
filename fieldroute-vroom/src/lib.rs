//! VROOM adapter for field-service route optimization.
//!
//! Responsibilities:
//! - Translate optimization states and single routes into VROOM requests.
//! - Rebuild routes from VROOM responses, synthesising travel and idle time.
//! - Post requests over HTTP and classify upstream failures.
//!
//! Boundaries:
//! - Domain rules live in `fieldroute-core`; repair policy lives in
//!   `fieldroute-reopt`.
//!
//! Invariants:
//! - Every job sent is either scheduled or reported unassigned exactly once.
//! - Solver coordinates are `[longitude, latitude]`; domain coordinates are
//!   latitude first.
#![forbid(unsafe_code)]

mod client;
mod engine;
mod inbound;
mod outbound;
mod pending;
mod wire;

#[doc(hidden)]
pub mod test_support;

pub use client::{
    ClientBuildError, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, SolverTransport, VroomClient,
    VroomClientConfig,
};
pub use engine::VroomEngine;
pub use inbound::{apply_to_route, apply_to_state};
pub use outbound::{OutboundRequest, translate_route, translate_state};
pub use pending::{PendingEvents, solver_id};
pub use wire::{
    Break, EpochWindow, Job, LonLat, Options, ResponseRoute, Step, StepType, Summary,
    UnassignedJob, Vehicle, VehicleStep, VroomRequest, VroomResponse,
};
