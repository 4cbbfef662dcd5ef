//! Facade crate for field-service route optimization.
//!
//! This crate re-exports the domain model and the repair pipeline, and
//! exposes solver adapters behind feature flags.

#![forbid(unsafe_code)]

pub use fieldroute_core::{
    Appointment, Coordinate, Engine, EngineRegistry, ErrorCategory, OptimizationEngine,
    OptimizationError, OptimizationParams, OptimizationState, OptimizationStatus, Route, RouteId,
    TimeWindow, WorkEvent,
};
pub use fieldroute_reopt::{
    ReoptimizationConfig, ReoptimizationPipeline, RepairReport, RunOutcome, optimize_and_repair,
};

#[cfg(feature = "solver-vroom")]
pub use fieldroute_vroom::{VroomClient, VroomClientConfig, VroomEngine};
