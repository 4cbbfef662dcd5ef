//! Post-solve validation and repair of technician routes.
//!
//! After a run is solved every route is checked by a fixed list of
//! [`RouteValidator`]s. A failing route is annotated, transformed by the
//! validator's [`ActionKind`] and re-solved through the engine, within a
//! per-route budget tracked by an [`AttemptLedger`]. Running out of budget
//! is an outcome, not an error: the [`RepairReport`] says which routes
//! remain unresolved.
//!
//! [`optimize_and_repair`] ties an engine lookup, the whole-run solve and
//! the pipeline together.
#![forbid(unsafe_code)]

mod action;
mod config;
mod idle;
mod pipeline;
mod run;
mod validator;

pub use action::{ActionKind, ActionOutcome, AttemptLedger, Reoptimizer, SkipReason};
pub use config::ReoptimizationConfig;
pub use pipeline::{RepairReport, ReoptimizationPipeline, RouteRepair, RouteRepairState, RuleOutcome};
pub use run::{RunOutcome, optimize_and_repair};
pub use validator::{
    AverageInactivity, InactivityBeforeFirstAppointment, LongInactivity, RouteValidator,
    TwoBreaksInARow, annotate_min_appointments_before, standard_validators,
};
