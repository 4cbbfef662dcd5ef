//! Core domain types for field-service route optimization.
//!
//! An [`OptimizationState`] describes one run for one office and service
//! date: its [`Route`]s, each holding a technician's [`WorkEvent`]s, and any
//! work left unassigned. Solver adapters implement [`OptimizationEngine`]
//! and are selected through an [`EngineRegistry`].
//!
//! Value objects validate on construction and return dedicated error
//! enums; everything crossing the engine boundary fails with
//! [`OptimizationError`].
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod engine;
mod error;
pub mod event;
mod geometry;
mod location;
mod priority;
mod route;
mod service_pro;
mod skill;
mod state;
pub mod time;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use engine::{Engine, EngineRegistry, OptimizationEngine};
pub use error::{ErrorCategory, OptimizationError};
pub use event::{
    Appointment, AppointmentData, EndLocation, EventDetails, Lunch, Meeting, ReservedTime,
    StartLocation, Travel, Waiting, WorkBreak, WorkEvent, WorkEventKind,
};
pub use geometry::{GeometryError, RouteGeometry};
pub use location::{Coordinate, Distance, Office};
pub use priority::{AppointmentKind, Classification, ClassificationInput, PriorityConfig};
pub use route::{Route, RouteId, RouteType, TimelineGap};
pub use service_pro::ServicePro;
pub use skill::{Skill, StateCode};
pub use state::{
    OptimizationParams, OptimizationState, OptimizationStatus, RULE_AVERAGE_INACTIVITY,
    RULE_INACTIVITY_BEFORE_FIRST_APPOINTMENT, RULE_LONG_INACTIVITY, RULE_TWO_BREAKS_IN_A_ROW,
    RuleExecution, StateTransitionError, WeatherInfo,
};
pub use time::{TimeWindow, TimeWindowError, Timestamp};
