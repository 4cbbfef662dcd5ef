//! Errors crossing the engine boundary.

use thiserror::Error;

use crate::{Engine, RouteId, StateTransitionError, TimeWindowError};

/// Coarse classification of an [`OptimizationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The run was misconfigured; nothing was attempted.
    Configuration,
    /// The solver's answer contradicts the request.
    Protocol,
    /// The solver could not be reached or refused the request.
    Upstream,
    /// A domain invariant was violated.
    Domain,
}

/// Errors raised while optimizing a run or a single route.
///
/// Every variant aborts the run. Validation shortfalls are never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizationError {
    /// The engine name is not one of the known engines.
    #[error("unknown optimization engine {name:?}")]
    UnknownEngine {
        /// Name as supplied.
        name: String,
    },
    /// No adapter is registered for the engine.
    #[error("no adapter registered for engine {engine}")]
    EngineNotRegistered {
        /// Requested engine.
        engine: Engine,
    },
    /// A solver step references an id that was not sent.
    #[error("solver returned {kind} id {id} which was not in the request")]
    UnknownEventId {
        /// Step type that carried the id.
        kind: &'static str,
        /// Offending id.
        id: u64,
    },
    /// Two events map to the same solver id.
    #[error("solver id {id} is used by more than one event")]
    DuplicateEventId {
        /// Offending id.
        id: u64,
    },
    /// An unassigned id was reported twice or was also scheduled.
    #[error("unassigned id {id} was already matched")]
    DuplicateUnassigned {
        /// Offending id.
        id: u64,
    },
    /// The solver returned a step type this crate does not know.
    #[error("unrecognised solver step type {step_type:?}")]
    UnknownStepType {
        /// Step type as received.
        step_type: String,
    },
    /// The solver returned a route for a vehicle that was not sent.
    #[error("solver returned unknown vehicle {vehicle}")]
    UnknownVehicle {
        /// Offending vehicle id.
        vehicle: u64,
    },
    /// A solver timestamp cannot be represented.
    #[error("solver timestamp {seconds} is out of range")]
    InvalidTimestamp {
        /// Epoch seconds as received.
        seconds: i64,
    },
    /// Reconstructed events do not form a valid timeline.
    #[error("route {route_id} has an inconsistent timeline: {message}")]
    InconsistentTimeline {
        /// Affected route.
        route_id: RouteId,
        /// What went wrong.
        message: String,
    },
    /// Jobs were neither scheduled nor reported unassigned.
    #[error("solver did not account for events {ids:?}")]
    UnaccountedEvents {
        /// Route the events were sent with, if any.
        route_id: Option<RouteId>,
        /// Solver ids of the missing events.
        ids: Vec<u64>,
    },
    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The solver answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The solver could not be reached.
    #[error("network error contacting {url}: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse solver response: {message}")]
    ParseError {
        /// Error detail.
        message: String,
    },
    /// The solver reported an error in its response body.
    #[error("solver error {code}: {message}")]
    ServiceError {
        /// Solver error code.
        code: i64,
        /// Solver error message.
        message: String,
    },
    /// An illegal lifecycle transition was requested.
    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),
    /// Time arithmetic produced an invalid window.
    #[error(transparent)]
    TimeWindow(#[from] TimeWindowError),
}

impl OptimizationError {
    /// Which part of the run failed.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownEngine { .. } | Self::EngineNotRegistered { .. } => {
                ErrorCategory::Configuration
            }
            Self::UnknownEventId { .. }
            | Self::DuplicateEventId { .. }
            | Self::DuplicateUnassigned { .. }
            | Self::UnknownStepType { .. }
            | Self::UnknownVehicle { .. }
            | Self::InvalidTimestamp { .. }
            | Self::InconsistentTimeline { .. }
            | Self::UnaccountedEvents { .. } => ErrorCategory::Protocol,
            Self::Timeout { .. }
            | Self::HttpError { .. }
            | Self::NetworkError { .. }
            | Self::ParseError { .. }
            | Self::ServiceError { .. } => ErrorCategory::Upstream,
            Self::StateTransition(_) | Self::TimeWindow(_) => ErrorCategory::Domain,
        }
    }
}
