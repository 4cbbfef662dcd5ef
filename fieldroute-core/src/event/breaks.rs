//! Breaks, lunches and reserved time blocked out of a route.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::EventDetails;
use crate::TimeWindow;

/// A short paid break.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorkBreak {
    /// Upstream break id.
    pub id: u64,
    /// Shared event attributes.
    pub details: EventDetails,
    /// Appointments that must be served before the break may start.
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_appointments_before: Option<u32>,
}

impl WorkBreak {
    /// Unscheduled break.
    pub fn new(id: u64, description: impl Into<String>, duration: Duration) -> Self {
        Self {
            id,
            details: EventDetails::new(description, duration),
            min_appointments_before: None,
        }
    }

    /// Set the scheduled window.
    #[must_use]
    pub fn scheduled(mut self, window: TimeWindow) -> Self {
        self.details.time_window = Some(window);
        self
    }

    /// Set the expected-arrival window.
    #[must_use]
    pub fn expected(mut self, window: TimeWindow) -> Self {
        self.details.expected_arrival = Some(window);
        self
    }
}

/// The technician's lunch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Lunch {
    /// Upstream lunch id.
    pub id: u64,
    /// Shared event attributes.
    pub details: EventDetails,
    /// Appointments that must be served before lunch may start.
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_appointments_before: Option<u32>,
}

impl Lunch {
    /// Unscheduled lunch.
    pub fn new(id: u64, description: impl Into<String>, duration: Duration) -> Self {
        Self {
            id,
            details: EventDetails::new(description, duration),
            min_appointments_before: None,
        }
    }

    /// Set the scheduled window.
    #[must_use]
    pub fn scheduled(mut self, window: TimeWindow) -> Self {
        self.details.time_window = Some(window);
        self
    }

    /// Set the expected-arrival window.
    #[must_use]
    pub fn expected(mut self, window: TimeWindow) -> Self {
        self.details.expected_arrival = Some(window);
        self
    }
}

/// Time blocked off by the office; never moved by the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReservedTime {
    /// Upstream reservation id.
    pub id: u64,
    /// Shared event attributes.
    pub details: EventDetails,
}

impl ReservedTime {
    /// Reserved time fixed to `window`.
    pub fn new(id: u64, description: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            id,
            details: EventDetails::new(description, window.duration()).with_time_window(window),
        }
    }
}
