//! Meetings and the solver-derived travel, waiting and depot markers.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::EventDetails;
use crate::{Coordinate, Distance, TimeWindow, Timestamp};

/// An office meeting the technician attends.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Meeting {
    /// Upstream meeting id.
    pub id: u64,
    /// Shared event attributes.
    pub details: EventDetails,
    /// Where the meeting takes place.
    pub location: Coordinate,
}

impl Meeting {
    /// Unscheduled meeting.
    pub fn new(
        id: u64,
        description: impl Into<String>,
        duration: Duration,
        location: Coordinate,
    ) -> Self {
        Self {
            id,
            details: EventDetails::new(description, duration),
            location,
        }
    }
}

/// Driving between two stops.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Travel {
    /// Sequential id within the route.
    pub id: u64,
    /// Shared event attributes.
    pub details: EventDetails,
    /// Distance covered.
    pub distance: Distance,
}

impl Travel {
    /// Travel occupying `window`.
    #[must_use]
    pub fn new(id: u64, window: TimeWindow, distance: Distance) -> Self {
        Self {
            id,
            details: EventDetails::new("Travel", window.duration()).with_time_window(window),
            distance,
        }
    }
}

/// Idle time between stops.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waiting {
    /// Sequential id within the route.
    pub id: u64,
    /// Shared event attributes.
    pub details: EventDetails,
}

impl Waiting {
    /// Waiting occupying `window`.
    #[must_use]
    pub fn new(id: u64, window: TimeWindow) -> Self {
        Self {
            id,
            details: EventDetails::new("Waiting", window.duration()).with_time_window(window),
        }
    }
}

/// Where and when the route begins.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StartLocation {
    /// Shared event attributes.
    pub details: EventDetails,
    /// Start position.
    pub location: Coordinate,
}

impl StartLocation {
    /// Start marker at `location` and `instant`.
    #[must_use]
    pub fn new(location: Coordinate, instant: Timestamp) -> Self {
        Self {
            details: EventDetails::new("Start", Duration::ZERO)
                .with_time_window(TimeWindow::instant(instant)),
            location,
        }
    }
}

/// Where and when the route ends.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EndLocation {
    /// Shared event attributes.
    pub details: EventDetails,
    /// End position.
    pub location: Coordinate,
}

impl EndLocation {
    /// End marker at `location` and `instant`.
    #[must_use]
    pub fn new(location: Coordinate, instant: Timestamp) -> Self {
        Self {
            details: EventDetails::new("End", Duration::ZERO)
                .with_time_window(TimeWindow::instant(instant)),
            location,
        }
    }
}
