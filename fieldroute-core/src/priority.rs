//! Appointment classification: kind, half-day detection, priority and setup.
//!
//! Classification is a pure function of an appointment's description,
//! expected-arrival window and flags, combined with the office-wide
//! [`PriorityConfig`]. Appointments compute it once when constructed.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::TimeWindow;

/// Office-wide priorities and setup durations for appointments.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PriorityConfig {
    /// Priority of appointments locked to their route.
    pub locked: u32,
    /// Priority of appointments whose customer has been notified.
    pub notified: u32,
    /// Priority of initial services.
    pub initial: u32,
    /// Priority of appointments restricted to a morning or afternoon.
    pub half_day: u32,
    /// Priority of reservices.
    pub reservice: u32,
    /// Priority of everything else.
    pub default: u32,
    /// Setup time before an initial service.
    #[cfg_attr(feature = "serde", serde(with = "crate::time::duration_secs"))]
    pub initial_setup: Duration,
    /// Setup time before any other appointment.
    #[cfg_attr(feature = "serde", serde(with = "crate::time::duration_secs"))]
    pub regular_setup: Duration,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            locked: 100,
            notified: 90,
            initial: 70,
            half_day: 60,
            reservice: 50,
            default: 25,
            initial_setup: Duration::from_secs(5 * 60),
            regular_setup: Duration::from_secs(3 * 60),
        }
    }
}

/// Service kind inferred from an appointment description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AppointmentKind {
    /// First visit to a new customer.
    Initial,
    /// Follow-up to fix an earlier service.
    Reservice,
    /// Any other service.
    #[default]
    Regular,
}

impl AppointmentKind {
    /// Classify a free-text description by keyword.
    #[must_use]
    pub fn from_description(description: &str) -> Self {
        let lowered = description.to_lowercase();
        if lowered.contains("initial") {
            Self::Initial
        } else if lowered.contains("reservice") {
            Self::Reservice
        } else {
            Self::Regular
        }
    }
}

/// Inputs that drive classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationInput<'a> {
    /// Appointment description.
    pub description: &'a str,
    /// Customer's expected-arrival window.
    pub expected_arrival: Option<&'a TimeWindow>,
    /// Customer has been told the arrival time.
    pub notified: bool,
    /// Appointment cannot leave its route.
    pub locked: bool,
}

/// Derived, fixed-at-construction appointment attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Classification {
    /// Service kind.
    pub kind: AppointmentKind,
    /// The expected-arrival window sits within one half of the day.
    pub half_day: bool,
    /// Solver priority.
    pub priority: u32,
    /// Setup time preceding the service.
    #[cfg_attr(feature = "serde", serde(with = "crate::time::duration_secs"))]
    pub setup_duration: Duration,
}

impl Classification {
    /// Classify an appointment against the office configuration.
    ///
    /// Priority precedence is locked, notified, initial, half-day,
    /// reservice, then default.
    #[must_use]
    pub fn classify(input: ClassificationInput<'_>, config: &PriorityConfig) -> Self {
        let kind = AppointmentKind::from_description(input.description);
        let half_day = input.expected_arrival.is_some_and(is_half_day);
        let priority = if input.locked {
            config.locked
        } else if input.notified {
            config.notified
        } else if kind == AppointmentKind::Initial {
            config.initial
        } else if half_day {
            config.half_day
        } else if kind == AppointmentKind::Reservice {
            config.reservice
        } else {
            config.default
        };
        let setup_duration = if kind == AppointmentKind::Initial {
            config.initial_setup
        } else {
            config.regular_setup
        };
        Self {
            kind,
            half_day,
            priority,
            setup_duration,
        }
    }
}

fn is_half_day(window: &TimeWindow) -> bool {
    let midday = window.midday();
    window.end() <= midday || window.start() >= midday
}
