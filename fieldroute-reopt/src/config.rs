//! Thresholds for the route validators.

use std::time::Duration;

const MINUTE: u64 = 60;

/// Idle-time thresholds applied after every solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReoptimizationConfig {
    /// Ceiling for any single idle gap.
    pub long_inactivity: Duration,
    /// Ceiling for the mean idle gap of a route.
    pub average_inactivity: Duration,
    /// Ceiling for idle time between leaving the start and the first
    /// appointment.
    pub inactivity_before_first_appointment: Duration,
}

impl Default for ReoptimizationConfig {
    fn default() -> Self {
        Self {
            long_inactivity: Duration::from_secs(90 * MINUTE),
            average_inactivity: Duration::from_secs(30 * MINUTE),
            inactivity_before_first_appointment: Duration::from_secs(30 * MINUTE),
        }
    }
}

impl ReoptimizationConfig {
    /// Set the single-gap ceiling.
    #[must_use]
    pub const fn with_long_inactivity(mut self, limit: Duration) -> Self {
        self.long_inactivity = limit;
        self
    }

    /// Set the mean-gap ceiling.
    #[must_use]
    pub const fn with_average_inactivity(mut self, limit: Duration) -> Self {
        self.average_inactivity = limit;
        self
    }

    /// Set the ceiling for idle time before the first appointment.
    #[must_use]
    pub const fn with_inactivity_before_first_appointment(mut self, limit: Duration) -> Self {
        self.inactivity_before_first_appointment = limit;
        self
    }
}
