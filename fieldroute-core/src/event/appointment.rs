//! Customer appointments and their booking-system input.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::EventDetails;
use crate::{
    AppointmentKind, Classification, ClassificationInput, Coordinate, PriorityConfig, Skill,
    TimeWindow,
};

/// Raw appointment attributes as supplied by the booking system.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentData {
    /// Upstream appointment id.
    pub id: u64,
    /// Free-text description; drives the service kind.
    pub description: String,
    /// Service duration.
    pub duration: Duration,
    /// Scheduled window, if already scheduled.
    pub time_window: Option<TimeWindow>,
    /// Window the customer expects the technician to arrive in.
    pub expected_arrival: Option<TimeWindow>,
    /// Service address.
    pub location: Coordinate,
    /// Customer identifier.
    pub customer_id: u64,
    /// Customer has been told the arrival time.
    pub notified: bool,
    /// Appointment must stay on its current route.
    pub locked: bool,
    /// Technician the customer asked for.
    pub preferred_tech_id: Option<u64>,
    /// Skills a technician needs to perform the service.
    pub required_skills: Vec<Skill>,
}

/// A customer service visit.
///
/// Kind, half-day flag, priority and setup time are classified once at
/// construction. Editing the description afterwards leaves them untouched;
/// call [`Appointment::reclassify`] to recompute.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fieldroute_core::{Appointment, AppointmentData, Coordinate, PriorityConfig};
///
/// let config = PriorityConfig::default();
/// let appointment = Appointment::new(
///     AppointmentData {
///         id: 7,
///         description: "Initial service".into(),
///         duration: Duration::from_secs(3600),
///         time_window: None,
///         expected_arrival: None,
///         location: Coordinate::new(30.3, -97.7),
///         customer_id: 11,
///         notified: false,
///         locked: false,
///         preferred_tech_id: None,
///         required_skills: Vec::new(),
///     },
///     &config,
/// );
/// assert_eq!(appointment.priority(), config.initial);
/// assert_eq!(appointment.setup_duration(), Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Appointment {
    /// Upstream appointment id.
    pub id: u64,
    /// Shared event attributes.
    pub details: EventDetails,
    /// Service address.
    pub location: Coordinate,
    /// Customer identifier.
    pub customer_id: u64,
    /// Customer has been told the arrival time.
    pub notified: bool,
    /// Appointment must stay on its current route.
    pub locked: bool,
    /// Technician the customer asked for.
    #[cfg_attr(feature = "serde", serde(default))]
    pub preferred_tech_id: Option<u64>,
    /// Skills a technician needs to perform the service.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_skills: Vec<Skill>,
    #[cfg_attr(feature = "serde", serde(default))]
    classification: Classification,
}

impl Appointment {
    /// Build and classify an appointment.
    #[must_use]
    pub fn new(data: AppointmentData, config: &PriorityConfig) -> Self {
        let mut details = EventDetails::new(data.description, data.duration);
        details.time_window = data.time_window;
        details.expected_arrival = data.expected_arrival;
        let mut appointment = Self {
            id: data.id,
            details,
            location: data.location,
            customer_id: data.customer_id,
            notified: data.notified,
            locked: data.locked,
            preferred_tech_id: data.preferred_tech_id,
            required_skills: data.required_skills,
            classification: Classification::default(),
        };
        appointment.reclassify(config);
        appointment
    }

    /// Set the scheduled window.
    #[must_use]
    pub fn scheduled(mut self, window: TimeWindow) -> Self {
        self.details.time_window = Some(window);
        self
    }

    /// Recompute kind, half-day flag, priority and setup time.
    pub fn reclassify(&mut self, config: &PriorityConfig) {
        self.classification = Classification::classify(
            ClassificationInput {
                description: &self.details.description,
                expected_arrival: self.details.expected_arrival.as_ref(),
                notified: self.notified,
                locked: self.locked,
            },
            config,
        );
    }

    /// Attributes fixed at the last classification.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Solver priority.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.classification.priority
    }

    /// Setup time before service starts.
    #[must_use]
    pub const fn setup_duration(&self) -> Duration {
        self.classification.setup_duration
    }

    /// Service kind.
    #[must_use]
    pub const fn kind(&self) -> AppointmentKind {
        self.classification.kind
    }

    /// Expected arrival falls within one half of the day.
    #[must_use]
    pub const fn is_half_day(&self) -> bool {
        self.classification.half_day
    }

    /// Setup plus service time.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.classification
            .setup_duration
            .saturating_add(self.details.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{appointment_data, window};
    use rstest::rstest;

    #[rstest]
    fn description_edits_do_not_reclassify() {
        let config = PriorityConfig::default();
        let mut appointment = Appointment::new(appointment_data(1, "Initial visit"), &config);
        appointment.details.description = "Quarterly".to_owned();
        assert_eq!(appointment.kind(), AppointmentKind::Initial);
        assert_eq!(appointment.priority(), config.initial);

        appointment.reclassify(&config);
        assert_eq!(appointment.kind(), AppointmentKind::Regular);
        assert_eq!(appointment.priority(), config.default);
    }

    #[rstest]
    fn half_day_follows_expected_arrival() {
        let config = PriorityConfig::default();
        let mut data = appointment_data(2, "Quarterly");
        data.expected_arrival = Some(window("13:00", "17:00"));
        let appointment = Appointment::new(data, &config);
        assert!(appointment.is_half_day());
        assert_eq!(appointment.priority(), config.half_day);
        assert_eq!(
            appointment.total_duration(),
            config.regular_setup + appointment.details.duration
        );
    }
}
