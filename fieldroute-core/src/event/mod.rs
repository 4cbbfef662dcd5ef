//! Schedulable work events.
//!
//! A route's schedule is an ordered collection of [`WorkEvent`] values. The
//! enum is closed over exactly nine variants; every variant embeds the same
//! [`EventDetails`] so common queries never need to know the variant.

mod appointment;
mod breaks;
mod markers;

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{RouteId, TimeWindow, Timestamp};

pub use appointment::{Appointment, AppointmentData};
pub use breaks::{Lunch, ReservedTime, WorkBreak};
pub use markers::{EndLocation, Meeting, StartLocation, Travel, Waiting};

/// Attributes shared by every work event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventDetails {
    /// Free-text description.
    pub description: String,
    /// How long the event takes once started.
    #[cfg_attr(feature = "serde", serde(with = "crate::time::duration_secs"))]
    pub duration: Duration,
    /// Scheduled absolute window; `None` until the event is scheduled.
    #[cfg_attr(feature = "serde", serde(default))]
    pub time_window: Option<TimeWindow>,
    /// Softer window the event should start within.
    #[cfg_attr(feature = "serde", serde(default))]
    pub expected_arrival: Option<TimeWindow>,
    /// Route that currently owns the event.
    #[cfg_attr(feature = "serde", serde(default))]
    pub route_id: Option<RouteId>,
}

impl EventDetails {
    /// Unscheduled details with a description and duration.
    pub fn new(description: impl Into<String>, duration: Duration) -> Self {
        Self {
            description: description.into(),
            duration,
            time_window: None,
            expected_arrival: None,
            route_id: None,
        }
    }

    /// Set the scheduled window.
    #[must_use]
    pub const fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    /// Set the expected-arrival window.
    #[must_use]
    pub const fn with_expected_arrival(mut self, window: TimeWindow) -> Self {
        self.expected_arrival = Some(window);
        self
    }

    /// Set the owning route.
    #[must_use]
    pub const fn with_route(mut self, route_id: RouteId) -> Self {
        self.route_id = Some(route_id);
        self
    }
}

/// Discriminant of a [`WorkEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkEventKind {
    /// Customer appointment.
    Appointment,
    /// Office meeting.
    Meeting,
    /// Lunch break.
    Lunch,
    /// Short work break.
    WorkBreak,
    /// Externally fixed unavailable time.
    ReservedTime,
    /// Driving between stops.
    Travel,
    /// Idle time reported by the solver.
    Waiting,
    /// Route start marker.
    StartLocation,
    /// Route end marker.
    EndLocation,
}

impl fmt::Display for WorkEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Appointment => "appointment",
            Self::Meeting => "meeting",
            Self::Lunch => "lunch",
            Self::WorkBreak => "work_break",
            Self::ReservedTime => "reserved_time",
            Self::Travel => "travel",
            Self::Waiting => "waiting",
            Self::StartLocation => "start_location",
            Self::EndLocation => "end_location",
        };
        f.write_str(name)
    }
}

/// Any schedulable unit of time on a route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum WorkEvent {
    /// Customer appointment.
    Appointment(Appointment),
    /// Office meeting.
    Meeting(Meeting),
    /// Lunch break.
    Lunch(Lunch),
    /// Short work break.
    WorkBreak(WorkBreak),
    /// Externally fixed unavailable time.
    ReservedTime(ReservedTime),
    /// Driving between stops; synthesised from solver output.
    Travel(Travel),
    /// Idle time; synthesised from solver output.
    Waiting(Waiting),
    /// Route start marker.
    StartLocation(StartLocation),
    /// Route end marker.
    EndLocation(EndLocation),
}

macro_rules! each_variant {
    ($event:expr, $inner:ident => $body:expr) => {
        match $event {
            WorkEvent::Appointment($inner) => $body,
            WorkEvent::Meeting($inner) => $body,
            WorkEvent::Lunch($inner) => $body,
            WorkEvent::WorkBreak($inner) => $body,
            WorkEvent::ReservedTime($inner) => $body,
            WorkEvent::Travel($inner) => $body,
            WorkEvent::Waiting($inner) => $body,
            WorkEvent::StartLocation($inner) => $body,
            WorkEvent::EndLocation($inner) => $body,
        }
    };
}

impl WorkEvent {
    /// Variant discriminant.
    #[must_use]
    pub const fn kind(&self) -> WorkEventKind {
        match self {
            Self::Appointment(_) => WorkEventKind::Appointment,
            Self::Meeting(_) => WorkEventKind::Meeting,
            Self::Lunch(_) => WorkEventKind::Lunch,
            Self::WorkBreak(_) => WorkEventKind::WorkBreak,
            Self::ReservedTime(_) => WorkEventKind::ReservedTime,
            Self::Travel(_) => WorkEventKind::Travel,
            Self::Waiting(_) => WorkEventKind::Waiting,
            Self::StartLocation(_) => WorkEventKind::StartLocation,
            Self::EndLocation(_) => WorkEventKind::EndLocation,
        }
    }

    /// Shared attributes.
    #[must_use]
    pub const fn details(&self) -> &EventDetails {
        each_variant!(self, inner => &inner.details)
    }

    /// Shared attributes, mutably.
    pub const fn details_mut(&mut self) -> &mut EventDetails {
        each_variant!(self, inner => &mut inner.details)
    }

    /// Upstream or synthetic identifier; markers have none.
    #[must_use]
    pub const fn id(&self) -> Option<u64> {
        match self {
            Self::Appointment(inner) => Some(inner.id),
            Self::Meeting(inner) => Some(inner.id),
            Self::Lunch(inner) => Some(inner.id),
            Self::WorkBreak(inner) => Some(inner.id),
            Self::ReservedTime(inner) => Some(inner.id),
            Self::Travel(inner) => Some(inner.id),
            Self::Waiting(inner) => Some(inner.id),
            Self::StartLocation(_) | Self::EndLocation(_) => None,
        }
    }

    /// Scheduled window, if any.
    #[must_use]
    pub const fn time_window(&self) -> Option<TimeWindow> {
        self.details().time_window
    }

    /// Expected-arrival window, if any.
    #[must_use]
    pub const fn expected_arrival(&self) -> Option<TimeWindow> {
        self.details().expected_arrival
    }

    /// Scheduled start, if any.
    #[must_use]
    pub fn scheduled_start(&self) -> Option<Timestamp> {
        self.time_window().map(|window| window.start())
    }

    /// Configured duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.details().duration
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.details().description
    }

    /// Owning route.
    #[must_use]
    pub const fn route_id(&self) -> Option<RouteId> {
        self.details().route_id
    }

    /// Whether this is a work break or lunch.
    #[must_use]
    pub const fn is_break(&self) -> bool {
        matches!(self, Self::WorkBreak(_) | Self::Lunch(_))
    }

    /// Whether the technician is unavailable for work: breaks, lunch or
    /// reserved time.
    #[must_use]
    pub const fn is_unavailable_time(&self) -> bool {
        matches!(
            self,
            Self::WorkBreak(_) | Self::Lunch(_) | Self::ReservedTime(_)
        )
    }

    /// Whether the solver schedules this event as a job.
    #[must_use]
    pub const fn is_job(&self) -> bool {
        matches!(self, Self::Appointment(_) | Self::Meeting(_))
    }

    /// Borrow the appointment payload.
    #[must_use]
    pub const fn as_appointment(&self) -> Option<&Appointment> {
        match self {
            Self::Appointment(inner) => Some(inner),
            _ => None,
        }
    }

    /// Mutably borrow the appointment payload.
    pub const fn as_appointment_mut(&mut self) -> Option<&mut Appointment> {
        match self {
            Self::Appointment(inner) => Some(inner),
            _ => None,
        }
    }

    /// Minimum appointments that must precede a break or lunch.
    #[must_use]
    pub const fn min_appointments_before(&self) -> Option<u32> {
        match self {
            Self::WorkBreak(inner) => inner.min_appointments_before,
            Self::Lunch(inner) => inner.min_appointments_before,
            _ => None,
        }
    }

    /// Record the minimum appointments preceding a break or lunch.
    ///
    /// Returns `false` when the event is not a break or lunch.
    pub const fn set_min_appointments_before(&mut self, count: u32) -> bool {
        match self {
            Self::WorkBreak(inner) => {
                inner.min_appointments_before = Some(count);
                true
            }
            Self::Lunch(inner) => {
                inner.min_appointments_before = Some(count);
                true
            }
            _ => false,
        }
    }
}

impl From<Appointment> for WorkEvent {
    fn from(value: Appointment) -> Self {
        Self::Appointment(value)
    }
}

impl From<Meeting> for WorkEvent {
    fn from(value: Meeting) -> Self {
        Self::Meeting(value)
    }
}

impl From<Lunch> for WorkEvent {
    fn from(value: Lunch) -> Self {
        Self::Lunch(value)
    }
}

impl From<WorkBreak> for WorkEvent {
    fn from(value: WorkBreak) -> Self {
        Self::WorkBreak(value)
    }
}

impl From<ReservedTime> for WorkEvent {
    fn from(value: ReservedTime) -> Self {
        Self::ReservedTime(value)
    }
}

impl From<Travel> for WorkEvent {
    fn from(value: Travel) -> Self {
        Self::Travel(value)
    }
}

impl From<Waiting> for WorkEvent {
    fn from(value: Waiting) -> Self {
        Self::Waiting(value)
    }
}

impl From<StartLocation> for WorkEvent {
    fn from(value: StartLocation) -> Self {
        Self::StartLocation(value)
    }
}

impl From<EndLocation> for WorkEvent {
    fn from(value: EndLocation) -> Self {
        Self::EndLocation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, window};
    use rstest::rstest;

    #[rstest]
    fn clones_do_not_share_windows() {
        let original: WorkEvent = WorkBreak::new(1, "Break", Duration::from_secs(900))
            .scheduled(window("10:00", "10:15"))
            .into();
        let mut copy = original.clone();
        copy.details_mut().time_window = Some(window("11:00", "11:15"));
        assert_eq!(original.scheduled_start(), Some(at("10:00")));
        assert_eq!(copy.scheduled_start(), Some(at("11:00")));
    }

    #[rstest]
    fn only_breaks_and_lunch_accept_minimum_appointments() {
        let mut lunch: WorkEvent = Lunch::new(2, "Lunch", Duration::from_secs(1800)).into();
        let mut reserved: WorkEvent =
            ReservedTime::new(3, "Dentist", window("13:00", "14:00")).into();
        assert!(lunch.set_min_appointments_before(2));
        assert_eq!(lunch.min_appointments_before(), Some(2));
        assert!(!reserved.set_min_appointments_before(2));
        assert_eq!(reserved.min_appointments_before(), None);
    }

    #[rstest]
    fn partitions_by_variant() {
        let lunch: WorkEvent = Lunch::new(2, "Lunch", Duration::from_secs(1800)).into();
        let reserved: WorkEvent = ReservedTime::new(3, "Dentist", window("13:00", "14:00")).into();
        assert!(lunch.is_break());
        assert!(lunch.is_unavailable_time());
        assert!(!reserved.is_break());
        assert!(reserved.is_unavailable_time());
        assert_eq!(reserved.kind().to_string(), "reserved_time");
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn events_serialise_with_type_tag() {
        let event: WorkEvent = Waiting::new(4, window("09:00", "09:10")).into();
        let json = serde_json::to_value(&event).expect("serialise");
        assert_eq!(json["type"], "waiting");
        assert_eq!(json["details"]["duration"], 600);
        let parsed: WorkEvent = serde_json::from_value(json).expect("deserialise");
        assert_eq!(parsed, event);
    }
}
