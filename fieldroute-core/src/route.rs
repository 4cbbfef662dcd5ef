//! One technician's schedule for one service date.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    Appointment, EndLocation, Meeting, RouteGeometry, ServicePro, StartLocation, TimeWindow,
    Travel, Waiting, WorkEvent, WorkEventKind,
};

/// Upstream route identifier; also the solver's vehicle id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RouteId(u64);

impl RouteId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RouteId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shape of a route's working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RouteType {
    /// A standard working day.
    #[default]
    Regular,
    /// A shortened day.
    Short,
    /// A longer than usual day.
    Extended,
}

/// A discontinuity between two consecutive scheduled events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineGap {
    /// Unaccounted time between one event's end and the next event's start.
    Gap(TimeWindow),
    /// The next event starts before the previous one ends.
    Overlap(TimeWindow),
}

/// A technician's schedule for a day.
///
/// Events carry their own absolute windows. Insertion order is preserved
/// for rendering; use [`Route::chronological`] for time order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    /// Upstream route id.
    pub id: RouteId,
    /// Office that owns the route.
    pub office_id: u64,
    /// Service date.
    pub date: NaiveDate,
    /// Assigned technician.
    pub service_pro: ServicePro,
    /// Shape of the working day.
    #[cfg_attr(feature = "serde", serde(default))]
    pub route_type: RouteType,
    /// Appointment slots the office planned for.
    pub declared_capacity: u32,
    /// Appointment slots the solver may fill.
    pub actual_capacity: u32,
    /// Path returned by the solver.
    #[cfg_attr(feature = "serde", serde(default))]
    pub geometry: Option<RouteGeometry>,
    #[cfg_attr(feature = "serde", serde(default))]
    events: Vec<WorkEvent>,
}

impl Route {
    /// An empty route with equal declared and actual capacity.
    #[must_use]
    pub const fn new(
        id: RouteId,
        office_id: u64,
        date: NaiveDate,
        service_pro: ServicePro,
        capacity: u32,
    ) -> Self {
        Self {
            id,
            office_id,
            date,
            service_pro,
            route_type: RouteType::Regular,
            declared_capacity: capacity,
            actual_capacity: capacity,
            geometry: None,
            events: Vec::new(),
        }
    }

    /// The technician's available window.
    #[must_use]
    pub const fn working_hours(&self) -> TimeWindow {
        self.service_pro.working_hours
    }

    /// Replace the technician's available window.
    pub const fn set_working_hours(&mut self, window: TimeWindow) {
        self.service_pro.working_hours = window;
    }

    /// Events in insertion order.
    #[must_use]
    pub fn events(&self) -> &[WorkEvent] {
        &self.events
    }

    /// Events in insertion order, mutably.
    pub fn events_mut(&mut self) -> &mut [WorkEvent] {
        &mut self.events
    }

    /// Append an event and take ownership of it.
    pub fn push_event(&mut self, event: impl Into<WorkEvent>) {
        let mut event = event.into();
        event.details_mut().route_id = Some(self.id);
        self.events.push(event);
    }

    /// Replace every event.
    pub fn set_events(&mut self, events: impl IntoIterator<Item = WorkEvent>) {
        self.events.clear();
        for event in events {
            self.push_event(event);
        }
    }

    /// Remove every event.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Remove and return every event.
    pub fn take_events(&mut self) -> Vec<WorkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Appointments in insertion order.
    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> + '_ {
        self.events.iter().filter_map(WorkEvent::as_appointment)
    }

    /// Meetings in insertion order.
    pub fn meetings(&self) -> impl Iterator<Item = &Meeting> + '_ {
        self.events.iter().filter_map(|event| match event {
            WorkEvent::Meeting(meeting) => Some(meeting),
            _ => None,
        })
    }

    /// Work breaks, lunches and reserved time.
    pub fn breaks(&self) -> impl Iterator<Item = &WorkEvent> + '_ {
        self.events
            .iter()
            .filter(|event| event.is_unavailable_time())
    }

    /// Travel segments in insertion order.
    pub fn travels(&self) -> impl Iterator<Item = &Travel> + '_ {
        self.events.iter().filter_map(|event| match event {
            WorkEvent::Travel(travel) => Some(travel),
            _ => None,
        })
    }

    /// Idle periods in insertion order.
    pub fn waitings(&self) -> impl Iterator<Item = &Waiting> + '_ {
        self.events.iter().filter_map(|event| match event {
            WorkEvent::Waiting(waiting) => Some(waiting),
            _ => None,
        })
    }

    /// The start marker, if the route has been solved.
    #[must_use]
    pub fn start_location(&self) -> Option<&StartLocation> {
        self.events.iter().find_map(|event| match event {
            WorkEvent::StartLocation(start) => Some(start),
            _ => None,
        })
    }

    /// The end marker, if the route has been solved.
    #[must_use]
    pub fn end_location(&self) -> Option<&EndLocation> {
        self.events.iter().find_map(|event| match event {
            WorkEvent::EndLocation(end) => Some(end),
            _ => None,
        })
    }

    /// Events ordered by scheduled start; unscheduled events come last.
    /// Ties keep insertion order.
    #[must_use]
    pub fn chronological(&self) -> Vec<&WorkEvent> {
        let mut ordered: Vec<&WorkEvent> = self.events.iter().collect();
        ordered.sort_by_key(|event| {
            let start = event.scheduled_start();
            (start.is_none(), start)
        });
        ordered
    }

    /// Earliest scheduled appointment.
    #[must_use]
    pub fn first_appointment(&self) -> Option<&Appointment> {
        self.scheduled_appointments().next()
    }

    /// Latest scheduled appointment.
    #[must_use]
    pub fn last_appointment(&self) -> Option<&Appointment> {
        self.scheduled_appointments().last()
    }

    fn scheduled_appointments(&self) -> impl Iterator<Item = &Appointment> + '_ {
        self.chronological()
            .into_iter()
            .filter_map(WorkEvent::as_appointment)
            .filter(|appointment| appointment.details.time_window.is_some())
    }

    /// Look up an appointment by id for mutation.
    pub fn appointment_mut(&mut self, id: u64) -> Option<&mut Appointment> {
        self.events
            .iter_mut()
            .filter_map(WorkEvent::as_appointment_mut)
            .find(|appointment| appointment.id == id)
    }

    /// Appointments the solver left without a window.
    #[must_use]
    pub fn unscheduled_appointment_count(&self) -> usize {
        self.appointments()
            .filter(|appointment| appointment.details.time_window.is_none())
            .count()
    }

    /// Whether the office blocked off part of the day.
    #[must_use]
    pub fn has_reserved_time(&self) -> bool {
        self.events
            .iter()
            .any(|event| event.kind() == WorkEventKind::ReservedTime)
    }

    /// Sum of every idle period.
    #[must_use]
    pub fn total_idle(&self) -> Duration {
        self.waitings()
            .map(|waiting| waiting.details.duration)
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Span from the first scheduled start to the last scheduled end.
    #[must_use]
    pub fn elapsed(&self) -> Option<TimeWindow> {
        let mut windows = self.events.iter().filter_map(WorkEvent::time_window);
        let first = windows.next()?;
        let (start, end) = windows.fold((first.start(), first.end()), |(start, end), window| {
            (start.min(window.start()), end.max(window.end()))
        });
        TimeWindow::new(start, end).ok()
    }

    /// Gaps and overlaps between consecutive scheduled events.
    ///
    /// A freshly solved route has none.
    #[must_use]
    pub fn timeline_gaps(&self) -> Vec<TimelineGap> {
        let windows: Vec<TimeWindow> = self
            .chronological()
            .into_iter()
            .filter_map(WorkEvent::time_window)
            .collect();
        windows
            .windows(2)
            .filter_map(|pair| match pair {
                [previous, next] if next.start() > previous.end() => {
                    TimeWindow::new(previous.end(), next.start())
                        .ok()
                        .map(TimelineGap::Gap)
                }
                [previous, next] if next.start() < previous.end() => {
                    TimeWindow::new(next.start(), previous.end())
                        .ok()
                        .map(TimelineGap::Overlap)
                }
                _ => None,
            })
            .collect()
    }
}
