//! Deterministic fixtures shared by unit and behaviour tests.
//!
//! Every instant lives on 2024-03-05 at UTC-05:00 and is written as a
//! literal `HH:MM`.
#![expect(
    clippy::expect_used,
    clippy::missing_panics_doc,
    reason = "fixtures parse literal times supplied by tests"
)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, NaiveTime};

use crate::{
    Appointment, AppointmentData, Coordinate, Engine, Office, OptimizationEngine,
    OptimizationError, OptimizationState, OptimizationStatus, PriorityConfig, Route, RouteId,
    ServicePro, TimeWindow, Timestamp, WorkEvent,
};

/// Technicians start and end here unless a test says otherwise.
pub const HOME: Coordinate = Coordinate::new(30.27, -97.74);

/// The service date of every fixture.
#[must_use]
pub fn service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
}

/// The office offset of every fixture.
#[must_use]
pub fn offset() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).expect("valid offset")
}

/// `HH:MM` on the service date.
#[must_use]
pub fn at(time: &str) -> Timestamp {
    let parsed = NaiveTime::parse_from_str(time, "%H:%M").expect("HH:MM literal");
    service_date()
        .and_time(parsed)
        .and_local_timezone(offset())
        .single()
        .expect("fixed offsets are unambiguous")
}

/// `[start, end]` on the service date.
#[must_use]
pub fn window(start: &str, end: &str) -> TimeWindow {
    TimeWindow::new(at(start), at(end)).expect("ordered literal window")
}

/// The office every fixture belongs to.
#[must_use]
pub fn office() -> Office {
    Office {
        id: 1,
        name: "Austin".to_owned(),
        utc_offset_seconds: -5 * 3600,
    }
}

/// A technician working `hours` from [`HOME`].
#[must_use]
pub fn service_pro(id: u64, hours: TimeWindow) -> ServicePro {
    ServicePro::new(id, format!("Pro {id}"), HOME, HOME, hours)
}

/// Thirty-minute appointment data at [`HOME`].
#[must_use]
pub fn appointment_data(id: u64, description: &str) -> AppointmentData {
    AppointmentData {
        id,
        description: description.to_owned(),
        duration: Duration::from_secs(30 * 60),
        time_window: None,
        expected_arrival: None,
        location: HOME,
        customer_id: id,
        notified: false,
        locked: false,
        preferred_tech_id: None,
        required_skills: Vec::new(),
    }
}

/// An unscheduled thirty-minute appointment classified with defaults.
#[must_use]
pub fn appointment(id: u64, description: &str) -> Appointment {
    Appointment::new(appointment_data(id, description), &PriorityConfig::default())
}

/// Builds routes for the fixture office and date.
#[derive(Debug)]
pub struct RouteBuilder {
    id: u64,
    hours: TimeWindow,
    capacity: u32,
    events: Vec<WorkEvent>,
}

impl RouteBuilder {
    /// A route working 08:00 to 17:00 with capacity 10.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            hours: window("08:00", "17:00"),
            capacity: 10,
            events: Vec::new(),
        }
    }

    /// Override working hours.
    #[must_use]
    pub fn hours(mut self, start: &str, end: &str) -> Self {
        self.hours = window(start, end);
        self
    }

    /// Override capacity.
    #[must_use]
    pub const fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Append an event.
    #[must_use]
    pub fn event(mut self, event: impl Into<WorkEvent>) -> Self {
        self.events.push(event.into());
        self
    }

    /// Finish the route; the technician id equals the route id.
    #[must_use]
    pub fn build(self) -> Route {
        let mut route = Route::new(
            RouteId::new(self.id),
            office().id,
            service_date(),
            service_pro(self.id, self.hours),
            self.capacity,
        );
        route.set_events(self.events);
        route
    }
}

type RouteHandler = dyn Fn(&Route) -> Result<Route, OptimizationError> + Send + Sync;

/// Engine double that counts calls and answers single-route requests with a
/// closure.
pub struct StubEngine {
    engine: Engine,
    single_route_calls: AtomicUsize,
    optimize_calls: AtomicUsize,
    handler: Box<RouteHandler>,
}

impl std::fmt::Debug for StubEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubEngine")
            .field("engine", &self.engine)
            .field("single_route_calls", &self.single_route_calls)
            .field("optimize_calls", &self.optimize_calls)
            .finish_non_exhaustive()
    }
}

impl StubEngine {
    /// Returns every route unchanged.
    #[must_use]
    pub fn identity(engine: Engine) -> Self {
        Self::with_handler(engine, |route| Ok(route.clone()))
    }

    /// Answers single-route calls with `handler`; whole runs are solved by
    /// applying `handler` to every route of a derived POST state.
    pub fn with_handler(
        engine: Engine,
        handler: impl Fn(&Route) -> Result<Route, OptimizationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            engine,
            single_route_calls: AtomicUsize::new(0),
            optimize_calls: AtomicUsize::new(0),
            handler: Box::new(handler),
        }
    }

    /// Number of single-route calls so far.
    #[must_use]
    pub fn single_route_calls(&self) -> usize {
        self.single_route_calls.load(Ordering::SeqCst)
    }

    /// Number of whole-run calls so far.
    #[must_use]
    pub fn optimize_calls(&self) -> usize {
        self.optimize_calls.load(Ordering::SeqCst)
    }
}

impl OptimizationEngine for StubEngine {
    fn engine(&self) -> Engine {
        self.engine
    }

    fn optimize(&self, state: &OptimizationState) -> Result<OptimizationState, OptimizationError> {
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        let mut post = state.derive(OptimizationStatus::Post)?;
        post.routes = post
            .routes
            .iter()
            .map(|route| (self.handler)(route))
            .collect::<Result<_, _>>()?;
        Ok(post)
    }

    fn optimize_single_route(&self, route: &Route) -> Result<Route, OptimizationError> {
        self.single_route_calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(route)
    }
}
