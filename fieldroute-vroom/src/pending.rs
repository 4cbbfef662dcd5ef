//! Bookkeeping between a request and its response.
//!
//! Every job and break sent to the solver is parked here under its solver
//! id so the response can be matched back to the original events. Ids are
//! consumed exactly once.

use std::collections::{BTreeMap, BTreeSet};

use fieldroute_core::{OptimizationError, RouteId, WorkEvent};

const MEETING_ID_OFFSET: u64 = 2_000_000_000;
const RESERVED_TIME_ID_OFFSET: u64 = 3_000_000_000;

/// Solver id of a job or break event; `None` for synthesised events.
///
/// Appointments, work breaks and lunches keep their upstream id. Meetings
/// and reserved time are shifted into their own ranges.
#[must_use]
pub fn solver_id(event: &WorkEvent) -> Option<u64> {
    match event {
        WorkEvent::Appointment(appointment) => Some(appointment.id),
        WorkEvent::WorkBreak(work_break) => Some(work_break.id),
        WorkEvent::Lunch(lunch) => Some(lunch.id),
        WorkEvent::Meeting(meeting) => Some(MEETING_ID_OFFSET.saturating_add(meeting.id)),
        WorkEvent::ReservedTime(reserved) => {
            Some(RESERVED_TIME_ID_OFFSET.saturating_add(reserved.id))
        }
        WorkEvent::Travel(_)
        | WorkEvent::Waiting(_)
        | WorkEvent::StartLocation(_)
        | WorkEvent::EndLocation(_) => None,
    }
}

/// Events awaiting a solver answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingEvents {
    jobs: BTreeMap<u64, WorkEvent>,
    breaks: BTreeMap<(u64, u64), WorkEvent>,
    excluded: BTreeMap<u64, Vec<WorkEvent>>,
    matched_jobs: BTreeSet<u64>,
}

impl PendingEvents {
    /// Number of jobs not yet matched.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Number of breaks not yet matched.
    #[must_use]
    pub fn break_count(&self) -> usize {
        self.breaks.len()
    }

    /// Breaks withheld from `vehicle` because they fall outside its window.
    #[must_use]
    pub fn excluded(&self, vehicle: u64) -> &[WorkEvent] {
        self.excluded.get(&vehicle).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn insert_job(&mut self, id: u64, event: WorkEvent) -> Result<(), OptimizationError> {
        if self.jobs.contains_key(&id) {
            return Err(OptimizationError::DuplicateEventId { id });
        }
        self.jobs.insert(id, event);
        Ok(())
    }

    pub(crate) fn insert_break(
        &mut self,
        vehicle: u64,
        id: u64,
        event: WorkEvent,
    ) -> Result<(), OptimizationError> {
        if self.breaks.contains_key(&(vehicle, id)) {
            return Err(OptimizationError::DuplicateEventId { id });
        }
        self.breaks.insert((vehicle, id), event);
        Ok(())
    }

    pub(crate) fn exclude(&mut self, vehicle: u64, event: WorkEvent) {
        self.excluded.entry(vehicle).or_default().push(event);
    }

    pub(crate) fn take_job(&mut self, id: u64) -> Result<WorkEvent, OptimizationError> {
        let event = self
            .jobs
            .remove(&id)
            .ok_or(OptimizationError::UnknownEventId { kind: "job", id })?;
        self.matched_jobs.insert(id);
        Ok(event)
    }

    pub(crate) fn take_break(&mut self, vehicle: u64, id: u64) -> Result<WorkEvent, OptimizationError> {
        self.breaks
            .remove(&(vehicle, id))
            .ok_or(OptimizationError::UnknownEventId { kind: "break", id })
    }

    pub(crate) fn take_unassigned(&mut self, id: u64) -> Result<WorkEvent, OptimizationError> {
        if self.matched_jobs.contains(&id) {
            return Err(OptimizationError::DuplicateUnassigned { id });
        }
        self.take_job(id).map_err(|_| OptimizationError::UnknownEventId {
            kind: "unassigned",
            id,
        })
    }

    /// Unmatched and excluded breaks of `vehicle`, in solver-id order.
    pub(crate) fn drain_breaks(&mut self, vehicle: u64) -> Vec<WorkEvent> {
        let ids: Vec<(u64, u64)> = self
            .breaks
            .range((vehicle, 0)..=(vehicle, u64::MAX))
            .map(|(key, _)| *key)
            .collect();
        let mut drained: Vec<WorkEvent> = ids
            .into_iter()
            .filter_map(|key| self.breaks.remove(&key))
            .collect();
        drained.extend(self.excluded.remove(&vehicle).unwrap_or_default());
        drained
    }

    /// Fail if any job was neither scheduled nor reported unassigned.
    pub(crate) fn ensure_accounted(&self, route_id: Option<RouteId>) -> Result<(), OptimizationError> {
        if self.jobs.is_empty() {
            return Ok(());
        }
        Err(OptimizationError::UnaccountedEvents {
            route_id,
            ids: self.jobs.keys().copied().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldroute_core::test_support::{appointment, window};
    use fieldroute_core::{Coordinate, Meeting, ReservedTime, WorkBreak};
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    fn solver_ids_are_partitioned_by_kind() {
        let meeting: WorkEvent =
            Meeting::new(5, "Safety", Duration::from_secs(600), Coordinate::default()).into();
        let reserved: WorkEvent = ReservedTime::new(5, "Court", window("13:00", "14:00")).into();
        let work_break: WorkEvent = WorkBreak::new(5, "Break", Duration::from_secs(900)).into();
        assert_eq!(solver_id(&appointment(5, "A").into()), Some(5));
        assert_eq!(solver_id(&work_break), Some(5));
        assert_eq!(solver_id(&meeting), Some(2_000_000_005));
        assert_eq!(solver_id(&reserved), Some(3_000_000_005));
    }

    #[rstest]
    fn jobs_are_consumed_once() {
        let mut pending = PendingEvents::default();
        pending
            .insert_job(1, appointment(1, "A").into())
            .expect("first insert");
        assert_eq!(
            pending.insert_job(1, appointment(1, "A").into()),
            Err(OptimizationError::DuplicateEventId { id: 1 })
        );
        assert!(pending.take_job(1).is_ok());
        assert_eq!(
            pending.take_job(1).err(),
            Some(OptimizationError::UnknownEventId { kind: "job", id: 1 })
        );
        assert_eq!(
            pending.take_unassigned(1).err(),
            Some(OptimizationError::DuplicateUnassigned { id: 1 })
        );
    }

    #[rstest]
    fn unmatched_jobs_are_reported() {
        let mut pending = PendingEvents::default();
        pending
            .insert_job(9, appointment(9, "A").into())
            .expect("insert");
        pending
            .insert_job(4, appointment(4, "B").into())
            .expect("insert");
        assert_eq!(
            pending.ensure_accounted(Some(RouteId::new(2))),
            Err(OptimizationError::UnaccountedEvents {
                route_id: Some(RouteId::new(2)),
                ids: vec![4, 9],
            })
        );
    }

    #[rstest]
    fn drain_returns_only_the_vehicle_breaks() {
        let mut pending = PendingEvents::default();
        let work_break = |id| WorkEvent::from(WorkBreak::new(id, "Break", Duration::from_secs(900)));
        pending.insert_break(1, 20, work_break(20)).expect("insert");
        pending.insert_break(1, 10, work_break(10)).expect("insert");
        pending.insert_break(2, 30, work_break(30)).expect("insert");
        pending.exclude(1, work_break(40));

        let drained: Vec<_> = pending.drain_breaks(1).iter().filter_map(WorkEvent::id).collect();

        assert_eq!(drained, vec![10, 20, 40]);
        assert_eq!(pending.break_count(), 1);
        assert!(pending.excluded(1).is_empty());
    }
}
