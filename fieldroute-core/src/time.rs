//! Absolute time windows and duration helpers.
//!
//! Every instant in the domain carries its own UTC offset so that calendar
//! arithmetic (start of day, midday) happens in the office's local time
//! without consulting a separate timezone database.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An instant in the office's local offset.
pub type Timestamp = DateTime<FixedOffset>;

/// Errors returned when building or shifting a [`TimeWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    /// The window would end before it starts.
    #[error("time window start {start} is after its end {end}")]
    StartAfterEnd {
        /// Requested start.
        start: Timestamp,
        /// Requested end.
        end: Timestamp,
    },
    /// Shifting an instant left the representable range.
    #[error("time arithmetic overflowed")]
    Overflow,
}

/// A closed interval `[start, end]` with `start <= end`.
///
/// Windows are plain values: copying one never aliases another route's
/// schedule.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::DateTime;
/// use fieldroute_core::TimeWindow;
///
/// let start = DateTime::parse_from_rfc3339("2024-03-05T08:00:00-05:00").unwrap();
/// let window = TimeWindow::starting_at(start, Duration::from_secs(1800)).unwrap();
/// assert_eq!(window.duration(), Duration::from_secs(1800));
/// assert!(window.contains(start));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTimeWindow"))]
pub struct TimeWindow {
    start: Timestamp,
    end: Timestamp,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawTimeWindow {
    start: Timestamp,
    end: Timestamp,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = TimeWindowError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Validates and constructs a [`TimeWindow`].
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, TimeWindowError> {
        if start > end {
            return Err(TimeWindowError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a window of `duration` beginning at `start`.
    pub fn starting_at(start: Timestamp, duration: Duration) -> Result<Self, TimeWindowError> {
        let end = add_duration(start, duration)?;
        Self::new(start, end)
    }

    /// Build a window spanning `before` ahead of and `after` past `center`.
    pub fn around(
        center: Timestamp,
        before: Duration,
        after: Duration,
    ) -> Result<Self, TimeWindowError> {
        Self::new(sub_duration(center, before)?, add_duration(center, after)?)
    }

    /// A zero-length window at `instant`.
    #[must_use]
    pub const fn instant(instant: Timestamp) -> Self {
        Self {
            start: instant,
            end: instant,
        }
    }

    /// Inclusive start of the window.
    #[must_use]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Inclusive end of the window.
    #[must_use]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Length of the window.
    #[must_use]
    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }

    /// Whether `instant` lies within the window, bounds included.
    #[must_use]
    pub fn contains(&self, instant: Timestamp) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Whether `other` lies entirely within this window.
    #[must_use]
    pub fn contains_window(&self, other: &Self) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    /// Whether the two windows share any non-empty interval.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Instant halfway between start and end.
    #[must_use]
    pub fn midpoint(&self) -> Timestamp {
        self.start + (self.end - self.start) / 2
    }

    /// Copy of this window with a different end.
    pub fn with_end(&self, end: Timestamp) -> Result<Self, TimeWindowError> {
        Self::new(self.start, end)
    }

    /// Local midnight at the start of the window's first day.
    #[must_use]
    pub fn day_start(&self) -> Timestamp {
        self.start - self.start.time().signed_duration_since(NaiveTime::MIN)
    }

    /// Local noon of the window's first day.
    #[must_use]
    pub fn midday(&self) -> Timestamp {
        self.day_start() + TimeDelta::hours(12)
    }

    /// Last second of the window's first day.
    #[must_use]
    pub fn day_end(&self) -> Timestamp {
        self.day_start() + TimeDelta::days(1) - TimeDelta::seconds(1)
    }

    /// The whole calendar day containing the window's start.
    #[must_use]
    pub fn whole_day(&self) -> Self {
        Self {
            start: self.day_start(),
            end: self.day_end(),
        }
    }
}

/// Shift `instant` forwards by `duration`.
pub fn add_duration(instant: Timestamp, duration: Duration) -> Result<Timestamp, TimeWindowError> {
    let delta = TimeDelta::from_std(duration).map_err(|_| TimeWindowError::Overflow)?;
    instant
        .checked_add_signed(delta)
        .ok_or(TimeWindowError::Overflow)
}

/// Shift `instant` backwards by `duration`.
pub fn sub_duration(instant: Timestamp, duration: Duration) -> Result<Timestamp, TimeWindowError> {
    let delta = TimeDelta::from_std(duration).map_err(|_| TimeWindowError::Overflow)?;
    instant
        .checked_sub_signed(delta)
        .ok_or(TimeWindowError::Overflow)
}

/// Serialise [`Duration`] values as whole seconds.
#[cfg(feature = "serde")]
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
