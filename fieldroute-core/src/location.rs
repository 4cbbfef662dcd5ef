//! Places, distances and offices.

use std::ops::Add;

use chrono::FixedOffset;
use geo::{Coord, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A WGS84 position.
///
/// The solver speaks `[longitude, latitude]`; the domain always names the
/// axes explicitly so the two orders cannot be confused.
///
/// # Examples
///
/// ```
/// use fieldroute_core::Coordinate;
///
/// let austin = Coordinate::from_lon_lat([-97.7, 30.3]);
/// assert_eq!(austin.latitude, 30.3);
/// assert_eq!(austin.longitude, -97.7);
/// assert_eq!(austin.to_lon_lat(), [-97.7, 30.3]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// Degrees north of the equator.
    pub latitude: f64,
    /// Degrees east of Greenwich.
    pub longitude: f64,
}

impl Coordinate {
    /// Construct a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Construct a coordinate from a solver `[longitude, latitude]` pair.
    #[must_use]
    pub const fn from_lon_lat(pair: [f64; 2]) -> Self {
        let [longitude, latitude] = pair;
        Self::new(latitude, longitude)
    }

    /// Solver-ordered `[longitude, latitude]` pair.
    #[must_use]
    pub const fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Geometry point with `x = longitude` and `y = latitude`.
    #[must_use]
    pub fn to_point(self) -> Point<f64> {
        Point::from(Coord::from(self))
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(value: Coordinate) -> Self {
        Self {
            x: value.longitude,
            y: value.latitude,
        }
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(value: Coord<f64>) -> Self {
        Self::new(value.y, value.x)
    }
}

/// A travelled distance in whole meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Distance(u64);

impl Distance {
    /// No distance.
    pub const ZERO: Self = Self(0);

    /// Construct a distance from meters.
    #[must_use]
    pub const fn from_meters(meters: u64) -> Self {
        Self(meters)
    }

    /// Distance in meters.
    #[must_use]
    pub const fn meters(self) -> u64 {
        self.0
    }

    /// Difference between two distances, clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Distance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

/// The branch office that owns routes and sets their local time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Office {
    /// Upstream office identifier.
    pub id: u64,
    /// Human-readable office name.
    pub name: String,
    /// Offset of the office's local time from UTC, in seconds.
    pub utc_offset_seconds: i32,
}

impl Office {
    /// The office's local offset, if the stored value is in range.
    #[must_use]
    pub fn timezone(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn solver_pair_swaps_axes() {
        let coordinate = Coordinate::from_lon_lat([-97.7, 30.3]);
        assert_eq!(coordinate.latitude, 30.3);
        assert_eq!(coordinate.longitude, -97.7);
    }

    #[rstest]
    fn geo_conversion_uses_x_for_longitude() {
        let coord: Coord<f64> = Coordinate::new(30.3, -97.7).into();
        assert_eq!(coord.x, -97.7);
        assert_eq!(coord.y, 30.3);
        assert_eq!(Coordinate::from(coord), Coordinate::new(30.3, -97.7));
    }

    #[rstest]
    #[case(-18_000, true)]
    #[case(0, true)]
    #[case(90_000, false)]
    fn office_timezone_validates_offset(#[case] offset: i32, #[case] valid: bool) {
        let office = Office {
            id: 1,
            name: "Austin".to_owned(),
            utc_offset_seconds: offset,
        };
        assert_eq!(office.timezone().is_some(), valid);
    }

    #[rstest]
    fn distance_difference_saturates() {
        let short = Distance::from_meters(100);
        let long = Distance::from_meters(350);
        assert_eq!(long.saturating_sub(short).meters(), 250);
        assert_eq!(short.saturating_sub(long), Distance::ZERO);
    }
}
