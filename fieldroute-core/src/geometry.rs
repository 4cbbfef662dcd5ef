//! Encoded route geometry returned by the solver.
//!
//! The solver encodes each route's path as a precision-5 polyline. The
//! encoded text is kept verbatim on the route and decoded into a
//! [`LineString`] only when a caller needs the points.

use geo::LineString;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PRECISION: u32 = 5;

/// Errors raised while decoding a [`RouteGeometry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The text is not a valid precision-5 polyline.
    #[error("malformed polyline: {reason}")]
    Malformed {
        /// Decoder message.
        reason: String,
    },
}

/// Polyline-encoded path of a solved route.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RouteGeometry(String);

impl RouteGeometry {
    /// Wrap an encoded polyline.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The encoded text as received.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.0
    }

    /// Decode the polyline into longitude/latitude points.
    ///
    /// # Errors
    ///
    /// [`GeometryError::Malformed`] when the text is not a valid polyline.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldroute_core::RouteGeometry;
    ///
    /// let line = RouteGeometry::new("_p~iF~ps|U_ulLnnqC").decode().unwrap();
    /// let first = line.0[0];
    /// assert!((first.y - 38.5).abs() < 1e-9);
    /// assert!((first.x + 120.2).abs() < 1e-9);
    /// ```
    pub fn decode(&self) -> Result<LineString<f64>, GeometryError> {
        polyline::decode_polyline(&self.0, PRECISION).map_err(|err| GeometryError::Malformed {
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[rstest]
    fn decodes_reference_polyline() {
        let line = RouteGeometry::new("_p~iF~ps|U_ulLnnqC_mqNvxq`@")
            .decode()
            .expect("valid polyline");
        let points: Vec<_> = line.coords().copied().collect();
        assert_eq!(points.len(), 3);
        assert_close(points[0].y, 38.5);
        assert_close(points[0].x, -120.2);
        assert_close(points[1].y, 40.7);
        assert_close(points[1].x, -120.95);
        assert_close(points[2].y, 43.252);
        assert_close(points[2].x, -126.453);
    }

    #[rstest]
    fn empty_polyline_has_no_points() {
        let line = RouteGeometry::new("").decode().expect("empty is valid");
        assert_eq!(line.coords().count(), 0);
    }

    #[rstest]
    #[case::missing_longitude("_p~iF")]
    #[case::outside_alphabet("_p~iF ps|U")]
    fn rejects_malformed_input(#[case] encoded: &str) {
        let err = RouteGeometry::new(encoded).decode().expect_err("malformed");
        assert!(matches!(err, GeometryError::Malformed { .. }));
        assert!(err.to_string().starts_with("malformed polyline"));
    }
}
