//! The lat/lon value type shared by every stage of the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// A WGS84 position in decimal degrees.
///
/// Construction through [`Coordinate::new`] enforces the range invariant
/// (`lat ∈ [-90, 90]`, `lon ∈ [-180, 180]`). Generated ring vertices may sit
/// slightly outside that range near the poles and antimeridian, so the fields
/// stay public for geometry code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Null-island box used by the artifact filter, in degrees.
const ORIGIN_ARTIFACT_DEG: f64 = 0.1;

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeometryError> {
        let c = Self { lat, lon };
        if c.in_range() {
            Ok(c)
        } else {
            Err(GeometryError::OutOfRange { lat, lon })
        }
    }

    /// Whether both axes are finite and inside the WGS84 bounds.
    pub fn in_range(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Best-effort filter for values a language model emits when it has no
    /// real answer: exactly `(1, 0)`, or within 0.1° of `(0, 0)` on both axes.
    ///
    /// Legitimate positions in the Gulf of Guinea are rejected too.
    pub fn is_plausible(&self) -> bool {
        if !self.in_range() {
            return false;
        }
        if self.lat == 1.0 && self.lon == 0.0 {
            return false;
        }
        !(self.lat.abs() < ORIGIN_ARTIFACT_DEG && self.lon.abs() < ORIGIN_ARTIFACT_DEG)
    }

    /// Render order used by map surfaces and GeoJSON: `[lon, lat]`.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}
