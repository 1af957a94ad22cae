//! Core types and pure functions for geoquery: coordinates, output
//! geometries, the coordinate text parser, unit handling, and geometry
//! builders. Nothing in this crate performs I/O.

pub mod coordinate;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod intent;
pub mod parse;
pub mod protocol;
pub mod units;

pub use coordinate::Coordinate;
pub use error::{GeometryError, ParseError};
pub use feature::{Contour, ContourMetric, Geometry, SelectedFeature, SessionContext};
pub use intent::{QueryIntent, QuerySubtype};
pub use parse::{parse_coordinates, parse_rings};
pub use units::ContourLimits;
