//! Query intent and cardinality subtype, produced once per user utterance.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse category of a spatial query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    Point,
    Line,
    Buffer,
    Polygon,
    Isochrone,
    Elevation,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Buffer => "buffer",
            Self::Polygon => "polygon",
            Self::Isochrone => "isochrone",
            Self::Elevation => "elevation",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cardinality/shape discriminator within an intent.
///
/// Line queries use the four route/direct variants; every other intent uses
/// `Single` or `Multiple`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuerySubtype {
    Single,
    Multiple,
    RouteSingle,
    RouteMulti,
    DirectSingle,
    DirectMulti,
}

impl QuerySubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
            Self::RouteSingle => "route-single",
            Self::RouteMulti => "route-multi",
            Self::DirectSingle => "direct-single",
            Self::DirectMulti => "direct-multi",
        }
    }

    /// Build the line variant for a routing decision and multiplicity.
    pub fn line(is_route: bool, multi: bool) -> Self {
        match (is_route, multi) {
            (true, false) => Self::RouteSingle,
            (true, true) => Self::RouteMulti,
            (false, false) => Self::DirectSingle,
            (false, true) => Self::DirectMulti,
        }
    }

    /// Whether more than one primitive (or a multi-stop path) is expected.
    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple | Self::RouteMulti | Self::DirectMulti)
    }

    /// Whether the subtype asks for a road-snapped route.
    pub fn is_route(&self) -> bool {
        matches!(self, Self::RouteSingle | Self::RouteMulti)
    }
}

impl fmt::Display for QuerySubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_variants() {
        assert_eq!(QuerySubtype::line(true, false), QuerySubtype::RouteSingle);
        assert_eq!(QuerySubtype::line(false, true), QuerySubtype::DirectMulti);
        assert!(QuerySubtype::RouteMulti.is_route());
        assert!(QuerySubtype::RouteMulti.is_multiple());
        assert!(!QuerySubtype::DirectSingle.is_route());
    }

    #[test]
    fn subtype_serializes_kebab_case() {
        let json = serde_json::to_string(&QuerySubtype::RouteSingle).unwrap();
        assert_eq!(json, "\"route-single\"");
        let intent = serde_json::to_string(&QueryIntent::Isochrone).unwrap();
        assert_eq!(intent, "\"isochrone\"");
    }
}
