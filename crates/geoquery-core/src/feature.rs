//! Output geometries and the per-turn session snapshot.

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// What a contour threshold is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourMetric {
    Minutes,
    Meters,
}

/// One isochrone boundary at a given time or distance threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub value: u32,
    pub metric: ContourMetric,
    pub ring: Vec<Coordinate>,
}

/// A finished overlay, handed to the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Marker {
        coord: Coordinate,
    },
    Line {
        coords: Vec<Coordinate>,
        is_route: bool,
    },
    Buffer {
        center: Coordinate,
        radius_km: f64,
        ring: Vec<Coordinate>,
    },
    Polygon {
        ring: Vec<Coordinate>,
    },
    IsochroneSet {
        center: Coordinate,
        contours: Vec<Contour>,
    },
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Marker { .. } => "marker",
            Self::Line { .. } => "line",
            Self::Buffer { .. } => "buffer",
            Self::Polygon { .. } => "polygon",
            Self::IsochroneSet { .. } => "isochroneset",
        }
    }
}

/// A feature the user selected on the map in an earlier turn.
///
/// Each variant keeps the coordinates in the form the renderer stored them;
/// [`anchor`](Self::anchor) reduces them to a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SelectedFeature {
    Marker { coord: Coordinate },
    Line { coords: Vec<Coordinate> },
    Buffer { center: Coordinate, radius_km: f64 },
    Polygon { ring: Vec<Coordinate> },
    Isochrone { center: Coordinate },
}

impl SelectedFeature {
    /// Representative point of the feature.
    ///
    /// Markers use their position, buffers and isochrones their centre,
    /// lines their middle vertex, and polygons the mean of their distinct
    /// vertices (the closing duplicate is ignored).
    pub fn anchor(&self) -> Option<Coordinate> {
        match self {
            Self::Marker { coord } => Some(*coord),
            Self::Buffer { center, .. } | Self::Isochrone { center } => Some(*center),
            Self::Line { coords } => coords.get(coords.len() / 2).copied(),
            Self::Polygon { ring } => {
                let open = match (ring.first(), ring.last()) {
                    (Some(first), Some(last)) if ring.len() > 1 && first == last => {
                        &ring[..ring.len() - 1]
                    }
                    _ => &ring[..],
                };
                if open.is_empty() {
                    return None;
                }
                let n = open.len() as f64;
                let lat = open.iter().map(|c| c.lat).sum::<f64>() / n;
                let lon = open.iter().map(|c| c.lon).sum::<f64>() / n;
                Some(Coordinate { lat, lon })
            }
        }
    }

    /// The selected feature as an ordered path, if it is a line.
    pub fn path(&self) -> Option<&[Coordinate]> {
        match self {
            Self::Line { coords } => Some(coords),
            _ => None,
        }
    }
}

/// Everything an agent may read about the surrounding session.
///
/// Snapshotted once at the start of an invocation and passed by reference;
/// the core never writes to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub selection: Option<SelectedFeature>,
    pub user_position: Option<Coordinate>,
    pub viewport_center: Option<Coordinate>,
}
