//! GeoJSON output for rendered geometries.

use std::sync::{Mutex, PoisonError};

use serde_json::{Value, json};

use geoquery_ai::MapRenderer;
use geoquery_core::{Coordinate, Geometry};

fn positions(coords: &[Coordinate]) -> Vec<[f64; 2]> {
    coords.iter().map(Coordinate::lon_lat).collect()
}

fn feature(geometry: Value, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": properties,
    })
}

/// GeoJSON features for one geometry. Isochrone sets expand to one
/// polygon per contour.
pub fn features(geometry: &Geometry) -> Vec<Value> {
    match geometry {
        Geometry::Marker { coord } => vec![feature(
            json!({"type": "Point", "coordinates": coord.lon_lat()}),
            json!({"kind": "marker"}),
        )],
        Geometry::Line { coords, is_route } => vec![feature(
            json!({"type": "LineString", "coordinates": positions(coords)}),
            json!({"kind": "line", "is_route": is_route}),
        )],
        Geometry::Buffer {
            center,
            radius_km,
            ring,
        } => vec![feature(
            json!({"type": "Polygon", "coordinates": [positions(ring)]}),
            json!({"kind": "buffer", "center": center.lon_lat(), "radius_km": radius_km}),
        )],
        Geometry::Polygon { ring } => vec![feature(
            json!({"type": "Polygon", "coordinates": [positions(ring)]}),
            json!({"kind": "polygon"}),
        )],
        Geometry::IsochroneSet { center, contours } => contours
            .iter()
            .map(|contour| {
                feature(
                    json!({"type": "Polygon", "coordinates": [positions(&contour.ring)]}),
                    json!({
                        "kind": "isochrone",
                        "center": center.lon_lat(),
                        "contour": contour.value,
                        "metric": contour.metric,
                    }),
                )
            })
            .collect(),
    }
}

/// Collects everything rendered during a turn as GeoJSON features.
#[derive(Debug, Default)]
pub struct GeoJsonRenderer {
    features: Mutex<Vec<Value>>,
}

impl GeoJsonRenderer {
    pub fn feature_collection(&self) -> Value {
        let features = self
            .features
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        json!({"type": "FeatureCollection", "features": features})
    }
}

impl MapRenderer for GeoJsonRenderer {
    fn render(&self, geometry: &Geometry) {
        self.features
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(features(geometry));
    }
}
