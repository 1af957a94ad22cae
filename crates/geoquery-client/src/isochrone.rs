//! Mapbox-style isochrones.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use geoquery_ai::{ContourValues, Isochrone, IsochroneRequest, IsochroneResponse};
use geoquery_core::{Contour, ContourMetric, Coordinate};

use crate::error::{ClientError, http_client, success_body, trim_base};

pub struct IsochroneClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    properties: Properties,
    geometry: PolygonGeometry,
}

#[derive(Deserialize)]
struct Properties {
    contour: f64,
}

#[derive(Deserialize)]
struct PolygonGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

impl PolygonGeometry {
    /// Outer ring of a Polygon geometry; other geometry types yield nothing.
    fn outer_ring(self) -> Option<Vec<Coordinate>> {
        if self.kind != "Polygon" {
            return None;
        }
        let rings: Vec<Vec<[f64; 2]>> = serde_json::from_value(self.coordinates).ok()?;
        let outer = rings.into_iter().next()?;
        Some(
            outer
                .into_iter()
                .map(|[lon, lat]| Coordinate { lat, lon })
                .collect(),
        )
    }
}

fn parse_contours(body: &str, metric: ContourMetric) -> Result<Vec<Contour>, ClientError> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    let mut contours: Vec<Contour> = collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let value = feature.properties.contour.round() as u32;
            let ring = feature.geometry.outer_ring()?;
            Some(Contour {
                value,
                metric,
                ring,
            })
        })
        .collect();
    contours.sort_by_key(|c| c.value);
    Ok(contours)
}

impl IsochroneClient {
    /// `base_url` is the API root, e.g. `https://api.mapbox.com`.
    pub fn new(base_url: &str, access_token: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            base_url: trim_base(base_url),
            access_token: access_token.into(),
        })
    }

    pub fn isochrone_url(&self, center: Coordinate, request: &IsochroneRequest) -> String {
        let (param, values) = match &request.values {
            ContourValues::Minutes(v) => ("contours_minutes", v),
            ContourValues::Meters(v) => ("contours_meters", v),
        };
        let values = values
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/isochrone/v1/mapbox/{}/{},{}?{}={}&polygons=true&access_token={}",
            self.base_url,
            request.mode.as_str(),
            center.lon,
            center.lat,
            param,
            values,
            self.access_token
        )
    }

    async fn fetch(
        &self,
        center: Coordinate,
        request: &IsochroneRequest,
    ) -> Result<Vec<Contour>, ClientError> {
        let metric = match request.values {
            ContourValues::Minutes(_) => ContourMetric::Minutes,
            ContourValues::Meters(_) => ContourMetric::Meters,
        };
        let url = self.isochrone_url(center, request);
        info!(
            lat = center.lat,
            lon = center.lon,
            mode = request.mode.as_str(),
            "requesting isochrone"
        );
        let body = success_body(self.client.get(&url).send().await?).await?;
        parse_contours(&body, metric)
    }
}

#[async_trait]
impl Isochrone for IsochroneClient {
    async fn compute(
        &self,
        center: Coordinate,
        request: &IsochroneRequest,
    ) -> Option<IsochroneResponse> {
        match self.fetch(center, request).await {
            Ok(contours) if !contours.is_empty() => Some(IsochroneResponse { contours }),
            Ok(_) => {
                warn!("isochrone service returned no polygons");
                None
            }
            Err(err) => {
                warn!(error = %err, "isochrone request failed");
                None
            }
        }
    }
}
