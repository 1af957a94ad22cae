//! OSRM-style routing.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use geoquery_ai::{RouteResult, Routing, TravelMode};
use geoquery_core::Coordinate;

use crate::error::{ClientError, http_client, success_body, trim_base};

pub struct RoutingClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: LineGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Deserialize)]
struct LineGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// First route of an OSRM response, or `None` if the service found none.
fn parse_route(body: &str) -> Result<Option<RouteResult>, ClientError> {
    let resp: OsrmResponse = serde_json::from_str(body)?;
    if resp.code != "Ok" {
        return Ok(None);
    }
    Ok(resp.routes.into_iter().next().map(|route| RouteResult {
        geometry: route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| Coordinate { lat, lon })
            .collect(),
        distance_meters: route.distance,
        duration_seconds: route.duration,
    }))
}

impl RoutingClient {
    /// `base_url` is the server root, e.g. `https://router.project-osrm.org`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            base_url: trim_base(base_url),
        })
    }

    pub fn route_url(&self, waypoints: &[Coordinate], mode: TravelMode) -> String {
        let path = waypoints
            .iter()
            .map(|c| format!("{},{}", c.lon, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url,
            mode.as_str(),
            path
        )
    }

    async fn fetch(
        &self,
        waypoints: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Option<RouteResult>, ClientError> {
        let url = self.route_url(waypoints, mode);
        info!(url = %url, waypoints = waypoints.len(), "requesting route");
        let body = success_body(self.client.get(&url).send().await?).await?;
        parse_route(&body)
    }
}

#[async_trait]
impl Routing for RoutingClient {
    async fn route(&self, waypoints: &[Coordinate], mode: TravelMode) -> Option<RouteResult> {
        match self.fetch(waypoints, mode).await {
            Ok(route) => route,
            Err(err) => {
                warn!(error = %err, "routing request failed");
                None
            }
        }
    }
}
