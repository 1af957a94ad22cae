use async_trait::async_trait;
use tracing::{debug, info};

use geoquery_core::geometry::{cluster_nearby_centers, generate_circle};
use geoquery_core::units::{extract_radius_km, extract_radius_pairs};
use geoquery_core::{Coordinate, Geometry, QueryIntent, QuerySubtype};

use super::{ExtractionAgent, Invocation};
use crate::AgentError;
use crate::classifier::location_count;

/// Circular buffers around a selected feature or extracted places.
pub struct BufferAgent;

impl BufferAgent {
    async fn centers(inv: &mut Invocation<'_>) -> Result<Vec<Coordinate>, AgentError> {
        if let Some(anchor) = inv.context.selection.as_ref().and_then(|s| s.anchor()) {
            debug!(lat = anchor.lat, lon = anchor.lon, "buffering the selected feature");
            inv.set_subtype(inv.request.subtype.unwrap_or(QuerySubtype::Single));
            return Ok(vec![anchor]);
        }

        let (subtype, result) = inv.extract(QueryIntent::Buffer).await?;
        let mut centers = result.coordinates;
        let places = location_count(&inv.request.user_text);
        if centers.len() > places {
            let before = centers.len();
            centers = cluster_nearby_centers(&centers, inv.config.cluster_tolerance_deg);
            info!(before, after = centers.len(), places, "clustered buffer centres");
        }
        if subtype == QuerySubtype::Single {
            centers.truncate(1);
        }
        Ok(centers)
    }
}

#[async_trait]
impl ExtractionAgent for BufferAgent {
    fn intent(&self) -> QueryIntent {
        QueryIntent::Buffer
    }

    async fn execute(&self, inv: &mut Invocation<'_>) -> Result<Vec<Geometry>, AgentError> {
        let centers = Self::centers(inv).await?;
        if centers.is_empty() {
            return Err(AgentError::NoLocation);
        }

        let user_text = &inv.request.user_text;
        let pairs = extract_radius_pairs(user_text);
        let radii: Vec<f64> = if pairs.len() == centers.len() {
            pairs.into_iter().map(|(km, _)| km).collect()
        } else {
            let km = extract_radius_km(user_text).unwrap_or(inv.config.default_radius_km);
            vec![km; centers.len()]
        };

        centers
            .into_iter()
            .zip(radii)
            .map(|(center, radius_km)| -> Result<Geometry, AgentError> {
                let ring = generate_circle(center, radius_km, inv.config.circle_points)?;
                Ok(Geometry::Buffer {
                    center,
                    radius_km,
                    ring,
                })
            })
            .collect()
    }
}
