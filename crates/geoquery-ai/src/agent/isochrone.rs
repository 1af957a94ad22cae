use async_trait::async_trait;
use tracing::{debug, info};

use geoquery_core::units::{extract_distance_values, extract_time_values};
use geoquery_core::{Coordinate, Geometry, QueryIntent, QuerySubtype};

use super::extraction::plausible_coordinates;
use super::{ExtractionAgent, Invocation};
use crate::AgentError;
use crate::collaborators::{ContourValues, IsochroneRequest, TravelMode};
use crate::keywords::{HERE_ALIASES, has_any};
use crate::prompts;

/// Travel-time or travel-distance contours around one centre.
///
/// Does not use the extraction loop: the centre comes from the live
/// position, the answer text, or a single completion call.
pub struct IsochroneAgent;

impl IsochroneAgent {
    async fn center(inv: &Invocation<'_>) -> Result<Coordinate, AgentError> {
        let request = inv.request;
        if has_any(&request.user_text.to_lowercase(), HERE_ALIASES) {
            debug!("isochrone centred on the user's position");
            return inv
                .context
                .user_position
                .or(inv.context.viewport_center)
                .ok_or(AgentError::NoLocation);
        }
        if let Ok(coords) = plausible_coordinates(&request.ai_text) {
            return Ok(coords[0]);
        }

        let mut lp = inv.extraction_loop(QueryIntent::Isochrone);
        let answer = lp
            .ask(prompts::isochrone_center(&request.user_text, &request.ai_text))
            .await?;
        let coords = plausible_coordinates(&answer)?;
        Ok(coords[0])
    }

    /// Times win over distances; with neither, the configured default.
    fn values(inv: &Invocation<'_>) -> ContourValues {
        let text = format!("{} {}", inv.request.user_text, inv.request.ai_text);
        let limits = inv.config.contour_limits();
        let minutes = extract_time_values(&text, &limits);
        let meters = extract_distance_values(&text, &limits);
        if !minutes.is_empty() {
            if !meters.is_empty() {
                info!(?minutes, ?meters, "both times and distances given, using times");
            }
            ContourValues::Minutes(minutes)
        } else if !meters.is_empty() {
            ContourValues::Meters(meters)
        } else {
            ContourValues::Minutes(vec![inv.config.default_minutes])
        }
    }
}

#[async_trait]
impl ExtractionAgent for IsochroneAgent {
    fn intent(&self) -> QueryIntent {
        QueryIntent::Isochrone
    }

    async fn execute(&self, inv: &mut Invocation<'_>) -> Result<Vec<Geometry>, AgentError> {
        let center = Self::center(inv).await?;
        let values = Self::values(inv);
        let subtype = if values.len() > 1 {
            QuerySubtype::Multiple
        } else {
            QuerySubtype::Single
        };
        inv.set_subtype(inv.request.subtype.unwrap_or(subtype));

        let request = IsochroneRequest {
            mode: TravelMode::from_text(&inv.request.user_text),
            values,
        };
        info!(
            lat = center.lat,
            lon = center.lon,
            mode = request.mode.as_str(),
            contours = request.values.len(),
            "requesting isochrone"
        );
        let response = inv.collab.isochrone.compute(center, &request).await;
        inv.cancel.check()?;

        match response {
            Some(response) if !response.contours.is_empty() => Ok(vec![Geometry::IsochroneSet {
                center,
                contours: response.contours,
            }]),
            _ => Err(AgentError::Collaborator(
                "isochrone service returned no contours".into(),
            )),
        }
    }
}
