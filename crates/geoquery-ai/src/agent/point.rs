use async_trait::async_trait;
use tracing::warn;

use geoquery_core::{Geometry, QueryIntent, QuerySubtype};

use super::{ExtractionAgent, Invocation};
use crate::AgentError;

/// One marker per extracted place.
pub struct PointAgent;

#[async_trait]
impl ExtractionAgent for PointAgent {
    fn intent(&self) -> QueryIntent {
        QueryIntent::Point
    }

    async fn execute(&self, inv: &mut Invocation<'_>) -> Result<Vec<Geometry>, AgentError> {
        let (subtype, result) = inv.extract(QueryIntent::Point).await?;
        let mut coords = result.coordinates;
        if subtype == QuerySubtype::Single && coords.len() > 1 {
            warn!(found = coords.len(), "single point query produced several, keeping the first");
            coords.truncate(1);
        }
        Ok(coords
            .into_iter()
            .map(|coord| Geometry::Marker { coord })
            .collect())
    }
}
