use async_trait::async_trait;
use tracing::warn;

use geoquery_core::geometry::build_ring;
use geoquery_core::{Geometry, GeometryError, QueryIntent, QuerySubtype};

use super::{ExtractionAgent, Invocation};
use crate::AgentError;

/// Closed polygons from `||`-separated rings.
///
/// Rings with fewer than three distinct vertices are dropped. A single
/// subtype keeps only the first valid ring.
pub struct PolygonAgent;

#[async_trait]
impl ExtractionAgent for PolygonAgent {
    fn intent(&self) -> QueryIntent {
        QueryIntent::Polygon
    }

    async fn execute(&self, inv: &mut Invocation<'_>) -> Result<Vec<Geometry>, AgentError> {
        let (subtype, result) = inv.extract(QueryIntent::Polygon).await?;
        let rings = if result.rings.is_empty() {
            vec![result.coordinates]
        } else {
            result.rings
        };

        let mut valid = Vec::new();
        let mut last_err = None;
        for (index, ring) in rings.into_iter().enumerate() {
            match build_ring(ring) {
                Ok(ring) => valid.push(ring),
                Err(err) => {
                    warn!(ring = index, error = %err, "dropping invalid polygon ring");
                    last_err = Some(err);
                }
            }
        }

        if valid.is_empty() {
            let err = last_err.unwrap_or(GeometryError::TooFewVertices {
                shape: "polygon",
                required: 3,
                found: 0,
            });
            return Err(err.into());
        }
        if subtype == QuerySubtype::Single {
            valid.truncate(1);
        }
        Ok(valid
            .into_iter()
            .map(|ring| Geometry::Polygon { ring })
            .collect())
    }
}
