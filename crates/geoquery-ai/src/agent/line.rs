use async_trait::async_trait;
use tracing::{info, warn};

use geoquery_core::{Geometry, GeometryError, QueryIntent};

use super::{ExtractionAgent, Invocation};
use crate::AgentError;
use crate::collaborators::TravelMode;

/// Routes or straight polylines between extracted places.
///
/// Route subtypes go through the routing collaborator; when it has no
/// answer the agent falls back to a straight line through the same points.
pub struct LineAgent;

#[async_trait]
impl ExtractionAgent for LineAgent {
    fn intent(&self) -> QueryIntent {
        QueryIntent::Line
    }

    async fn execute(&self, inv: &mut Invocation<'_>) -> Result<Vec<Geometry>, AgentError> {
        let (subtype, result) = inv.extract(QueryIntent::Line).await?;
        let mut coords = result.coordinates;

        if !subtype.is_multiple() && coords.len() > 2 {
            warn!(found = coords.len(), "single line produced extra points, keeping the endpoints");
            let (first, last) = (coords[0], coords[coords.len() - 1]);
            coords = vec![first, last];
        }
        if coords.len() < 2 {
            return Err(GeometryError::TooFewVertices {
                shape: "line",
                required: 2,
                found: coords.len(),
            }
            .into());
        }

        if subtype.is_route() {
            let mode = TravelMode::from_text(&inv.request.user_text);
            let routed = inv.collab.routing.route(&coords, mode).await;
            inv.cancel.check()?;
            match routed {
                Some(route) if route.geometry.len() >= 2 => {
                    info!(
                        mode = mode.as_str(),
                        distance_m = route.distance_meters,
                        duration_s = route.duration_seconds,
                        "route computed"
                    );
                    return Ok(vec![Geometry::Line {
                        coords: route.geometry,
                        is_route: true,
                    }]);
                }
                _ => warn!(mode = mode.as_str(), "routing unavailable, drawing a straight line"),
            }
        }

        Ok(vec![Geometry::Line {
            coords,
            is_route: false,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRequest;
    use crate::agent::testing::Harness;
    use crate::classifier::classify;
    use crate::collaborators::RouteResult;
    use geoquery_core::{Coordinate, QuerySubtype};

    const SF_LA: &str = "San Francisco is at 37.7749, -122.4194 and Los Angeles is at \
                         34.0522, -118.2437.";

    fn routed() -> RouteResult {
        RouteResult {
            geometry: vec![
                Coordinate { lat: 37.7749, lon: -122.4194 },
                Coordinate { lat: 35.3733, lon: -119.0187 },
                Coordinate { lat: 34.0522, lon: -118.2437 },
            ],
            distance_meters: 615_000.0,
            duration_seconds: 21_600.0,
        }
    }

    #[tokio::test]
    async fn route_reuses_answer_and_calls_routing() {
        let user = "show me route from San Francisco to Los Angeles";
        let class = classify(user, SF_LA);
        assert_eq!(class.intent, QueryIntent::Line);
        assert_eq!(class.subtype, QuerySubtype::RouteSingle);

        let h = Harness::with_route(&[], Some(routed()));
        let req = AgentRequest::new(user, SF_LA).with_subtype(class.subtype);
        let report = h.run(class.intent, &req).await;

        assert!(report.success(), "{:?}", report.error);
        assert_eq!(h.completion.call_count(), 0);
        let extraction = report.extraction.as_ref().unwrap();
        assert!(!extraction.refined);
        assert_eq!(extraction.coordinates.len(), 2);

        let calls = h.routing.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.len(), 2);
        assert_eq!(calls[0].1, TravelMode::Driving);
        assert!(matches!(
            &report.geometries[0],
            Geometry::Line { is_route: true, coords } if coords.len() == 3
        ));
    }

    #[tokio::test]
    async fn one_pair_refines_once_then_fails() {
        let h = Harness::new(&["40.7,-74.0", "40.7,-74.0"]);
        let req = AgentRequest::new("route from new york to boston", "Happy to help.")
            .with_subtype(QuerySubtype::RouteSingle);
        let report = h.run(QueryIntent::Line, &req).await;

        assert_eq!(h.completion.call_count(), 2);
        assert!(report.extraction.as_ref().unwrap().refined);
        assert!(matches!(
            report.error,
            Some(AgentError::InvalidGeometry(GeometryError::TooFewVertices {
                shape: "line",
                found: 1,
                ..
            }))
        ));
        assert!(h.renderer.rendered().is_empty());
        assert!(h.routing.calls().is_empty());
    }

    #[tokio::test]
    async fn routing_failure_degrades_to_straight_line() {
        let h = Harness::with_route(&[], None);
        let req = AgentRequest::new("drive from san francisco to los angeles", SF_LA)
            .with_subtype(QuerySubtype::RouteSingle);
        let report = h.run(QueryIntent::Line, &req).await;
        assert!(report.success());
        assert_eq!(h.routing.calls().len(), 1);
        assert!(matches!(
            &report.geometries[0],
            Geometry::Line { is_route: false, coords } if coords.len() == 2
        ));
    }

    #[tokio::test]
    async fn transport_verb_routes_without_a_subtype() {
        let h = Harness::with_route(&["no", "40.7,-74.0 | 42.36,-71.06"], Some(routed()));
        let req = AgentRequest::new("drive from new york to boston", "");
        let report = h.run(QueryIntent::Line, &req).await;

        assert!(report.success(), "{:?}", report.error);
        assert_eq!(report.subtype, Some(QuerySubtype::RouteSingle));
        assert_eq!(h.routing.calls().len(), 1);
        assert!(matches!(
            &report.geometries[0],
            Geometry::Line { is_route: true, .. }
        ));
    }

    #[tokio::test]
    async fn direct_line_skips_routing() {
        let h = Harness::with_route(&[], Some(routed()));
        let req = AgentRequest::new("line between san francisco and los angeles", SF_LA)
            .with_subtype(QuerySubtype::DirectSingle);
        let report = h.run(QueryIntent::Line, &req).await;
        assert!(report.success());
        assert!(h.routing.calls().is_empty());
    }

    #[tokio::test]
    async fn single_keeps_endpoints() {
        let three = "37.77,-122.42 | 36.6,-121.9 | 34.05,-118.24";
        let h = Harness::new(&[three, three]);
        let req = AgentRequest::new("line from sf to la", "").with_subtype(QuerySubtype::DirectSingle);
        let report = h.run(QueryIntent::Line, &req).await;
        assert!(report.success());
        let Geometry::Line { coords, .. } = &report.geometries[0] else {
            panic!("expected a line");
        };
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[1], Coordinate { lat: 34.05, lon: -118.24 });
    }
}
