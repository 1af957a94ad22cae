//! Per-intent extraction agents.
//!
//! Each agent turns one classified query into zero or more [`Geometry`]
//! overlays. Point, line, buffer and polygon agents share the
//! [`ExtractionLoop`]; isochrone and elevation agents skip it. Every
//! invocation ends in an [`AgentReport`]; errors are recorded there, never
//! raised.

pub mod buffer;
pub mod elevation;
pub mod extraction;
pub mod isochrone;
pub mod line;
pub mod point;
pub mod polygon;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use tracing::{info, warn};

use geoquery_core::{Geometry, QueryIntent, QuerySubtype, SessionContext};

use crate::cancel::CancelToken;
use crate::collaborators::Collaborators;
use crate::config::AgentConfig;
use crate::AgentError;

pub use buffer::BufferAgent;
pub use elevation::{ElevationAgent, ElevationProfile, ProfileSample};
pub use extraction::{Cardinality, CardinalityMismatch, ExtractionLoop, ExtractionResult};
pub use isochrone::IsochroneAgent;
pub use line::LineAgent;
pub use point::PointAgent;
pub use polygon::PolygonAgent;

/// The query text an agent works from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub user_text: String,
    /// The upstream AI answer shown to the user for this turn.
    pub ai_text: String,
    /// Subtype from the classifier; `None` makes the agent plan its own.
    pub subtype: Option<QuerySubtype>,
}

impl AgentRequest {
    pub fn new(user_text: impl Into<String>, ai_text: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            ai_text: ai_text.into(),
            subtype: None,
        }
    }

    pub fn with_subtype(mut self, subtype: QuerySubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }
}

/// Outcome of one agent invocation.
#[derive(Debug)]
pub struct AgentReport {
    pub intent: QueryIntent,
    pub subtype: Option<QuerySubtype>,
    /// Geometries handed to the renderer; empty on failure.
    pub geometries: Vec<Geometry>,
    pub extraction: Option<ExtractionResult>,
    pub profile: Option<ElevationProfile>,
    pub error: Option<AgentError>,
}

impl AgentReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one agent invocation reads, plus the slots it fills in for
/// the report.
pub struct Invocation<'a> {
    pub collab: &'a Collaborators,
    pub config: &'a AgentConfig,
    pub request: &'a AgentRequest,
    pub context: &'a SessionContext,
    pub cancel: &'a CancelToken,
    subtype: Option<QuerySubtype>,
    extraction: Option<ExtractionResult>,
    profile: Option<ElevationProfile>,
}

impl<'a> Invocation<'a> {
    pub fn extraction_loop(&self, intent: QueryIntent) -> ExtractionLoop<'a> {
        ExtractionLoop::new(self.collab.completion.as_ref(), self.cancel, intent)
    }

    /// PLAN then the extraction loop, recording subtype and result.
    pub async fn extract(
        &mut self,
        intent: QueryIntent,
    ) -> Result<(QuerySubtype, ExtractionResult), AgentError> {
        let mut lp = self.extraction_loop(intent);
        let subtype = lp.resolve_subtype(self.request).await?;
        self.subtype = Some(subtype);
        let result = lp.run(self.request, subtype).await?;
        self.extraction = Some(result.clone());
        Ok((subtype, result))
    }

    pub fn set_subtype(&mut self, subtype: QuerySubtype) {
        self.subtype = Some(subtype);
    }

    pub fn set_profile(&mut self, profile: ElevationProfile) {
        self.profile = Some(profile);
    }
}

/// One intent's extraction strategy.
#[async_trait]
pub trait ExtractionAgent: Send + Sync {
    fn intent(&self) -> QueryIntent;

    /// Produce the geometries to render. Rendering itself happens in
    /// [`Agents::run`] after a final cancellation check.
    async fn execute(&self, inv: &mut Invocation<'_>) -> Result<Vec<Geometry>, AgentError>;
}

static POINT: PointAgent = PointAgent;
static LINE: LineAgent = LineAgent;
static BUFFER: BufferAgent = BufferAgent;
static POLYGON: PolygonAgent = PolygonAgent;
static ISOCHRONE: IsochroneAgent = IsochroneAgent;
static ELEVATION: ElevationAgent = ElevationAgent;

pub fn agent_for(intent: QueryIntent) -> &'static dyn ExtractionAgent {
    match intent {
        QueryIntent::Point => &POINT,
        QueryIntent::Line => &LINE,
        QueryIntent::Buffer => &BUFFER,
        QueryIntent::Polygon => &POLYGON,
        QueryIntent::Isochrone => &ISOCHRONE,
        QueryIntent::Elevation => &ELEVATION,
    }
}

/// Dispatches classified queries to their agents.
#[derive(Clone)]
pub struct Agents {
    collab: Collaborators,
    config: AgentConfig,
}

impl Agents {
    pub fn new(collab: Collaborators, config: AgentConfig) -> Self {
        Self { collab, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the agent for `intent` to completion and render its output.
    ///
    /// Never fails: errors, including cancellation, end up in the report.
    pub async fn run(
        &self,
        intent: QueryIntent,
        request: &AgentRequest,
        context: &SessionContext,
        cancel: &CancelToken,
    ) -> AgentReport {
        let agent = agent_for(intent);
        let mut inv = Invocation {
            collab: &self.collab,
            config: &self.config,
            request,
            context,
            cancel,
            subtype: request.subtype,
            extraction: None,
            profile: None,
        };
        let outcome = match agent.execute(&mut inv).await {
            Ok(geometries) => self.deliver(&geometries, cancel).map(|()| geometries),
            Err(err) => Err(err),
        };

        let mut report = AgentReport {
            intent,
            subtype: inv.subtype,
            geometries: Vec::new(),
            extraction: inv.extraction,
            profile: inv.profile,
            error: None,
        };
        match outcome {
            Ok(geometries) => {
                info!(intent = %intent, count = geometries.len(), "agent rendered geometries");
                report.geometries = geometries;
            }
            Err(AgentError::Cancelled) => {
                info!(intent = %intent, "agent cancelled, nothing rendered");
                report.error = Some(AgentError::Cancelled);
            }
            Err(err) => {
                warn!(intent = %intent, error = %err, "agent failed");
                report.error = Some(err);
            }
        }
        report
    }

    fn deliver(&self, geometries: &[Geometry], cancel: &CancelToken) -> Result<(), AgentError> {
        cancel.check()?;
        for geometry in geometries {
            self.collab.renderer.render(geometry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::Harness;
    use geoquery_core::Coordinate;

    #[tokio::test]
    async fn report_carries_extraction() {
        let h = Harness::new(&["48.8566,2.3522"]);
        let req = AgentRequest::new("where is paris", "It is the capital of France.")
            .with_subtype(QuerySubtype::Single);
        let report = h.run(QueryIntent::Point, &req).await;
        assert!(report.success(), "{:?}", report.error);
        assert_eq!(
            report.geometries,
            vec![Geometry::Marker {
                coord: Coordinate { lat: 48.8566, lon: 2.3522 }
            }]
        );
        assert!(report.extraction.is_some());
        assert_eq!(h.renderer.rendered().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_invocation_renders_nothing() {
        let h = Harness::new(&["48.8566,2.3522"]);
        let req = AgentRequest::new("where is paris", "").with_subtype(QuerySubtype::Single);
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = h
            .agents
            .run(QueryIntent::Point, &req, &SessionContext::default(), &cancel)
            .await;
        assert!(matches!(report.error, Some(AgentError::Cancelled)));
        assert!(h.renderer.rendered().is_empty());
    }

    #[tokio::test]
    async fn completion_outage_is_a_soft_failure() {
        let h = Harness::new(&[]);
        let req = AgentRequest::new("where is paris", "").with_subtype(QuerySubtype::Single);
        let report = h.run(QueryIntent::Point, &req).await;
        assert!(!report.success());
        assert!(matches!(report.error, Some(AgentError::Completion(_))));
        assert!(h.renderer.rendered().is_empty());
    }

    #[test]
    fn every_intent_has_an_agent() {
        for intent in [
            QueryIntent::Point,
            QueryIntent::Line,
            QueryIntent::Buffer,
            QueryIntent::Polygon,
            QueryIntent::Isochrone,
            QueryIntent::Elevation,
        ] {
            assert_eq!(agent_for(intent).intent(), intent);
        }
    }
}
