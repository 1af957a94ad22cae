//! In-memory collaborators for agent tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use geoquery_core::geometry::generate_circle;
use geoquery_core::{
    Contour, ContourMetric, Coordinate, Geometry, QueryIntent, SessionContext,
};

use super::{AgentReport, AgentRequest, Agents};
use crate::cancel::CancelToken;
use crate::collaborators::{
    Collaborators, CompletionError, ContourValues, Isochrone, IsochroneRequest,
    IsochroneResponse, MapRenderer, RouteResult, Routing, Terrain, TextCompletion, TravelMode,
    Turn,
};
use crate::config::AgentConfig;

/// Replies from a fixed script, recording every conversation it receives.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedCompletion {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(turns.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CompletionError::Unavailable("script exhausted".into()))
    }
}

#[derive(Default)]
pub struct StubRouting {
    result: Option<RouteResult>,
    calls: Mutex<Vec<(Vec<Coordinate>, TravelMode)>>,
}

impl StubRouting {
    pub fn calls(&self) -> Vec<(Vec<Coordinate>, TravelMode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Routing for StubRouting {
    async fn route(&self, waypoints: &[Coordinate], mode: TravelMode) -> Option<RouteResult> {
        self.calls.lock().unwrap().push((waypoints.to_vec(), mode));
        self.result.clone()
    }
}

/// Answers with one circle per requested threshold unless built failing.
pub struct StubIsochrone {
    fail: bool,
    requests: Mutex<Vec<(Coordinate, IsochroneRequest)>>,
}

impl StubIsochrone {
    pub fn requests(&self) -> Vec<(Coordinate, IsochroneRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Isochrone for StubIsochrone {
    async fn compute(
        &self,
        center: Coordinate,
        request: &IsochroneRequest,
    ) -> Option<IsochroneResponse> {
        self.requests.lock().unwrap().push((center, request.clone()));
        if self.fail {
            return None;
        }
        let (metric, values) = match &request.values {
            ContourValues::Minutes(v) => (ContourMetric::Minutes, v),
            ContourValues::Meters(v) => (ContourMetric::Meters, v),
        };
        let contours = values
            .iter()
            .map(|&value| Contour {
                value,
                metric,
                ring: generate_circle(center, f64::from(value) / 10.0, 16).unwrap_or_default(),
            })
            .collect();
        Some(IsochroneResponse { contours })
    }
}

/// Height rises one metre per kilometre east of the prime meridian.
pub struct SlopeTerrain;

impl Terrain for SlopeTerrain {
    fn elevation_at(&self, coord: Coordinate) -> Option<f64> {
        Some(coord.lon * 111.0)
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<Geometry>>,
}

impl RecordingRenderer {
    pub fn rendered(&self) -> Vec<Geometry> {
        self.rendered.lock().unwrap().clone()
    }
}

impl MapRenderer for RecordingRenderer {
    fn render(&self, geometry: &Geometry) {
        self.rendered.lock().unwrap().push(geometry.clone());
    }
}

/// Agents wired to stub collaborators, with handles for assertions.
pub struct Harness {
    pub completion: Arc<ScriptedCompletion>,
    pub routing: Arc<StubRouting>,
    pub isochrone: Arc<StubIsochrone>,
    pub renderer: Arc<RecordingRenderer>,
    pub agents: Agents,
}

impl Harness {
    pub fn new(replies: &[&str]) -> Self {
        Self::build(replies, None, false)
    }

    pub fn with_route(replies: &[&str], route: Option<RouteResult>) -> Self {
        Self::build(replies, route, false)
    }

    pub fn failing_isochrone() -> Self {
        Self::build(&[], None, true)
    }

    fn build(replies: &[&str], route: Option<RouteResult>, isochrone_fails: bool) -> Self {
        let completion = ScriptedCompletion::new(replies);
        let routing = Arc::new(StubRouting {
            result: route,
            calls: Mutex::new(Vec::new()),
        });
        let isochrone = Arc::new(StubIsochrone {
            fail: isochrone_fails,
            requests: Mutex::new(Vec::new()),
        });
        let renderer = Arc::new(RecordingRenderer::default());
        let collab = Collaborators {
            completion: completion.clone(),
            routing: routing.clone(),
            isochrone: isochrone.clone(),
            terrain: Arc::new(SlopeTerrain),
            renderer: renderer.clone(),
        };
        Self {
            completion,
            routing,
            isochrone,
            renderer,
            agents: Agents::new(collab, AgentConfig::default()),
        }
    }

    pub async fn run(&self, intent: QueryIntent, request: &AgentRequest) -> AgentReport {
        self.run_with(intent, request, &SessionContext::default()).await
    }

    pub async fn run_with(
        &self,
        intent: QueryIntent,
        request: &AgentRequest,
        context: &SessionContext,
    ) -> AgentReport {
        self.agents
            .run(intent, request, context, &CancelToken::new())
            .await
    }
}
