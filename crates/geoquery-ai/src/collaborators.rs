//! Contracts for everything outside the extraction core.
//!
//! The core only talks to these traits. Network-backed implementations live
//! in `geoquery-client`; tests use in-memory stubs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use geoquery_core::{Contour, Coordinate, Geometry, SelectedFeature};

use crate::keywords::has_any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion service unavailable: {0}")]
    Unavailable(String),

    #[error("completion service returned an empty answer")]
    Empty,
}

/// Stateless text completion. The full conversation is sent on every call.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Cycling => "cycling",
        }
    }

    /// Mode implied by the wording of a query; driving unless the text says
    /// otherwise.
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if has_any(&lower, &["walk", "walking", "on foot", "foot", "stroll"]) {
            Self::Walking
        } else if has_any(
            &lower,
            &["cycle", "cycling", "bike", "biking", "bicycle", "cyclist"],
        ) {
            Self::Cycling
        } else {
            Self::Driving
        }
    }
}

/// A road-snapped path from the routing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub geometry: Vec<Coordinate>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Routing service. `None` means the route could not be computed.
#[async_trait]
pub trait Routing: Send + Sync {
    async fn route(&self, waypoints: &[Coordinate], mode: TravelMode) -> Option<RouteResult>;
}

/// Isochrone thresholds: either all times or all distances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourValues {
    Minutes(Vec<u32>),
    Meters(Vec<u32>),
}

impl ContourValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Minutes(v) | Self::Meters(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsochroneRequest {
    pub mode: TravelMode,
    pub values: ContourValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsochroneResponse {
    pub contours: Vec<Contour>,
}

/// Isochrone service. `None` means no contours could be computed.
#[async_trait]
pub trait Isochrone: Send + Sync {
    async fn compute(
        &self,
        center: Coordinate,
        request: &IsochroneRequest,
    ) -> Option<IsochroneResponse>;
}

/// Terrain height lookup in metres. `None` means no data at that point.
pub trait Terrain: Send + Sync {
    fn elevation_at(&self, coord: Coordinate) -> Option<f64>;
}

/// The feature currently selected on the map, if any.
pub trait FeatureSelection: Send + Sync {
    fn current(&self) -> Option<SelectedFeature>;
}

/// Live user position and map viewport.
pub trait PositionSource: Send + Sync {
    fn user_position(&self) -> Option<Coordinate>;
    fn viewport_center(&self) -> Option<Coordinate>;
}

/// Map surface. Fire-and-forget from the core's perspective.
pub trait MapRenderer: Send + Sync {
    fn render(&self, geometry: &Geometry);
}

/// The services an agent invocation calls out to.
#[derive(Clone)]
pub struct Collaborators {
    pub completion: Arc<dyn TextCompletion>,
    pub routing: Arc<dyn Routing>,
    pub isochrone: Arc<dyn Isochrone>,
    pub terrain: Arc<dyn Terrain>,
    pub renderer: Arc<dyn MapRenderer>,
}
