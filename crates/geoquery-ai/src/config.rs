//! Tunables for the extraction agents.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use geoquery_core::ContourLimits;
use geoquery_core::geometry::{DEFAULT_CIRCLE_POINTS, DEFAULT_CLUSTER_TOLERANCE_DEG};

/// Agent configuration. Every field has a default, so a JSON file only
/// needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Segments in a buffer ring (the ring has one more vertex).
    pub circle_points: usize,
    /// Box half-width, in degrees, for merging over-extracted centres.
    pub cluster_tolerance_deg: f64,
    /// Buffer radius when the query names none.
    pub default_radius_km: f64,
    pub max_contours: usize,
    pub max_minutes: u32,
    pub max_meters: u32,
    /// Isochrone threshold when the query names neither time nor distance.
    pub default_minutes: u32,
    /// Points sampled along a path for an elevation profile.
    pub elevation_samples: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let limits = ContourLimits::default();
        Self {
            circle_points: DEFAULT_CIRCLE_POINTS,
            cluster_tolerance_deg: DEFAULT_CLUSTER_TOLERANCE_DEG,
            default_radius_km: 5.0,
            max_contours: limits.max_count,
            max_minutes: limits.max_minutes,
            max_meters: limits.max_meters,
            default_minutes: 10,
            elevation_samples: 100,
        }
    }
}

impl AgentConfig {
    /// Load overrides from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading agent config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing agent config {}", path.display()))?;
        anyhow::ensure!(config.circle_points >= 3, "circle_points must be at least 3");
        anyhow::ensure!(config.default_radius_km > 0.0, "default_radius_km must be positive");
        anyhow::ensure!(config.max_contours >= 1, "max_contours must be at least 1");
        Ok(config)
    }

    pub fn contour_limits(&self) -> ContourLimits {
        ContourLimits {
            max_count: self.max_contours,
            max_minutes: self.max_minutes,
            max_meters: self.max_meters,
        }
    }
}
