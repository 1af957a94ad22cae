use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use geoquery_core::geometry::{interpolate_path, path_length_km};
use geoquery_core::{Coordinate, Geometry, QueryIntent, QuerySubtype};

use super::extraction::{Cardinality, plausible_coordinates};
use super::{ExtractionAgent, Invocation};
use crate::AgentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    pub coord: Coordinate,
    pub distance_km: f64,
    /// `None` where the terrain source has no data.
    pub elevation_m: Option<f64>,
}

/// Terrain heights sampled along a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    pub samples: Vec<ProfileSample>,
    pub min_m: Option<f64>,
    pub max_m: Option<f64>,
    /// Sum of climbs between consecutive known samples.
    pub gain_m: f64,
    pub loss_m: f64,
    pub length_km: f64,
}

impl ElevationProfile {
    pub fn build(
        path: &[Coordinate],
        samples: usize,
        height: impl Fn(Coordinate) -> Option<f64>,
    ) -> Self {
        let samples: Vec<ProfileSample> = interpolate_path(path, samples)
            .into_iter()
            .map(|(coord, distance_km)| ProfileSample {
                coord,
                distance_km,
                elevation_m: height(coord),
            })
            .collect();

        let known: Vec<f64> = samples.iter().filter_map(|s| s.elevation_m).collect();
        let min_m = known.iter().copied().reduce(f64::min);
        let max_m = known.iter().copied().reduce(f64::max);
        let (mut gain_m, mut loss_m) = (0.0, 0.0);
        for w in known.windows(2) {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                gain_m += delta;
            } else {
                loss_m -= delta;
            }
        }

        Self {
            samples,
            min_m,
            max_m,
            gain_m,
            loss_m,
            length_km: path_length_km(path),
        }
    }
}

/// Elevation profile along a selected line or the answer's coordinates.
///
/// No completion calls; fewer than two points fails immediately.
pub struct ElevationAgent;

#[async_trait]
impl ExtractionAgent for ElevationAgent {
    fn intent(&self) -> QueryIntent {
        QueryIntent::Elevation
    }

    async fn execute(&self, inv: &mut Invocation<'_>) -> Result<Vec<Geometry>, AgentError> {
        inv.set_subtype(QuerySubtype::Single);
        let path: Vec<Coordinate> = match inv.context.selection.as_ref().and_then(|s| s.path()) {
            Some(path) => path.to_vec(),
            None => plausible_coordinates(&inv.request.ai_text).unwrap_or_default(),
        };
        Cardinality::AtLeast(2).check(path.len())?;

        let terrain = &inv.collab.terrain;
        let profile = ElevationProfile::build(&path, inv.config.elevation_samples, |c| {
            terrain.elevation_at(c)
        });
        info!(
            length_km = profile.length_km,
            gain_m = profile.gain_m,
            loss_m = profile.loss_m,
            "elevation profile sampled"
        );
        inv.set_profile(profile);

        Ok(vec![Geometry::Line {
            coords: path,
            is_route: false,
        }])
    }
}
