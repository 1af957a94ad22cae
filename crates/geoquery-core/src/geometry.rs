//! Pure numeric routines: circle rings, ring closure, centre clustering,
//! great-circle distance, and path sampling.

use std::f64::consts::PI;

use crate::{Coordinate, GeometryError};

/// Kilometres per degree of latitude used for buffer rings.
const KM_PER_DEGREE: f64 = 111.0;

/// Mean Earth radius for haversine distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_CIRCLE_POINTS: usize = 64;
pub const DEFAULT_CLUSTER_TOLERANCE_DEG: f64 = 0.5;

/// Approximate a circle of `radius_km` around `center` as a closed ring.
///
/// Samples `num_points + 1` angles evenly over `[0, 2π]`, so the last vertex
/// lands on the first. Fewer than three segments is an error. Longitude
/// offsets are scaled by `cos(lat)`; near the poles that factor approaches
/// zero and the ring degenerates.
pub fn generate_circle(
    center: Coordinate,
    radius_km: f64,
    num_points: usize,
) -> Result<Vec<Coordinate>, GeometryError> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(GeometryError::InvalidRadius(radius_km));
    }
    if num_points < 3 {
        return Err(GeometryError::TooFewVertices {
            shape: "circle",
            required: 3,
            found: num_points,
        });
    }

    let lat_offset = radius_km / KM_PER_DEGREE;
    let lon_offset = radius_km / (KM_PER_DEGREE * center.lat.to_radians().cos());

    let mut ring: Vec<Coordinate> = (0..=num_points)
        .map(|i| {
            let theta = (i as f64 / num_points as f64) * 2.0 * PI;
            Coordinate {
                lat: center.lat + lat_offset * theta.sin(),
                lon: center.lon + lon_offset * theta.cos(),
            }
        })
        .collect();

    // sin(2π) is not exactly zero in floating point.
    ring[num_points] = ring[0];
    Ok(ring)
}

/// Append the first vertex if the ring is not already closed.
pub fn close_polygon(mut ring: Vec<Coordinate>) -> Vec<Coordinate> {
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last())
        && first != last
    {
        ring.push(first);
    }
    ring
}

/// Validate and close a polygon ring.
///
/// Requires at least three distinct vertices; duplicates anywhere in the
/// input do not count towards that minimum.
pub fn build_ring(vertices: Vec<Coordinate>) -> Result<Vec<Coordinate>, GeometryError> {
    let distinct = count_distinct(&vertices);
    if distinct < 3 {
        return Err(GeometryError::TooFewVertices {
            shape: "polygon",
            required: 3,
            found: distinct,
        });
    }
    Ok(close_polygon(vertices))
}

fn count_distinct(coords: &[Coordinate]) -> usize {
    let mut seen: Vec<Coordinate> = Vec::with_capacity(coords.len());
    for c in coords {
        if !seen.contains(c) {
            seen.push(*c);
        }
    }
    seen.len()
}

/// Greedy single-pass box clustering.
///
/// Takes the first unclustered point, absorbs every other point with
/// `|Δlat| < tolerance` and `|Δlon| < tolerance`, keeps the first-seen point
/// as the cluster's representative, and repeats on what is left.
pub fn cluster_nearby_centers(centers: &[Coordinate], tolerance_deg: f64) -> Vec<Coordinate> {
    let mut clustered = vec![false; centers.len()];
    let mut representatives = Vec::new();

    for i in 0..centers.len() {
        if clustered[i] {
            continue;
        }
        clustered[i] = true;
        let seed = centers[i];
        for j in (i + 1)..centers.len() {
            if clustered[j] {
                continue;
            }
            let other = centers[j];
            if (seed.lat - other.lat).abs() < tolerance_deg
                && (seed.lon - other.lon).abs() < tolerance_deg
            {
                clustered[j] = true;
            }
        }
        representatives.push(seed);
    }

    representatives
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Total length of a polyline in kilometres.
pub fn path_length_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

/// `samples` points evenly spaced by distance along `path`, each paired with
/// its distance from the start in kilometres.
///
/// Interpolation is linear in degrees within each segment. The first and
/// last samples are the path's endpoints.
pub fn interpolate_path(path: &[Coordinate], samples: usize) -> Vec<(Coordinate, f64)> {
    match path {
        [] => return Vec::new(),
        [only] => return vec![(*only, 0.0)],
        _ => {}
    }
    let samples = samples.max(2);

    let seg_lengths: Vec<f64> = path.windows(2).map(|w| haversine_km(w[0], w[1])).collect();
    let total: f64 = seg_lengths.iter().sum();
    if total == 0.0 {
        return vec![(path[0], 0.0)];
    }

    let mut out = Vec::with_capacity(samples);
    let mut seg = 0;
    let mut seg_start = 0.0;
    for i in 0..samples {
        let target = total * i as f64 / (samples - 1) as f64;
        while seg < seg_lengths.len() - 1 && seg_start + seg_lengths[seg] < target {
            seg_start += seg_lengths[seg];
            seg += 1;
        }
        let len = seg_lengths[seg];
        let t = if len > 0.0 {
            ((target - seg_start) / len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (a, b) = (path[seg], path[seg + 1]);
        let point = Coordinate {
            lat: a.lat + (b.lat - a.lat) * t,
            lon: a.lon + (b.lon - a.lon) * t,
        };
        out.push((point, target));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn circle_has_n_plus_one_closed_points() {
        for &n in &[8usize, 32, 64] {
            let ring = generate_circle(c(40.0, -74.0), 50.0, n).unwrap();
            assert_eq!(ring.len(), n + 1);
            assert_eq!(ring[0], ring[n]);
        }
    }

    #[test]
    fn circle_points_within_radius() {
        let center = c(40.0, -74.0);
        let r = 50.0;
        let ring = generate_circle(center, r, 64).unwrap();
        for p in &ring {
            let d = haversine_km(center, *p);
            // 111 km/degree is a slight underestimate of the true degree length.
            assert!(d <= r * 1.01, "vertex {p:?} at {d} km exceeds {r} km");
            assert!(d >= r * 0.98, "vertex {p:?} at {d} km is well inside {r} km");
        }
    }

    #[test]
    fn circle_is_centred() {
        let center = c(-33.87, 151.21);
        let ring = generate_circle(center, 5.0, 64).unwrap();
        let open = &ring[..64];
        let lat = open.iter().map(|p| p.lat).sum::<f64>() / 64.0;
        let lon = open.iter().map(|p| p.lon).sum::<f64>() / 64.0;
        assert!((lat - center.lat).abs() < 1e-9);
        assert!((lon - center.lon).abs() < 1e-9);
    }

    #[test]
    fn circle_rejects_bad_radius() {
        assert!(generate_circle(c(0.0, 0.0), 0.0, 64).is_err());
        assert!(generate_circle(c(0.0, 0.0), f64::NAN, 64).is_err());
    }

    #[test]
    fn circle_rejects_too_few_segments() {
        assert_eq!(
            generate_circle(c(0.0, 0.0), 5.0, 2),
            Err(GeometryError::TooFewVertices {
                shape: "circle",
                required: 3,
                found: 2,
            })
        );
        assert_eq!(generate_circle(c(0.0, 0.0), 5.0, 3).unwrap().len(), 4);
    }

    #[test]
    fn close_appends_first_vertex() {
        let ring = close_polygon(vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0)]);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);
    }

    #[test]
    fn close_leaves_closed_ring_alone() {
        let ring = vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0), c(0.0, 0.0)];
        assert_eq!(close_polygon(ring.clone()), ring);
    }

    #[test]
    fn build_ring_needs_three_distinct() {
        let err = build_ring(vec![c(1.0, 1.0), c(2.0, 2.0), c(1.0, 1.0)]).unwrap_err();
        assert_eq!(
            err,
            GeometryError::TooFewVertices {
                shape: "polygon",
                required: 3,
                found: 2
            }
        );
        assert_eq!(
            build_ring(vec![c(1.0, 1.0), c(2.0, 2.0), c(3.0, 1.0)])
                .unwrap()
                .len(),
            4
        );
    }

    #[test]
    fn clustering_merges_within_box() {
        let centers = [c(40.0, -74.0), c(40.2, -74.3), c(34.0, -118.0), c(34.1, -118.1)];
        let out = cluster_nearby_centers(&centers, DEFAULT_CLUSTER_TOLERANCE_DEG);
        assert_eq!(out, vec![c(40.0, -74.0), c(34.0, -118.0)]);
    }

    #[test]
    fn clustering_uses_box_not_radius() {
        // 0.49° on both axes is outside a 0.5° circle but inside the box.
        let out = cluster_nearby_centers(&[c(10.0, 10.0), c(10.49, 10.49)], 0.5);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn clustering_is_idempotent() {
        let centers = [c(40.0, -74.0), c(34.0, -118.0), c(51.5, -0.12)];
        let once = cluster_nearby_centers(&centers, 0.5);
        assert_eq!(once, centers.to_vec());
        assert_eq!(cluster_nearby_centers(&once, 0.5), once);
    }

    #[test]
    fn haversine_known_distance() {
        // London to Paris is roughly 344 km.
        let d = haversine_km(c(51.5074, -0.1278), c(48.8566, 2.3522));
        assert!((d - 343.5).abs() < 2.0, "got {d}");
    }

    #[test]
    fn interpolation_hits_endpoints() {
        let path = [c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0)];
        let samples = interpolate_path(&path, 11);
        assert_eq!(samples.len(), 11);
        assert_eq!(samples[0].0, path[0]);
        let (last, dist) = samples[10];
        assert!((last.lat - 1.0).abs() < 1e-9 && (last.lon - 1.0).abs() < 1e-9);
        assert!((dist - path_length_km(&path)).abs() < 1e-6);
    }

    #[test]
    fn interpolation_distances_increase() {
        let path = [c(10.0, 10.0), c(10.5, 10.5)];
        let samples = interpolate_path(&path, 5);
        for w in samples.windows(2) {
            assert!(w[1].1 > w[0].1);
        }
    }
}
