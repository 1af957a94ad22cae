//! Distance and time quantities mentioned in query text.
//!
//! Radii are converted to kilometres here, once, and stay in kilometres
//! for the rest of the pipeline. Isochrone thresholds are whole minutes or
//! whole metres.

use once_cell::sync::Lazy;
use regex::Regex;

const KM_PER_MILE: f64 = 1.609_344;
const KM_PER_FOOT: f64 = 0.000_304_8;

static RADIUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(km|kms|kilomet(?:er|re)s?|mi|miles?|ft|feet|m|met(?:er|re)s?)\b")
        .unwrap()
});

static RADIUS_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(\d+(?:\.\d+)?)\s*(km|kms|kilomet(?:er|re)s?|mi|miles?|ft|feet|m|met(?:er|re)s?)\b",
        r"\s+(?:buffers?\s+|radius\s+)?(?:on|around|at|for|near)\s+",
        r"([^,;]+?)\s*(?:,|;|\band\b|$)",
    ))
    .unwrap()
});

static TIME_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)((?:\d+(?:\.\d+)?\s*(?:,|\band\b|\bor\b|&|/)?\s*)+)(minutes?|mins?|hours?|hrs?|h)\b")
        .unwrap()
});

static DISTANCE_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)((?:\d+(?:\.\d+)?\s*(?:,|\band\b|\bor\b|&|/)?\s*)+)",
        r"(km|kms|kilomet(?:er|re)s?|mi|miles?|m|met(?:er|re)s?)\b",
    ))
    .unwrap()
});

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Upper bounds applied to isochrone thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourLimits {
    pub max_count: usize,
    pub max_minutes: u32,
    pub max_meters: u32,
}

impl Default for ContourLimits {
    fn default() -> Self {
        Self {
            max_count: 4,
            max_minutes: 60,
            max_meters: 100_000,
        }
    }
}

/// Convert a value in the given unit to kilometres.
///
/// Returns `None` for unknown units.
pub fn radius_km_from(value: f64, unit: &str) -> Option<f64> {
    let unit = unit.to_ascii_lowercase();
    let km = match unit.as_str() {
        "km" | "kms" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => value,
        "m" | "meter" | "meters" | "metre" | "metres" => value / 1000.0,
        "mi" | "mile" | "miles" => value * KM_PER_MILE,
        "ft" | "feet" => value * KM_PER_FOOT,
        _ => return None,
    };
    Some(km)
}

/// First radius mentioned in the text, in kilometres.
pub fn extract_radius_km(text: &str) -> Option<f64> {
    RADIUS.captures_iter(text).find_map(|caps| {
        let value: f64 = caps[1].parse().ok()?;
        radius_km_from(value, &caps[2]).filter(|km| *km > 0.0)
    })
}

/// Explicit `<N><unit> on|around|at|for <place>` pairings, in text order.
///
/// Each entry is `(radius_km, place)` with the place trimmed as written.
pub fn extract_radius_pairs(text: &str) -> Vec<(f64, String)> {
    RADIUS_PAIR
        .captures_iter(text)
        .filter_map(|caps| {
            let value: f64 = caps[1].parse().ok()?;
            let km = radius_km_from(value, &caps[2]).filter(|km| *km > 0.0)?;
            let place = caps[3].trim();
            (!place.is_empty()).then(|| (km, place.to_string()))
        })
        .collect()
}

/// Time thresholds in whole minutes: sorted, distinct, clamped, capped.
pub fn extract_time_values(text: &str, limits: &ContourLimits) -> Vec<u32> {
    let mut values = Vec::new();
    for caps in TIME_LIST.captures_iter(text) {
        let unit = caps[2].to_ascii_lowercase();
        let per_unit = if unit.starts_with('h') { 60.0 } else { 1.0 };
        values.extend(numbers(&caps[1]).map(|v| v * per_unit));
    }
    finalize(values, limits.max_minutes, limits.max_count)
}

/// Distance thresholds in whole metres: sorted, distinct, clamped, capped.
pub fn extract_distance_values(text: &str, limits: &ContourLimits) -> Vec<u32> {
    let mut values = Vec::new();
    for caps in DISTANCE_LIST.captures_iter(text) {
        let Some(km_per_unit) = radius_km_from(1.0, &caps[2]) else {
            continue;
        };
        values.extend(numbers(&caps[1]).map(|v| v * km_per_unit * 1000.0));
    }
    finalize(values, limits.max_meters, limits.max_count)
}

fn numbers(list: &str) -> impl Iterator<Item = f64> + '_ {
    NUMBER
        .find_iter(list)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
}

fn finalize(values: Vec<f64>, max: u32, max_count: usize) -> Vec<u32> {
    let mut out: Vec<u32> = values
        .into_iter()
        .map(|v| v.round())
        .filter(|v| *v >= 1.0)
        .map(|v| (v.min(max as f64)) as u32)
        .collect();
    out.sort_unstable();
    out.dedup();
    out.truncate(max_count);
    out
}
