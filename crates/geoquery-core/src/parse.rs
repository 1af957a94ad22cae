//! Coordinate extraction from free text.
//!
//! Three regex passes run over the input, most specific first:
//!
//! 1. degrees with a cardinal direction: `40.7128°N, 74.0060°W`, optionally
//!    with minutes and seconds (`40°42'46"N`)
//! 2. plain signed pairs: `40.7128,-74.0060`, `40.7; -74.0`, `40.7|-74.0`
//! 3. bare cardinal notation without a degree sign: `40.7128 N 74.0060 W`
//!
//! A pair accepted by an earlier pass is never emitted again by a later one.
//! Output order follows the position of each pair's first match in the text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{Coordinate, ParseError};

/// Separator between independent polygon rings in the extraction protocol.
pub const RING_SEPARATOR: &str = "||";

static DEGREE_CARDINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?i)(\d{1,3}(?:\.\d+)?)\s*°\s*(?:(\d{1,2}(?:\.\d+)?)\s*['′]\s*)?(?:(\d{1,2}(?:\.\d+)?)\s*(?:"|″|'')\s*)?([NS])"#,
        r#"[\s,;/]*"#,
        r#"(\d{1,3}(?:\.\d+)?)\s*°\s*(?:(\d{1,2}(?:\.\d+)?)\s*['′]\s*)?(?:(\d{1,2}(?:\.\d+)?)\s*(?:"|″|'')\s*)?([EW])"#,
    ))
    .unwrap()
});

static PLAIN_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([-+]?\d{1,3}(?:\.\d+)?)\s*[,;|]\s*([-+]?\d{1,3}(?:\.\d+)?)").unwrap());

static BARE_CARDINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*([NS])\b[\s,;/]*(\d{1,3}(?:\.\d+)?)\s*([EW])\b").unwrap()
});

/// Extract every valid, distinct coordinate pair from `text`.
///
/// Returns [`ParseError::ExplicitNone`] if the text contains the token
/// `none` in any case, regardless of numeric content elsewhere, and
/// [`ParseError::NoMatch`] when no in-range pair was found.
pub fn parse_coordinates(text: &str) -> Result<Vec<Coordinate>, ParseError> {
    if text.to_lowercase().contains("none") {
        return Err(ParseError::ExplicitNone);
    }

    let mut found: Vec<(usize, Coordinate)> = Vec::new();

    for caps in DEGREE_CARDINAL.captures_iter(text) {
        let lat = dms(&caps, 1, 2, 3).map(|v| signed(v, &caps[4], 'S'));
        let lon = dms(&caps, 5, 6, 7).map(|v| signed(v, &caps[8], 'W'));
        if let (Some(lat), Some(lon)) = (lat, lon) {
            accept(&mut found, caps.get(0).map_or(0, |m| m.start()), lat, lon);
        }
    }

    for caps in PLAIN_PAIR.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if !standalone(text, &caps) {
            continue;
        }
        let lat = caps[1].parse::<f64>().ok();
        let lon = caps[2].parse::<f64>().ok();
        if let (Some(lat), Some(lon)) = (lat, lon) {
            accept(&mut found, m.start(), lat, lon);
        }
    }

    for caps in BARE_CARDINAL.captures_iter(text) {
        let lat = caps[1].parse::<f64>().ok().map(|v| signed(v, &caps[2], 'S'));
        let lon = caps[3].parse::<f64>().ok().map(|v| signed(v, &caps[4], 'W'));
        if let (Some(lat), Some(lon)) = (lat, lon) {
            accept(&mut found, caps.get(0).map_or(0, |m| m.start()), lat, lon);
        }
    }

    if found.is_empty() {
        return Err(ParseError::NoMatch);
    }

    found.sort_by_key(|(pos, _)| *pos);
    Ok(found.into_iter().map(|(_, c)| c).collect())
}

/// Split protocol text on `||` and parse each ring independently.
///
/// Segments that fail to parse are skipped; a `none` anywhere in the text
/// yields no rings at all.
pub fn parse_rings(text: &str) -> Vec<Vec<Coordinate>> {
    if text.to_lowercase().contains("none") {
        return Vec::new();
    }
    text.split(RING_SEPARATOR)
        .filter_map(|segment| parse_coordinates(segment).ok())
        .collect()
}

fn accept(found: &mut Vec<(usize, Coordinate)>, pos: usize, lat: f64, lon: f64) {
    let Ok(coord) = Coordinate::new(lat, lon) else {
        return;
    };
    if found.iter().any(|(_, c)| *c == coord) {
        return;
    }
    found.push((pos, coord));
}

/// Degrees plus optional minutes and seconds, as decimal degrees.
fn dms(caps: &Captures<'_>, deg: usize, min: usize, sec: usize) -> Option<f64> {
    let d: f64 = caps.get(deg)?.as_str().parse().ok()?;
    let m: f64 = match caps.get(min) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0.0,
    };
    let s: f64 = match caps.get(sec) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0.0,
    };
    Some(d + m / 60.0 + s / 3600.0)
}

fn signed(value: f64, direction: &str, negative: char) -> f64 {
    if direction.eq_ignore_ascii_case(&negative.to_string()) {
        -value
    } else {
        value
    }
}

/// Reject pairs glued onto longer numbers, e.g. the tail of `2024,11`, or
/// cut out of a thousands-grouped figure such as `2,161,000`.
fn standalone(text: &str, caps: &Captures<'_>) -> bool {
    let Some(m) = caps.get(0) else {
        return false;
    };
    let head = &text[..m.start()];
    let tail = &text[m.end()..];
    let glued_before = head.chars().next_back().is_some_and(|c| c.is_ascii_digit() || c == '.');
    let glued_after = tail.chars().next().is_some_and(|c| c.is_ascii_digit());
    let grouped_before = is_digit_group(&caps[1])
        && head
            .strip_suffix(',')
            .is_some_and(|h| h.ends_with(|c: char| c.is_ascii_digit()));
    let grouped_after = is_digit_group(&caps[2])
        && tail
            .strip_prefix(',')
            .and_then(|t| t.get(..3))
            .is_some_and(is_digit_group);
    !(glued_before || glued_after || grouped_before || grouped_after)
}

/// Exactly three unsigned digits, the shape of a thousands group.
fn is_digit_group(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit())
}
