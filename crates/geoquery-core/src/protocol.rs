//! The `lat,lon | lat,lon` text protocol spoken with the completion service.
//!
//! Pairs are pipe-delimited with latitude before longitude; `||` separates
//! independent polygon rings. [`crate::parse_coordinates`] and
//! [`crate::parse_rings`] read it back.

use crate::Coordinate;
use crate::parse::RING_SEPARATOR;

/// Format coordinates as ` | `-separated `lat,lon` pairs.
pub fn format_coordinates(coords: &[Coordinate]) -> String {
    coords
        .iter()
        .map(|c| format!("{:.6},{:.6}", c.lat, c.lon))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Format several rings, separated by ` || `.
pub fn format_rings(rings: &[Vec<Coordinate>]) -> String {
    rings
        .iter()
        .map(|ring| format_coordinates(ring))
        .collect::<Vec<_>>()
        .join(&format!(" {RING_SEPARATOR} "))
}

/// Whether `text` lists several pairs without the `|` delimiter.
///
/// Such answers parse, but the completion did not follow the protocol and
/// the pairs may have been read out of the wrong fields.
pub fn missing_separator(text: &str, pair_count: usize) -> bool {
    pair_count > 1 && !text.contains('|')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_coordinates, parse_rings};

    #[test]
    fn formats_pipe_delimited_pairs() {
        let coords = [
            Coordinate { lat: 40.7, lon: -74.0 },
            Coordinate { lat: 34.05, lon: -118.25 },
        ];
        assert_eq!(
            format_coordinates(&coords),
            "40.700000,-74.000000 | 34.050000,-118.250000"
        );
        assert_eq!(parse_coordinates(&format_coordinates(&coords)).unwrap(), coords);
    }

    #[test]
    fn formats_rings_with_double_pipe() {
        let a = vec![
            Coordinate { lat: 1.5, lon: 1.5 },
            Coordinate { lat: 1.5, lon: 2.5 },
            Coordinate { lat: 2.5, lon: 2.5 },
        ];
        let b = vec![
            Coordinate { lat: 10.5, lon: 10.5 },
            Coordinate { lat: 10.5, lon: 11.5 },
            Coordinate { lat: 11.5, lon: 11.5 },
        ];
        let text = format_rings(&[a.clone(), b.clone()]);
        assert_eq!(text.matches("||").count(), 1);
        assert_eq!(parse_rings(&text), vec![a, b]);
    }

    #[test]
    fn detects_missing_separator() {
        assert!(missing_separator("40.7,-74.0 and 34.0,-118.2", 2));
        assert!(!missing_separator("40.7,-74.0 | 34.0,-118.2", 2));
        assert!(!missing_separator("40.7,-74.0", 1));
    }
}
