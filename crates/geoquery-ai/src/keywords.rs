//! Keyword tables behind the rule-based classifier, plus word-boundary
//! aware matching helpers.
//!
//! All tables are lowercase; callers match against lowercased text.

/// Rule 2: phrases that name a polygon outright.
pub const POLYGON_KEYWORDS: &[&str] = &[
    "polygon",
    "polygons",
    "boundary",
    "boundaries",
    "outline",
    "city limits",
    "border of",
    "borders of",
];

/// Weaker shape hints, used only by late overrides and the fallback rule.
pub const POLYGON_HINTS: &[&str] = &[
    "area", "region", "enclose", "enclosing", "shape", "closed", "territory",
];

/// Terms in the AI answer that suggest it described an area.
pub const AI_POLYGON_TERMS: &[&str] = &["polygon", "boundary", "boundaries"];

pub const ELEVATION_KEYWORDS: &[&str] = &[
    "elevation",
    "altitude",
    "height profile",
    "terrain profile",
    "elevation profile",
];

pub const ISOCHRONE_KEYWORDS: &[&str] = &[
    "isochrone",
    "isochrones",
    "reachable area",
    "reachable within",
    "travel time",
    "service area",
    "delivery area",
    "delivery zone",
    "how far can",
];

pub const BUFFER_KEYWORDS: &[&str] = &["buffer", "geofence", "geo-fence", "perimeter", "radius"];

/// Transport verbs that turn a line into a road-snapped route.
pub const TRANSPORT_VERBS: &[&str] = &[
    "drive",
    "driving",
    "walk",
    "walking",
    "cycle",
    "cycling",
    "bike",
    "biking",
    "commute",
    "navigate",
    "directions",
];

/// Words that imply a multi-stop path.
pub const CHAIN_KEYWORDS: &[&str] = &[
    "through", "via", "chain", "sequence", "waypoint", "waypoints",
];

/// Rule 8: softer line phrasing that needs two named places to count.
pub const MODERATE_LINE_KEYWORDS: &[&str] = &[
    "distance between",
    "connect",
    "connecting",
    "through",
    "line from",
    "line between",
    "path from",
    "path between",
    "draw a line",
];

/// Rule 10: anything that makes a bare list of places read as a path.
pub const LINE_HINTS: &[&str] = &[
    "line", "route", "path", "connect", "distance", "road", "trip",
];

pub const POINT_KEYWORDS: &[&str] = &[
    "show", "find", "locate", "where", "mark", "pin", "marker", "point", "top", "list", "best",
];

/// Phrasing that asks for a ranked or enumerated set of places.
pub const LIST_KEYWORDS: &[&str] = &["top", "list", "all"];

/// Words that can follow "and" without introducing another place.
pub const DETERMINERS: &[&str] = &[
    "the",
    "this",
    "that",
    "its",
    "their",
    "a",
    "an",
    "surrounding",
];

/// Aliases for the user's own position.
pub const HERE_ALIASES: &[&str] = &[
    "here",
    "current location",
    "my location",
    "where i am",
    "my position",
];

/// Whether `term` occurs in `text` as a whole word or phrase.
pub fn has_term(text: &str, term: &str) -> bool {
    text.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Whether any term from `terms` occurs in `text` as a whole word.
pub fn has_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| has_term(text, t))
}

/// Whether lowercased `text` asks for a road-snapped route rather than a
/// straight line.
pub fn wants_route(text: &str) -> bool {
    has_term(text, "route") || has_term(text, "routes") || has_any(text, TRANSPORT_VERBS)
}

/// The word following each whole-word occurrence of `term`.
pub fn words_after<'a>(text: &'a str, term: &'a str) -> impl Iterator<Item = Option<&'a str>> + 'a {
    text.match_indices(term)
        .filter(move |(start, _)| {
            let end = start + term.len();
            let before = text[..*start].chars().next_back();
            let after = text[end..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
        .map(move |(start, _)| {
            text[start + term.len()..]
                .split(|c: char| !c.is_alphanumeric() && c != '-')
                .find(|w| !w.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_words_only() {
        assert!(has_term("show the top cafes", "top"));
        assert!(!has_term("bus stop near me", "top"));
        assert!(!has_term("an appointment", "point"));
        assert!(has_term("city limits of austin", "city limits"));
    }

    #[test]
    fn matches_at_edges() {
        assert!(has_term("route", "route"));
        assert!(has_term("buffer, please", "buffer"));
        assert!(!has_term("rerouted", "route"));
    }

    #[test]
    fn next_word_after_term() {
        let next: Vec<_> = words_after("paris and the suburbs and rome", "and").collect();
        assert_eq!(next, vec![Some("the"), Some("rome")]);
        let end: Vec<_> = words_after("paris and", "and").collect();
        assert_eq!(end, vec![None]);
    }
}
