//! Rule-based intent classification for map queries.
//!
//! An ordered table of rules is evaluated top to bottom and the first rule
//! that fires decides the intent and subtype. Several keyword sets routinely
//! co-occur in one utterance ("draw a polygon connecting …", "route through
//! the boundary of …"), so the order of [`RULES`] is part of the contract.
//!
//! Place counting is deliberately crude: commas in the user text plus one.
//! The extraction agents compensate for its mistakes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use geoquery_core::units::{self, ContourLimits};
use geoquery_core::{QueryIntent, QuerySubtype};

use crate::keywords::{
    AI_POLYGON_TERMS, BUFFER_KEYWORDS, CHAIN_KEYWORDS, DETERMINERS, ELEVATION_KEYWORDS,
    ISOCHRONE_KEYWORDS, LINE_HINTS, LIST_KEYWORDS, MODERATE_LINE_KEYWORDS, POINT_KEYWORDS,
    self as keywords, POLYGON_HINTS, POLYGON_KEYWORDS, has_any, has_term, words_after,
};

/// Result of classifying one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub intent: QueryIntent,
    pub subtype: QuerySubtype,
    /// Name of the rule that fired.
    pub rule: &'static str,
}

/// Lowercased inputs and derived signals shared by every rule.
pub struct QueryText {
    pub user: String,
    pub ai: String,
    pub locations: usize,
}

impl QueryText {
    pub fn new(user_text: &str, ai_text: &str) -> Self {
        let user = user_text.trim().to_lowercase();
        let ai = ai_text.trim().to_lowercase();
        let locations = location_count(&user);
        Self {
            user,
            ai,
            locations,
        }
    }

    /// The user names several places joined by "and", excluding phrases like
    /// "and the surrounding area".
    fn has_bare_and(&self) -> bool {
        words_after(&self.user, "and").any(|next| match next {
            Some(word) => !DETERMINERS.contains(&word),
            None => false,
        })
    }

    fn has_and_others(&self) -> bool {
        AND_OTHERS.is_match(&self.user)
    }

    fn has_pair_phrase(&self) -> bool {
        BETWEEN_AND.is_match(&self.user) || FROM_TO.is_match(&self.user)
    }

    fn wants_route(&self) -> bool {
        keywords::wants_route(&self.user)
    }

    fn polygon_hint(&self) -> bool {
        has_any(&self.user, POLYGON_KEYWORDS)
            || has_any(&self.user, POLYGON_HINTS)
            || has_any(&self.ai, AI_POLYGON_TERMS)
    }

    fn line_hint(&self) -> bool {
        has_any(&self.user, LINE_HINTS) || has_any(&self.user, CHAIN_KEYWORDS)
    }
}

/// Number of places an utterance names: commas plus one.
pub fn location_count(text: &str) -> usize {
    text.matches(',').count() + 1
}

type Rule = fn(&QueryText) -> Option<(QueryIntent, QuerySubtype)>;

/// Classification rules in priority order. First match wins.
pub const RULES: &[(&str, Rule)] = &[
    ("explicit-polygon", explicit_polygon),
    ("polygon-keywords", polygon_keywords),
    ("elevation", elevation),
    ("isochrone", isochrone),
    ("buffer", buffer),
    ("strong-line", strong_line),
    ("explicit-point", explicit_point),
    ("moderate-line", moderate_line),
    ("point-keywords", point_keywords),
    ("location-count", by_location_count),
];

/// Classify an utterance, optionally informed by the AI's answer text.
///
/// Pure: identical inputs always produce the identical classification.
pub fn classify(user_text: &str, ai_text: &str) -> Classification {
    let query = QueryText::new(user_text, ai_text);
    for &(rule, predicate) in RULES {
        if let Some((intent, subtype)) = predicate(&query) {
            return Classification {
                intent,
                subtype,
                rule,
            };
        }
    }
    // The location-count rule always fires; this is unreachable in practice.
    Classification {
        intent: QueryIntent::Point,
        subtype: QuerySubtype::Single,
        rule: "default",
    }
}

// ── Patterns ──

static EXPLICIT_POLYGON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:draw|create|make|build|generate|plot)\s+(?:a\s+|an\s+|the\s+)?polygons?\s+",
        r"(?:from|connecting|between|using|with|through|joining|linking|around)\b",
    ))
    .unwrap()
});

static ISOCHRONE_TIME_ZONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b\d+(?:\.\d+)?\s*(?:min|mins|minute|minutes|hour|hours|hr|hrs)\b",
        r"(?:\s+[a-z-]+){0,2}?\s+(?:zone|zones|radius|area|areas|range|reach)\b",
    ))
    .unwrap()
});

static ISOCHRONE_DISTANCE_ZONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b\d+(?:\.\d+)?\s*(?:km|kms|kilometers?|kilometres?|mi|miles?)\s+",
        r"(?:drive|driving|walk|walking|cycle|cycling|bike|biking)\b",
    ))
    .unwrap()
});

static WITHIN_DISTANCE_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bwithin\s+\d+(?:\.\d+)?\s*(?:km|kms|kilometers?|kilometres?|mi|miles?|m|meters?|metres?)\s+of\b")
        .unwrap()
});

static AND_OTHERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\band\s+(?:\d+|[a-z]+)\s+others?\b").unwrap());

static ROUTE_FROM_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\broute\s+from\b.+\bto\b").unwrap());
static DIRECTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdirections?\s+(?:from|to)\b").unwrap());
static PATH_THROUGH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpath\s+through\b").unwrap());
static WAYPOINTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwaypoints?\b").unwrap());
static VIA_LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bvia\s+[^,]+,").unwrap());

static BETWEEN_AND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bbetween\s+.+\s+and\s+\S").unwrap());
static FROM_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfrom\s+.+\s+to\s+\S").unwrap());

static EXPLICIT_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:where\s+is|where's|where\s+are|coordinates\s+(?:of|for)|location\s+of)\b").unwrap()
});

// ── Rules ──

fn explicit_polygon(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    let phrased = EXPLICIT_POLYGON.is_match(&q.user);
    let ai_described = has_any(&q.ai, AI_POLYGON_TERMS) && q.locations >= 3;
    (phrased || ai_described).then_some((QueryIntent::Polygon, QuerySubtype::Multiple))
}

fn polygon_keywords(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    if !has_any(&q.user, POLYGON_KEYWORDS) {
        return None;
    }
    let multiple = q.locations >= 2 || has_term(&q.user, "and");
    Some((QueryIntent::Polygon, multiplicity(multiple)))
}

fn elevation(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    has_any(&q.user, ELEVATION_KEYWORDS).then_some((QueryIntent::Elevation, QuerySubtype::Single))
}

fn isochrone(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    let matched = has_any(&q.user, ISOCHRONE_KEYWORDS)
        || ISOCHRONE_TIME_ZONE.is_match(&q.user)
        || ISOCHRONE_DISTANCE_ZONE.is_match(&q.user);
    if !matched {
        return None;
    }
    let limits = ContourLimits::default();
    let multiple = units::extract_time_values(&q.user, &limits).len() > 1
        || units::extract_distance_values(&q.user, &limits).len() > 1;
    Some((QueryIntent::Isochrone, multiplicity(multiple)))
}

fn buffer(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    if !has_any(&q.user, BUFFER_KEYWORDS) && !WITHIN_DISTANCE_OF.is_match(&q.user) {
        return None;
    }
    let multiple = q.locations >= 2 || q.has_and_others() || q.has_bare_and();
    Some((QueryIntent::Buffer, multiplicity(multiple)))
}

fn strong_line(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    let strong = ROUTE_FROM_TO.is_match(&q.user)
        || DIRECTIONS.is_match(&q.user)
        || PATH_THROUGH.is_match(&q.user)
        || WAYPOINTS.is_match(&q.user)
        || VIA_LIST.is_match(&q.user)
        || has_term(&q.user, "route");
    if !strong {
        return None;
    }
    let multi = q.locations >= 3 || has_any(&q.user, CHAIN_KEYWORDS);
    Some((QueryIntent::Line, QuerySubtype::line(q.wants_route(), multi)))
}

fn explicit_point(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    let show_me_place = SHOW_ME.captures_iter(&q.user).any(|caps| {
        !matches!(
            &caps[1],
            "route" | "routes" | "path" | "paths" | "directions" | "way"
        )
    });
    if !EXPLICIT_POINT.is_match(&q.user) && !show_me_place {
        return None;
    }
    let multiple = q.locations >= 2 || q.has_bare_and();
    Some((QueryIntent::Point, multiplicity(multiple)))
}

/// "show me X", skipping a leading article.
static SHOW_ME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bshow\s+me\s+(?:the\s+|a\s+|an\s+)?([a-z-]+)").unwrap());

fn moderate_line(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    if !has_any(&q.user, MODERATE_LINE_KEYWORDS) {
        return None;
    }
    if q.locations < 2 && !q.has_pair_phrase() {
        return None;
    }
    // A shape hint over three or more places reads as an area, not a path.
    if q.locations >= 3 && q.polygon_hint() {
        return Some((QueryIntent::Polygon, QuerySubtype::Multiple));
    }
    let multi = q.locations >= 3 || has_any(&q.user, CHAIN_KEYWORDS);
    Some((QueryIntent::Line, QuerySubtype::line(q.wants_route(), multi)))
}

fn point_keywords(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    if !has_any(&q.user, POINT_KEYWORDS) {
        return None;
    }
    let multiple = q.locations >= 2 || q.has_and_others() || has_any(&q.user, LIST_KEYWORDS);
    Some((QueryIntent::Point, multiplicity(multiple)))
}

fn by_location_count(q: &QueryText) -> Option<(QueryIntent, QuerySubtype)> {
    let polygon_dominates = q.polygon_hint() && !q.line_hint();
    let result = match q.locations {
        n if n >= 3 && polygon_dominates => (QueryIntent::Polygon, QuerySubtype::Multiple),
        n if n >= 3 => (QueryIntent::Line, QuerySubtype::DirectMulti),
        2 if polygon_dominates => (QueryIntent::Polygon, QuerySubtype::Multiple),
        2 => (QueryIntent::Line, QuerySubtype::DirectSingle),
        _ => (QueryIntent::Point, QuerySubtype::Single),
    };
    Some(result)
}

fn multiplicity(multiple: bool) -> QuerySubtype {
    if multiple {
        QuerySubtype::Multiple
    } else {
        QuerySubtype::Single
    }
}
