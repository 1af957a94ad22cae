//! Prompt text for the completion collaborator.
//!
//! Every extraction prompt asks for the same wire protocol:
//! `lat,lon | lat,lon`, with `||` between polygon rings and the single word
//! `none` when nothing can be located.

use geoquery_core::{QueryIntent, QuerySubtype};

pub const SYSTEM_PROMPT: &str = "You convert place descriptions into geographic coordinates. \
Answer with decimal degrees only, formatted as lat,lon. Separate consecutive coordinates with \
' | ' and separate polygon rings with ' || '. Keep the order in which the places are mentioned. \
Do not add any other words. If no location can be determined, answer with the single word none.";

/// First extraction request for an agent.
pub fn extraction(
    intent: QueryIntent,
    subtype: QuerySubtype,
    user_text: &str,
    ai_text: &str,
) -> String {
    let task = match (intent, subtype) {
        (QueryIntent::Line, s) if s.is_multiple() => {
            "List the coordinates of every place along the path, in travel order."
        }
        (QueryIntent::Line, _) => {
            "Give the coordinates of the start point and the end point, exactly two coordinates."
        }
        (QueryIntent::Polygon, QuerySubtype::Multiple) => {
            "Give the vertices of each area in order around its edge. \
             Use at least three vertices per area and separate areas with ||."
        }
        (QueryIntent::Polygon, _) => {
            "Give the vertices of the area in order around its edge, at least three vertices."
        }
        (QueryIntent::Buffer, QuerySubtype::Multiple) => {
            "Give the centre coordinate of every place that needs a buffer."
        }
        (QueryIntent::Buffer, _) => "Give the centre coordinate of the place, exactly one coordinate.",
        (_, QuerySubtype::Multiple) => "Give the coordinates of every place mentioned.",
        _ => "Give the coordinates of the place, exactly one coordinate.",
    };
    format!("{task}\n\nRequest: {user_text}\n\nPrevious answer: {ai_text}")
}

/// The single cleanup request issued after a failed reflection.
pub fn refine(intent: QueryIntent, subtype: QuerySubtype, found: usize) -> String {
    let fix = match (intent, subtype) {
        (QueryIntent::Line, s) if !s.is_multiple() => "Extract only the two endpoints.",
        (QueryIntent::Line, _) => "Keep all the places, in order, at least two.",
        (QueryIntent::Polygon, _) => {
            "Close the polygon: give at least three distinct vertices per ring."
        }
        (_, QuerySubtype::Multiple) => "Keep all the places in order, at least two.",
        _ => "Extract only the single most relevant place.",
    };
    format!(
        "Your answer contained {found} coordinate(s). {fix} \
         Reply with coordinates only, lat,lon separated by ' | '."
    )
}

/// Judgement call: reply GOOD when the extraction is complete, REFINE otherwise.
pub fn reflect(expected_places: usize, found: usize) -> String {
    format!(
        "The request seems to name about {expected_places} place(s) and you gave {found} \
         coordinate(s). If your answer covers every place asked for, reply GOOD. \
         Otherwise reply REFINE. Answer with one word."
    )
}

/// Yes/no subtype question used when no subtype was supplied.
pub fn plan(intent: QueryIntent, user_text: &str) -> String {
    let subject = match intent {
        QueryIntent::Line => "more than two places along one path",
        QueryIntent::Polygon => "more than one separate area",
        QueryIntent::Buffer => "more than one place to buffer",
        _ => "more than one place",
    };
    format!("Does this request involve {subject}? Answer yes or no.\n\nRequest: {user_text}")
}

/// Centre lookup for the isochrone agent.
pub fn isochrone_center(user_text: &str, ai_text: &str) -> String {
    format!(
        "Give the coordinate of the starting point for this travel-time request, \
         exactly one coordinate.\n\nRequest: {user_text}\n\nPrevious answer: {ai_text}"
    )
}

/// Leading yes/no in a completion answer.
pub fn is_yes(answer: &str) -> bool {
    answer
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("yes")
}

/// `true` for GOOD, `false` for REFINE or anything unrecognised.
pub fn is_good(answer: &str) -> bool {
    let upper = answer.trim().to_ascii_uppercase();
    upper.starts_with("GOOD")
}
