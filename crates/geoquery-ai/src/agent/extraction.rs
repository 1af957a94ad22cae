//! The shared PLAN → EXTRACT → REFLECT → REFINE → VALIDATE loop.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use geoquery_core::protocol::{format_coordinates, format_rings, missing_separator};
use geoquery_core::{
    Coordinate, ParseError, QueryIntent, QuerySubtype, parse_coordinates, parse_rings,
};

use crate::cancel::CancelToken;
use crate::classifier::location_count;
use crate::collaborators::{CompletionError, TextCompletion, Turn};
use crate::keywords::{CHAIN_KEYWORDS, has_any, wants_route};
use crate::{AgentError, AgentRequest, prompts};

/// How many coordinates a subtype expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    Exactly(usize),
    AtLeast(usize),
}

impl Cardinality {
    pub fn for_subtype(intent: QueryIntent, subtype: QuerySubtype) -> Self {
        match intent {
            QueryIntent::Polygon => Self::AtLeast(3),
            QueryIntent::Elevation => Self::AtLeast(2),
            QueryIntent::Line if subtype.is_multiple() => Self::AtLeast(2),
            QueryIntent::Line => Self::Exactly(2),
            _ if subtype.is_multiple() => Self::AtLeast(2),
            _ => Self::Exactly(1),
        }
    }

    pub fn satisfied_by(&self, count: usize) -> bool {
        match *self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }

    pub fn check(&self, found: usize) -> Result<(), CardinalityMismatch> {
        if self.satisfied_by(found) {
            Ok(())
        } else {
            Err(CardinalityMismatch {
                expected: *self,
                found,
            })
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} coordinate(s), found {found}")]
pub struct CardinalityMismatch {
    pub expected: Cardinality,
    pub found: usize,
}

/// What one pass through the loop produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub coordinates: Vec<Coordinate>,
    /// Polygon rings split on `||`; empty for every other intent.
    pub rings: Vec<Vec<Coordinate>>,
    /// A GOOD/REFINE judgement was requested.
    pub confidence_checked: bool,
    pub refined: bool,
    /// Protocol text the coordinates were read from.
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accept,
    Refine,
}

/// Coordinates in `text` that survive the artifact filter.
pub(crate) fn plausible_coordinates(text: &str) -> Result<Vec<Coordinate>, ParseError> {
    let coords: Vec<Coordinate> = parse_coordinates(text)?
        .into_iter()
        .filter(Coordinate::is_plausible)
        .collect();
    if coords.is_empty() {
        return Err(ParseError::NoMatch);
    }
    Ok(coords)
}

fn plausible_rings(text: &str) -> Vec<Vec<Coordinate>> {
    parse_rings(text)
        .into_iter()
        .map(|ring| ring.into_iter().filter(Coordinate::is_plausible).collect::<Vec<_>>())
        .filter(|ring| !ring.is_empty())
        .collect()
}

/// One agent's conversation with the completion service.
///
/// The history starts with the system prompt and grows by one user and one
/// assistant turn per call, so every later call sees the earlier ones in
/// order.
pub struct ExtractionLoop<'a> {
    completion: &'a dyn TextCompletion,
    cancel: &'a CancelToken,
    intent: QueryIntent,
    history: Vec<Turn>,
}

impl<'a> ExtractionLoop<'a> {
    pub fn new(completion: &'a dyn TextCompletion, cancel: &'a CancelToken, intent: QueryIntent) -> Self {
        Self {
            completion,
            cancel,
            intent,
            history: vec![Turn::system(prompts::SYSTEM_PROMPT)],
        }
    }

    /// Send `prompt` with the full history and record the answer.
    pub(crate) async fn ask(&mut self, prompt: String) -> Result<String, AgentError> {
        debug!(intent = %self.intent, prompt = %prompt, "completion request");
        self.history.push(Turn::user(prompt));
        let answer = self.completion.complete(&self.history).await;
        self.cancel.check()?;
        let answer = answer?.trim().to_string();
        if answer.is_empty() {
            return Err(CompletionError::Empty.into());
        }
        debug!(intent = %self.intent, answer = %answer, "completion answer");
        self.history.push(Turn::assistant(answer.clone()));
        Ok(answer)
    }

    /// PLAN: use the supplied subtype, or ask one yes/no question about
    /// how many places are involved.
    ///
    /// Line requests take route-vs-direct from the wording and count the
    /// path as multi-stop when either the answer or the wording says so.
    pub async fn resolve_subtype(&mut self, request: &AgentRequest) -> Result<QuerySubtype, AgentError> {
        if let Some(subtype) = request.subtype {
            return Ok(subtype);
        }
        let answer = self.ask(prompts::plan(self.intent, &request.user_text)).await?;
        let several = prompts::is_yes(&answer);
        let subtype = if self.intent == QueryIntent::Line {
            let lower = request.user_text.to_lowercase();
            let multi = several || location_count(&lower) >= 3 || has_any(&lower, CHAIN_KEYWORDS);
            QuerySubtype::line(wants_route(&lower), multi)
        } else if several {
            QuerySubtype::Multiple
        } else {
            QuerySubtype::Single
        };
        info!(intent = %self.intent, subtype = %subtype, "planned subtype");
        Ok(subtype)
    }

    /// EXTRACT, REFLECT, at most one REFINE, then VALIDATE.
    pub async fn run(
        &mut self,
        request: &AgentRequest,
        subtype: QuerySubtype,
    ) -> Result<ExtractionResult, AgentError> {
        let expected = Cardinality::for_subtype(self.intent, subtype);
        let extraction_prompt =
            prompts::extraction(self.intent, subtype, &request.user_text, &request.ai_text);

        let mut text = match self.reuse_answer(&request.ai_text, expected) {
            Some(text) => {
                info!(intent = %self.intent, "reusing coordinates from the answer text");
                self.history.push(Turn::user(extraction_prompt));
                self.history.push(Turn::assistant(text.clone()));
                text
            }
            None => self.ask(extraction_prompt).await?,
        };

        let places = location_count(&request.user_text);
        let (verdict, confidence_checked) = self.reflect(&text, expected, places).await?;

        let mut refined = false;
        if verdict == Verdict::Refine {
            let found = self.count(&text);
            text = self.ask(prompts::refine(self.intent, subtype, found)).await?;
            refined = true;
            let after = self.count(&text);
            if !expected.satisfied_by(after) {
                warn!(intent = %self.intent, %expected, found = after, "refinement still short, continuing");
            }
        }

        let coordinates = plausible_coordinates(&text)?;
        let rings = if self.intent == QueryIntent::Polygon {
            plausible_rings(&text)
        } else {
            Vec::new()
        };
        Ok(ExtractionResult {
            coordinates,
            rings,
            confidence_checked,
            refined,
            raw_text: text,
        })
    }

    /// Coordinates already present in the upstream answer, re-emitted in
    /// protocol form, when they satisfy the expected count.
    fn reuse_answer(&self, ai_text: &str, expected: Cardinality) -> Option<String> {
        if self.intent == QueryIntent::Polygon {
            let rings = plausible_rings(ai_text);
            let usable = rings.iter().any(|ring| expected.satisfied_by(ring.len()));
            return usable.then(|| format_rings(&rings));
        }
        let coords = plausible_coordinates(ai_text).ok()?;
        expected
            .satisfied_by(coords.len())
            .then(|| format_coordinates(&coords))
    }

    fn count(&self, text: &str) -> usize {
        plausible_coordinates(text).map(|c| c.len()).unwrap_or(0)
    }

    /// Local check first; one GOOD/REFINE call only when the local check
    /// cannot decide.
    async fn reflect(
        &mut self,
        text: &str,
        expected: Cardinality,
        places: usize,
    ) -> Result<(Verdict, bool), AgentError> {
        let found = self.count(text);
        if let Err(mismatch) = expected.check(found) {
            info!(intent = %self.intent, %mismatch, "reflection: cardinality mismatch");
            return Ok((Verdict::Refine, false));
        }
        if missing_separator(text, found) {
            info!(intent = %self.intent, found, "reflection: pairs without separator");
            return Ok((Verdict::Refine, false));
        }
        if matches!(expected, Cardinality::AtLeast(_)) && found < places {
            let answer = self.ask(prompts::reflect(places, found)).await?;
            let verdict = if prompts::is_good(&answer) {
                Verdict::Accept
            } else {
                Verdict::Refine
            };
            info!(intent = %self.intent, ?verdict, "reflection: judged by completion");
            return Ok((verdict, true));
        }
        Ok((Verdict::Accept, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedCompletion;
    use crate::collaborators::Role;

    fn request(user: &str, ai: &str) -> AgentRequest {
        AgentRequest::new(user, ai)
    }

    #[test]
    fn cardinality_per_subtype() {
        use QueryIntent::*;
        use QuerySubtype::*;
        assert_eq!(Cardinality::for_subtype(Point, Single), Cardinality::Exactly(1));
        assert_eq!(Cardinality::for_subtype(Point, Multiple), Cardinality::AtLeast(2));
        assert_eq!(Cardinality::for_subtype(Line, RouteSingle), Cardinality::Exactly(2));
        assert_eq!(Cardinality::for_subtype(Line, DirectMulti), Cardinality::AtLeast(2));
        assert_eq!(Cardinality::for_subtype(Polygon, Single), Cardinality::AtLeast(3));
        assert_eq!(Cardinality::for_subtype(Buffer, Single), Cardinality::Exactly(1));
    }

    #[test]
    fn mismatch_message() {
        let err = Cardinality::Exactly(2).check(1).unwrap_err();
        assert_eq!(err.to_string(), "expected exactly 2 coordinate(s), found 1");
        assert!(Cardinality::AtLeast(2).check(5).is_ok());
    }

    #[test]
    fn artifacts_are_filtered() {
        let coords = plausible_coordinates("1,0 | 0.05,0.02 | 48.85,2.35").unwrap();
        assert_eq!(coords, vec![Coordinate { lat: 48.85, lon: 2.35 }]);
        assert_eq!(plausible_coordinates("1,0"), Err(ParseError::NoMatch));
    }

    #[tokio::test]
    async fn reuses_answer_without_calls() {
        let completion = ScriptedCompletion::new(&[]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Point);
        let req = request("where is paris", "Paris is at 48.8566° N, 2.3522° E.");
        let result = lp.run(&req, QuerySubtype::Single).await.unwrap();
        assert_eq!(completion.call_count(), 0);
        assert_eq!(result.coordinates.len(), 1);
        assert_eq!(result.raw_text, "48.856600,2.352200");
        assert!(!result.refined);
    }

    #[tokio::test]
    async fn refines_exactly_once() {
        let completion = ScriptedCompletion::new(&["40.7,-74.0", "40.7,-74.0"]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Line);
        let req = request("route from new york to boston", "Sure, here is the route.");
        let result = lp.run(&req, QuerySubtype::RouteSingle).await.unwrap();
        assert_eq!(completion.call_count(), 2);
        assert!(result.refined);
        assert_eq!(result.coordinates.len(), 1);
    }

    #[tokio::test]
    async fn refine_sees_full_history_in_order() {
        let completion = ScriptedCompletion::new(&["40.7,-74.0", "40.7,-74.0 | 42.36,-71.06"]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Line);
        let req = request("route from new york to boston", "");
        lp.run(&req, QuerySubtype::RouteSingle).await.unwrap();

        let calls = completion.calls();
        let refine_call = &calls[1];
        let roles: Vec<Role> = refine_call.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(refine_call[2].content, "40.7,-74.0");
        assert!(refine_call[3].content.contains("two endpoints"));
    }

    #[tokio::test]
    async fn pairs_without_separator_are_refined() {
        let completion =
            ScriptedCompletion::new(&["40.7,-74.0 and 42.36,-71.06", "40.7,-74.0 | 42.36,-71.06"]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Line);
        let req = request("line from new york to boston", "");
        let result = lp.run(&req, QuerySubtype::DirectSingle).await.unwrap();
        assert!(result.refined);
        assert_eq!(completion.call_count(), 2);
    }

    #[tokio::test]
    async fn open_ended_short_count_asks_for_judgement() {
        let completion = ScriptedCompletion::new(&["48.85,2.35 | 51.5,-0.12", "GOOD"]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Point);
        let req = request("show paris, london, rome", "");
        let result = lp.run(&req, QuerySubtype::Multiple).await.unwrap();
        assert!(result.confidence_checked);
        assert!(!result.refined);
        assert_eq!(completion.call_count(), 2);
        assert_eq!(result.coordinates.len(), 2);
    }

    #[tokio::test]
    async fn explicit_none_is_a_parse_failure() {
        let completion = ScriptedCompletion::new(&["none", "none"]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Point);
        let err = lp
            .run(&request("where is atlantis", ""), QuerySubtype::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Parse(ParseError::ExplicitNone)));
        assert_eq!(completion.call_count(), 2);
    }

    #[tokio::test]
    async fn plan_asks_once_when_subtype_missing() {
        let completion = ScriptedCompletion::new(&["yes"]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Point);
        let req = request("find a bakery and a cafe", "");
        assert_eq!(lp.resolve_subtype(&req).await.unwrap(), QuerySubtype::Multiple);
        assert_eq!(completion.call_count(), 1);
    }

    #[tokio::test]
    async fn line_plan_takes_routing_from_wording() {
        // The answer only speaks to the number of stops.
        let completion = ScriptedCompletion::new(&["no", "no", "yes"]);
        let cancel = CancelToken::new();

        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Line);
        let req = request("drive from new york to boston", "");
        assert_eq!(lp.resolve_subtype(&req).await.unwrap(), QuerySubtype::RouteSingle);

        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Line);
        let req = request("line from new york to boston", "");
        assert_eq!(lp.resolve_subtype(&req).await.unwrap(), QuerySubtype::DirectSingle);

        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Line);
        let req = request("walk from the station to the museum", "");
        assert_eq!(lp.resolve_subtype(&req).await.unwrap(), QuerySubtype::RouteMulti);

        let prompt = &completion.calls()[0][1].content;
        assert!(prompt.contains("more than two places"), "{prompt}");
        assert!(!prompt.contains("follow roads"), "{prompt}");
    }

    #[tokio::test]
    async fn plan_skipped_when_subtype_supplied() {
        let completion = ScriptedCompletion::new(&[]);
        let cancel = CancelToken::new();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Point);
        let req = request("show a", "").with_subtype(QuerySubtype::Multiple);
        assert_eq!(lp.resolve_subtype(&req).await.unwrap(), QuerySubtype::Multiple);
        assert_eq!(completion.call_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_observed_after_call() {
        let completion = ScriptedCompletion::new(&["48.85,2.35"]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut lp = ExtractionLoop::new(completion.as_ref(), &cancel, QueryIntent::Point);
        let err = lp
            .run(&request("where is paris", ""), QuerySubtype::Single)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
        assert_eq!(completion.call_count(), 1);
    }
}
