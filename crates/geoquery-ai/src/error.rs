use thiserror::Error;

use geoquery_core::{GeometryError, ParseError};

use crate::agent::CardinalityMismatch;
use crate::collaborators::CompletionError;

/// Why an agent invocation produced nothing to render.
///
/// Never escapes the agent boundary as a panic or unhandled error; it is
/// carried in [`AgentReport::error`](crate::AgentReport).
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no coordinates extracted: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Cardinality(#[from] CardinalityMismatch),

    #[error("text completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("collaborator failed: {0}")]
    Collaborator(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    #[error("no location could be resolved for the query")]
    NoLocation,

    #[error("invocation cancelled by a newer turn")]
    Cancelled,
}
