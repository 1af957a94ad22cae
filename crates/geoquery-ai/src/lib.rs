//! Query classification and coordinate extraction agents.
//!
//! [`classify`] maps an utterance to an intent and subtype without any I/O.
//! [`Agents`] then runs the matching extraction agent against the
//! collaborator traits in [`collaborators`] and hands the result to the map
//! renderer.

pub mod agent;
pub mod cancel;
pub mod classifier;
pub mod collaborators;
pub mod config;
mod error;
pub mod keywords;
pub mod prompts;

pub use agent::{
    AgentReport, AgentRequest, Agents, Cardinality, CardinalityMismatch, ElevationProfile,
    ExtractionAgent, ExtractionResult,
};
pub use cancel::CancelToken;
pub use classifier::{Classification, classify};
pub use collaborators::{
    Collaborators, CompletionError, ContourValues, FeatureSelection, Isochrone, IsochroneRequest,
    IsochroneResponse, MapRenderer, PositionSource, RouteResult, Routing, Terrain, TextCompletion,
    TravelMode, Turn,
};
pub use config::AgentConfig;
pub use error::AgentError;
