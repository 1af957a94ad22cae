//! HTTP implementations of the geoquery collaborator traits: an
//! OpenAI-compatible chat endpoint, an OSRM-style router, and a
//! Mapbox-style isochrone service.

#[cfg(feature = "http")]
mod chat;
#[cfg(feature = "http")]
mod error;
#[cfg(feature = "http")]
mod isochrone;
#[cfg(feature = "http")]
mod routing;

#[cfg(feature = "http")]
pub use chat::ChatClient;
#[cfg(feature = "http")]
pub use error::ClientError;
#[cfg(feature = "http")]
pub use isochrone::IsochroneClient;
#[cfg(feature = "http")]
pub use routing::RoutingClient;
