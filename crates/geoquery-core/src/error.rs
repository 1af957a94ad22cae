use thiserror::Error;

/// Why a block of text yielded no coordinates.
///
/// `ExplicitNone` and `NoMatch` are kept apart: the first means an upstream
/// extraction prompt answered "none" on purpose, the second that nothing in
/// the text looked like a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("text explicitly reports no coordinates")]
    ExplicitNone,

    #[error("no coordinate pairs found in text")]
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("coordinate out of range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },

    #[error("{shape} needs at least {required} distinct vertices, found {found}")]
    TooFewVertices {
        shape: &'static str,
        required: usize,
        found: usize,
    },

    #[error("radius must be positive and finite, got {0} km")]
    InvalidRadius(f64),
}
