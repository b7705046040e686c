//! Error type used by the crate.

use thiserror::Error;

use crate::ShapeKind;

/// Error enum.
#[derive(Debug, Error, PartialEq)]
pub enum MapsketchTypesError {
    /// The shape does not have enough vertices for its kind.
    #[error("{kind:?} shape requires at least {required} vertices, got {actual}")]
    NotEnoughVertices {
        /// Kind of the shape.
        kind: ShapeKind,
        /// Minimum number of distinct vertices.
        required: usize,
        /// Number of distinct vertices given.
        actual: usize,
    },
    /// A polygon must end with its first vertex.
    #[error("polygon ring is not closed")]
    RingNotClosed,
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
}
