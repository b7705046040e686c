//! Error types used by the crate.

use mapsketch_types::error::MapsketchTypesError;
use mapsketch_types::ShapeKind;
use thiserror::Error;

use crate::draw::SessionState;
use crate::map::ModeStackError;

/// Drawing error type.
#[derive(Debug, Error, PartialEq)]
pub enum DrawError {
    /// The map context has no usable viewer yet. The call can be retried once the viewer is
    /// initialized.
    #[error("map is not ready for drawing")]
    NotReady,
    /// The shape cannot be finalized because not enough points were placed.
    #[error("{kind:?} requires at least {required} points, {actual} placed")]
    TooFewPoints {
        /// Kind of the shape being drawn.
        kind: ShapeKind,
        /// Minimum number of committed points.
        required: usize,
        /// Number of committed points.
        actual: usize,
    },
    /// The operation is not valid in the current state of the session.
    #[error("{operation} is not valid in {state:?} state")]
    InvalidState {
        /// Name of the rejected operation.
        operation: &'static str,
        /// State of the session when the operation was called.
        state: SessionState,
    },
    /// Another drawing session owns the interaction mode stack.
    #[error("another drawing session is active")]
    ModeOccupied,
    /// Finalized geometry is invalid.
    #[error("invalid shape: {0}")]
    Geometry(#[from] MapsketchTypesError),
}

impl From<ModeStackError> for DrawError {
    fn from(value: ModeStackError) -> Self {
        match value {
            ModeStackError::Occupied { .. } => Self::ModeOccupied,
        }
    }
}
