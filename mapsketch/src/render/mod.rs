//! Rendering sink of the drawing pipeline.
//!
//! Mapsketch does not draw anything by itself. Instead, a [`DrawingSession`](crate::DrawingSession)
//! hands its shapes to a [`ShapeRenderer`] implemented by the host map engine:
//! * while the user is drawing, a [`ShapePreview`] is pushed after every change. The preview reads
//!   positions straight from the session's point store, so it always reflects the latest state;
//! * when the shape is finished, the finalized [`Shape`] is given to [`ShapeRenderer::add_shape`].

use std::sync::Arc;

use mapsketch_types::{Position, Shape, ShapeKind};
use maybe_sync::{MaybeSend, MaybeSync};
use parking_lot::RwLock;

use crate::draw::{Point, PointStore, SessionId};

mod shape_layer;

pub use shape_layer::ShapeLayer;

/// Renders shapes produced by drawing sessions.
pub trait ShapeRenderer: MaybeSend + MaybeSync {
    /// Shows or updates the preview of a shape being drawn.
    ///
    /// Called after every change of the session's points. Implementations may keep the preview and
    /// read positions from it at render time.
    fn update_preview(&mut self, preview: &ShapePreview);

    /// Removes the preview of the given session.
    fn clear_preview(&mut self, session: SessionId);

    /// Adds a finalized shape.
    fn add_shape(&mut self, shape: Shape);
}

/// Read-only live view of a session's points.
#[derive(Debug, Clone)]
pub struct PointSource {
    store: Arc<RwLock<PointStore>>,
}

impl PointSource {
    pub(crate) fn new(store: Arc<RwLock<PointStore>>) -> Self {
        Self { store }
    }

    /// Current positions of the points in drawing order.
    pub fn positions(&self) -> Vec<Position> {
        self.store.read().to_ordered_positions().collect()
    }

    /// Current state of the points in drawing order.
    pub fn points(&self) -> Vec<Point> {
        self.store.read().iter().cloned().collect()
    }

    /// Number of points, including the floating one.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Returns true if there are no points.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Calls `f` with the store locked for reading.
    pub fn with_store<T>(&self, f: impl FnOnce(&PointStore) -> T) -> T {
        f(&self.store.read())
    }
}

/// Preview of a shape that is being drawn.
#[derive(Debug, Clone)]
pub struct ShapePreview {
    /// Session drawing the shape.
    pub session: SessionId,
    /// Kind of the shape.
    pub kind: ShapeKind,
    /// Whether a guide line should connect the last committed point with the floating point.
    pub guide_line: bool,
    /// Points of the shape.
    pub source: PointSource,
}
