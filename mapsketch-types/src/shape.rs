//! Shapes produced by a drawing session.
//!
//! A shape is an ordered sequence of positions. The order is significant: it defines the vertex
//! order of a polyline or polygon ring. Shapes can be:
//! * **point sets** - independent markers, no segments between them;
//! * **polylines** - open sequences, the first and the last points are not connected;
//! * **polygons** - closed rings. Unlike many in-memory contour representations, a finalized
//!   polygon repeats its first position at the end of the sequence, the same way an OGC
//!   `LineString` ring does. Use [`Shape::vertices`] to iterate without the closing duplicate.

use serde::{Deserialize, Serialize};

use crate::error::MapsketchTypesError;
use crate::Position;

/// Kind of the shape being drawn.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A set of independent points.
    Points,
    /// An open line.
    #[default]
    Polyline,
    /// A closed polygon ring.
    Polygon,
}

impl ShapeKind {
    /// Minimum number of committed vertices a finished shape of this kind has.
    pub fn min_vertices(&self) -> usize {
        match self {
            ShapeKind::Points => 1,
            ShapeKind::Polyline => 2,
            ShapeKind::Polygon => 3,
        }
    }

    /// Whether the finalized shape repeats its first vertex at the end.
    pub fn closes_loop(&self) -> bool {
        matches!(self, ShapeKind::Polygon)
    }

    /// Whether drawing a shape of this kind uses a floating point following the pointer.
    pub fn has_floating_point(&self) -> bool {
        !matches!(self, ShapeKind::Points)
    }
}

/// Finalized drawn shape. See module documentation for details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    kind: ShapeKind,
    points: Vec<Position>,
}

impl Shape {
    /// Creates a shape from the full position sequence.
    ///
    /// For polygons the sequence must already end with its first position.
    pub fn new(kind: ShapeKind, points: Vec<Position>) -> Result<Self, MapsketchTypesError> {
        if kind.closes_loop() && points.first() != points.last() {
            return Err(MapsketchTypesError::RingNotClosed);
        }

        let shape = Self { kind, points };
        let actual = shape.vertices().count();
        if actual < kind.min_vertices() {
            return Err(MapsketchTypesError::NotEnoughVertices {
                kind,
                required: kind.min_vertices(),
                actual,
            });
        }

        Ok(shape)
    }

    /// Creates a shape from distinct vertices, closing the ring for polygons.
    pub fn from_vertices(
        kind: ShapeKind,
        mut vertices: Vec<Position>,
    ) -> Result<Self, MapsketchTypesError> {
        if kind.closes_loop() {
            if let Some(first) = vertices.first().copied() {
                vertices.push(first);
            }
        }

        Self::new(kind, vertices)
    }

    /// Kind of the shape.
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Full position sequence, including the closing position of polygons.
    pub fn points(&self) -> &[Position] {
        &self.points
    }

    /// Consumes the shape returning its position sequence.
    pub fn into_points(self) -> Vec<Position> {
        self.points
    }

    /// Whether the first and the last positions are connected.
    pub fn is_closed(&self) -> bool {
        self.kind.closes_loop()
    }

    /// Iterates over distinct vertices, skipping the closing position of polygons.
    pub fn vertices(&self) -> impl Iterator<Item = &Position> {
        let count = if self.is_closed() {
            self.points.len().saturating_sub(1)
        } else {
            self.points.len()
        };

        self.points.iter().take(count)
    }

    /// Iterates over segments of lines and polygons. Point sets have no segments.
    pub fn iter_segments(&self) -> impl Iterator<Item = (&Position, &Position)> {
        let points: &[Position] = match self.kind {
            ShapeKind::Points => &[],
            _ => &self.points,
        };

        points.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}
