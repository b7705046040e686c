use std::fmt::{Display, Formatter};

use mapsketch_types::{PlanarPoint, Position};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Color;

/// Identifier of a point in a [`PointStore`].
///
/// Ids are issued sequentially and are never reused within a store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u64);

impl Display for PointId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Display style of a point marker.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointStyle {
    /// Diameter of the marker in pixels.
    pub size: f64,
    /// Fill color.
    pub color: Color,
    /// Outline color.
    pub outline_color: Color,
    /// Outline width in pixels. `0.0` means no outline.
    pub outline_width: f64,
}

impl PointStyle {
    /// Style of the points placed by the user.
    pub const COMMITTED: PointStyle = PointStyle {
        size: 10.0,
        color: Color::RED,
        outline_color: Color::WHITE,
        outline_width: 2.0,
    };

    /// Style of the point following the pointer.
    pub const FLOATING: PointStyle = PointStyle {
        size: 8.0,
        color: Color::YELLOW,
        outline_color: Color::BLACK,
        outline_width: 1.0,
    };
}

impl Default for PointStyle {
    fn default() -> Self {
        Self::COMMITTED
    }
}

/// A placed point marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    id: PointId,
    position: Position,
    style: PointStyle,
    draggable: bool,
}

impl Point {
    /// Id of the point.
    pub fn id(&self) -> PointId {
        self.id
    }

    /// World position of the point.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Display style of the point.
    pub fn style(&self) -> &PointStyle {
        &self.style
    }

    /// Whether the point can be moved with the [`DragController`](super::DragController).
    pub fn is_draggable(&self) -> bool {
        self.draggable
    }
}

/// Ordered collection of the points of a drawing session.
///
/// Points are kept in insertion order, which defines the vertex order of the drawn shape. Removing
/// a point keeps the order of the remaining ones and never renumbers them.
#[derive(Debug, Default)]
pub struct PointStore {
    points: Vec<Point>,
    next_id: u64,
}

impl PointStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a draggable point with the default style and returns its id.
    pub fn add(&mut self, position: Position) -> PointId {
        self.add_with(position, PointStyle::default(), true)
    }

    /// Appends a point with the given style and drag affordance.
    pub fn add_with(&mut self, position: Position, style: PointStyle, draggable: bool) -> PointId {
        let id = PointId(self.next_id);
        self.next_id += 1;
        self.points.push(Point {
            id,
            position,
            style,
            draggable,
        });

        id
    }

    /// Removes the point. Returns `false` if there is no point with the given id.
    pub fn remove(&mut self, id: PointId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.points.remove(index);
                true
            }
            None => false,
        }
    }

    /// Moves the point to a new position. Returns `false` if there is no point with the given id.
    pub fn update(&mut self, id: PointId, position: Position) -> bool {
        match self.get_mut(id) {
            Some(point) => {
                point.position = position;
                true
            }
            None => false,
        }
    }

    /// Changes style and drag affordance of the point. Returns `false` if there is no point with
    /// the given id.
    pub fn restyle(&mut self, id: PointId, style: PointStyle, draggable: bool) -> bool {
        match self.get_mut(id) {
            Some(point) => {
                point.style = style;
                point.draggable = draggable;
                true
            }
            None => false,
        }
    }

    /// Ordinal position of the point in the store.
    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    /// Returns the point with the given id.
    pub fn get(&self, id: PointId) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: PointId) -> Option<&mut Point> {
        self.points.iter_mut().find(|p| p.id == id)
    }

    /// Number of points in the store.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the store has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The first point in insertion order.
    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    /// The last point in insertion order.
    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Iterates over the points in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Iterates over positions of the points in insertion order.
    ///
    /// The iterator reads the store at the moment of the call, so calling the method again after
    /// a modification always reflects the current state.
    pub fn to_ordered_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.points.iter().map(|p| p.position)
    }

    /// Removes all points. Issued ids stay retired.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Finds the draggable point closest to `position` within `tolerance` (in map units).
    pub fn nearest_draggable(&self, position: &Position, tolerance: f64) -> Option<PointId> {
        let tolerance_sq = tolerance * tolerance;
        self.points
            .iter()
            .filter(|p| p.draggable)
            .map(|p| (p.id, p.position.distance_sq(position)))
            .filter(|(_, distance_sq)| *distance_sq <= tolerance_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use mapsketch_types::pos;

    use super::*;

    #[test]
    fn positions_follow_insertion_order() {
        let mut store = PointStore::new();
        let a = store.add(pos!(1.0, 1.0));
        let b = store.add(pos!(2.0, 2.0));
        let c = store.add(pos!(3.0, 3.0));

        assert!(store.update(b, pos!(20.0, 20.0)));
        assert!(store.update(a, pos!(10.0, 10.0)));

        let positions: Vec<_> = store.to_ordered_positions().collect();
        assert_eq!(
            positions,
            vec![pos!(10.0, 10.0), pos!(20.0, 20.0), pos!(3.0, 3.0)]
        );
        assert_eq!(store.index_of(c), Some(2));
    }

    #[test]
    fn positions_are_read_on_every_call() {
        let mut store = PointStore::new();
        let id = store.add(pos!(1.0, 1.0));
        assert_eq!(store.to_ordered_positions().next(), Some(pos!(1.0, 1.0)));

        store.update(id, pos!(5.0, 5.0));
        assert_eq!(store.to_ordered_positions().next(), Some(pos!(5.0, 5.0)));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut store = PointStore::new();
        let mut issued = vec![];
        for i in 0..5 {
            let id = store.add(pos!(i as f64, 0.0));
            assert!(!issued.contains(&id));
            issued.push(id);
            if i % 2 == 0 {
                assert!(store.remove(id));
            }
        }

        store.clear();
        let id = store.add(pos!(0.0, 0.0));
        assert!(!issued.contains(&id));
    }

    #[test]
    fn removal_keeps_order() {
        let mut store = PointStore::new();
        let a = store.add(pos!(1.0, 0.0));
        let b = store.add(pos!(2.0, 0.0));
        let c = store.add(pos!(3.0, 0.0));

        assert!(store.remove(b));
        assert!(!store.remove(b));
        assert!(!store.update(b, pos!(0.0, 0.0)));
        assert_eq!(store.index_of(b), None);
        assert_eq!(store.index_of(a), Some(0));
        assert_eq!(store.index_of(c), Some(1));
    }

    #[test]
    fn nearest_draggable_skips_locked_points() {
        let mut store = PointStore::new();
        let near = store.add(pos!(1.0, 0.0));
        store.add_with(pos!(0.5, 0.0), PointStyle::FLOATING, false);
        store.add(pos!(3.0, 0.0));

        assert_eq!(store.nearest_draggable(&pos!(0.0, 0.0), 2.0), Some(near));
        assert_eq!(store.nearest_draggable(&pos!(10.0, 0.0), 2.0), None);
    }
}
