use mapsketch_types::{PlanarPoint, Position, Shape};

use crate::draw::SessionId;
use crate::map::PickedEntity;
use crate::render::{ShapePreview, ShapeRenderer};

/// In-memory shape renderer.
///
/// The layer keeps previews of the shapes being drawn and the list of finalized shapes. A host
/// rendering engine reads them when painting a frame, checking [`ShapeLayer::revision`] to find
/// out whether anything changed since the last frame.
#[derive(Debug, Default)]
pub struct ShapeLayer {
    previews: Vec<ShapePreview>,
    shapes: Vec<Shape>,
    revision: u64,
}

impl ShapeLayer {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Previews of the shapes being drawn.
    pub fn previews(&self) -> &[ShapePreview] {
        &self.previews
    }

    /// Preview of the given session.
    pub fn preview(&self, session: SessionId) -> Option<&ShapePreview> {
        self.previews.iter().find(|p| p.session == session)
    }

    /// Finalized shapes in the order they were added.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Removes a finalized shape.
    pub fn remove_shape(&mut self, index: usize) -> Option<Shape> {
        if index >= self.shapes.len() {
            return None;
        }

        self.revision += 1;
        Some(self.shapes.remove(index))
    }

    /// Counter incremented on every change of the layer content.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Finds draggable preview points and finalized shape vertices within `tolerance` of
    /// `position`, closest first.
    pub fn hit_test(&self, position: &Position, tolerance: f64) -> Vec<PickedEntity> {
        let tolerance_sq = tolerance * tolerance;
        let mut hits: Vec<(f64, PickedEntity)> = vec![];

        for preview in &self.previews {
            preview.source.with_store(|store| {
                for point in store.iter().filter(|p| p.is_draggable()) {
                    let distance_sq = point.position().distance_sq(position);
                    if distance_sq <= tolerance_sq {
                        hits.push((
                            distance_sq,
                            PickedEntity::Point {
                                session: preview.session,
                                point: point.id(),
                            },
                        ));
                    }
                }
            });
        }

        for (index, shape) in self.shapes.iter().enumerate() {
            let closest = shape
                .vertices()
                .map(|v| v.distance_sq(position))
                .min_by(f64::total_cmp);
            if let Some(distance_sq) = closest.filter(|d| *d <= tolerance_sq) {
                hits.push((distance_sq, PickedEntity::Shape { index }));
            }
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, entity)| entity).collect()
    }
}

impl ShapeRenderer for ShapeLayer {
    fn update_preview(&mut self, preview: &ShapePreview) {
        match self
            .previews
            .iter_mut()
            .find(|p| p.session == preview.session)
        {
            Some(existing) => *existing = preview.clone(),
            None => self.previews.push(preview.clone()),
        }

        self.revision += 1;
    }

    fn clear_preview(&mut self, session: SessionId) {
        let count = self.previews.len();
        self.previews.retain(|p| p.session != session);
        if self.previews.len() != count {
            self.revision += 1;
        }
    }

    fn add_shape(&mut self, shape: Shape) {
        log::debug!(
            "Adding {:?} shape with {} points",
            shape.kind(),
            shape.points().len()
        );
        self.shapes.push(shape);
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use mapsketch_types::{pos, ShapeKind};
    use parking_lot::RwLock;

    use super::*;
    use crate::draw::{PointStore, PointStyle};
    use crate::render::PointSource;

    fn preview_with(points: &[(Position, bool)]) -> (ShapePreview, Arc<RwLock<PointStore>>) {
        let mut store = PointStore::new();
        for (position, draggable) in points {
            store.add_with(*position, PointStyle::default(), *draggable);
        }
        let store = Arc::new(RwLock::new(store));

        let preview = ShapePreview {
            session: SessionId::next(),
            kind: ShapeKind::Polyline,
            guide_line: true,
            source: PointSource::new(store.clone()),
        };

        (preview, store)
    }

    #[test]
    fn preview_reflects_store_changes() {
        let (preview, store) = preview_with(&[(pos!(0.0, 0.0), true)]);
        let mut layer = ShapeLayer::new();
        layer.update_preview(&preview);

        let id = store.write().add(pos!(5.0, 5.0));
        store.write().update(id, pos!(6.0, 6.0));

        let shown = layer.preview(preview.session).expect("preview is shown");
        assert_eq!(
            shown.source.positions(),
            vec![pos!(0.0, 0.0), pos!(6.0, 6.0)]
        );
    }

    #[test]
    fn clear_preview_only_removes_own_session() {
        let (first, _) = preview_with(&[]);
        let (second, _) = preview_with(&[]);
        let mut layer = ShapeLayer::new();
        layer.update_preview(&first);
        layer.update_preview(&second);
        layer.update_preview(&first);
        assert_eq!(layer.previews().len(), 2);

        let revision = layer.revision();
        layer.clear_preview(first.session);
        assert_eq!(layer.previews().len(), 1);
        assert!(layer.revision() > revision);
        assert!(layer.preview(second.session).is_some());
    }

    #[test]
    fn hit_test_orders_by_distance() {
        let (preview, _) = preview_with(&[
            (pos!(3.0, 0.0), true),
            (pos!(1.0, 0.0), true),
            (pos!(0.5, 0.0), false),
        ]);
        let mut layer = ShapeLayer::new();
        layer.update_preview(&preview);
        layer.add_shape(
            Shape::from_vertices(ShapeKind::Polyline, vec![pos!(2.0, 0.0), pos!(20.0, 0.0)])
                .expect("valid line"),
        );

        let hits = layer.hit_test(&pos!(0.0, 0.0), 4.0);
        assert_eq!(hits.len(), 3);
        assert_matches!(hits[0], PickedEntity::Point { session, .. } if session == preview.session);
        assert_matches!(hits[1], PickedEntity::Shape { index: 0 });
        assert_matches!(hits[2], PickedEntity::Point { .. });

        assert!(layer.hit_test(&pos!(100.0, 100.0), 4.0).is_empty());
    }
}
