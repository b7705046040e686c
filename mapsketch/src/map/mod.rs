//! Map context the drawing pipeline works in.

use mapsketch_types::Position2d;

use crate::draw::DragController;
use crate::messenger::Messenger;
use crate::render::{ShapeLayer, ShapeRenderer};

mod mode_stack;
mod viewer;

pub use mode_stack::{InteractionModeStack, ModeId, ModeStackError, PickEvent, PickedEntity};
pub use viewer::{Viewer, ViewerId, ViewerKind};

const DEFAULT_PICK_TOLERANCE_PX: f64 = 7.0;

/// Cursor style shown over the map.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CursorStyle {
    /// Default arrow cursor.
    #[default]
    Default,
    /// Cursor used while placing points.
    Crosshair,
    /// Cursor over a draggable point.
    Grab,
    /// Cursor while dragging a point.
    Grabbing,
}

/// Capabilities of the map a [`DrawingSession`](crate::DrawingSession) needs.
///
/// The context is given to every session operation instead of being stored in the session, and
/// is expected to outlive the session.
pub trait MapContext {
    /// Current viewer. `None` if the map is not initialized yet.
    fn viewer(&self) -> Option<&Viewer>;

    /// Interaction mode stack of the map.
    fn modes(&self) -> &InteractionModeStack;

    /// Mutable access to the interaction mode stack of the map.
    fn modes_mut(&mut self) -> &mut InteractionModeStack;

    /// Sets the cursor style over the map.
    fn set_cursor(&mut self, cursor: CursorStyle);

    /// Renderer for the drawn shapes.
    fn renderer_mut(&mut self) -> &mut dyn ShapeRenderer;

    /// Drag controller bound to the current viewer.
    fn drag_controller(&self) -> &DragController;

    /// Mutable access to the drag controller bound to the current viewer.
    fn drag_controller_mut(&mut self) -> &mut DragController;

    /// Requests a repaint of the map.
    fn request_redraw(&self);
}

/// Default [`MapContext`] implementation, rendering shapes into a [`ShapeLayer`].
pub struct Map {
    viewer: Option<Viewer>,
    next_viewer_id: u64,
    modes: InteractionModeStack,
    cursor: CursorStyle,
    drag: DragController,
    layer: ShapeLayer,
    messenger: Option<Box<dyn Messenger>>,
    pick_tolerance_px: f64,
}

impl Map {
    /// Creates a new map. The map is not ready for drawing until it has a viewer.
    pub fn new(viewer: Option<Viewer>) -> Self {
        let mut map = Self {
            viewer: None,
            next_viewer_id: 0,
            modes: InteractionModeStack::new(),
            cursor: CursorStyle::Default,
            drag: DragController::new(),
            layer: ShapeLayer::new(),
            messenger: None,
            pick_tolerance_px: DEFAULT_PICK_TOLERANCE_PX,
        };
        map.set_viewer(viewer);

        map
    }

    /// Replaces the viewer of the map, e.g. when switching between 2D and 3D.
    ///
    /// A drag in progress is abandoned without notifying anyone, and the drag controller is
    /// attached to the new viewer. Drawing sessions bound to the old viewer must be cancelled by
    /// their owners, see [`DrawingTool`](crate::DrawingTool).
    pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
        match viewer {
            Some(viewer) => {
                self.next_viewer_id += 1;
                let viewer = viewer.with_id(ViewerId(self.next_viewer_id));
                log::debug!("Map viewer changed to {:?} ({:?})", viewer.kind(), viewer.id());
                self.drag.set_up(&viewer);
                self.viewer = Some(viewer);
            }
            None => {
                log::debug!("Map viewer removed");
                self.drag.tear_down();
                self.viewer = None;
            }
        }

        self.redraw();
    }

    /// Current cursor style.
    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    /// Layer with the drawn shapes.
    pub fn layer(&self) -> &ShapeLayer {
        &self.layer
    }

    /// Mutable access to the layer with the drawn shapes.
    pub fn layer_mut(&mut self) -> &mut ShapeLayer {
        &mut self.layer
    }

    /// Distance in pixels within which a pick hits a point.
    pub fn pick_tolerance_px(&self) -> f64 {
        self.pick_tolerance_px
    }

    /// Sets the distance in pixels within which a pick hits a point.
    pub fn set_pick_tolerance_px(&mut self, tolerance: f64) {
        self.pick_tolerance_px = tolerance;
    }

    /// Sets the messenger notified when the map needs repainting.
    pub fn set_messenger(&mut self, messenger: Option<impl Messenger + 'static>) {
        self.messenger = messenger.map(|m| Box::new(m) as Box<dyn Messenger>);
    }

    /// Request redraw of the map.
    pub fn redraw(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_redraw()
        }
    }

    /// Resolves a pick at the given screen position: the world position and the entities under it.
    ///
    /// Returns `None` if the map has no valid viewer.
    pub fn resolve_pick(&self, screen_position: Position2d) -> Option<PickEvent> {
        let viewer = self.viewer.as_ref()?;
        let position = viewer.screen_to_world(screen_position)?;
        let tolerance = viewer.px_to_map_distance(self.pick_tolerance_px);

        Some(PickEvent {
            position,
            picked: self.layer.hit_test(&position, tolerance),
        })
    }

    /// Resolves a pick and delivers it to the mode on top of the interaction mode stack.
    ///
    /// Returns the id of the mode that received the pick.
    pub fn pick(&mut self, screen_position: Position2d) -> Option<ModeId> {
        let event = self.resolve_pick(screen_position)?;
        self.modes.deliver(event)
    }
}

impl MapContext for Map {
    fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    fn modes(&self) -> &InteractionModeStack {
        &self.modes
    }

    fn modes_mut(&mut self) -> &mut InteractionModeStack {
        &mut self.modes
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }

    fn renderer_mut(&mut self) -> &mut dyn ShapeRenderer {
        &mut self.layer
    }

    fn drag_controller(&self) -> &DragController {
        &self.drag
    }

    fn drag_controller_mut(&mut self) -> &mut DragController {
        &mut self.drag
    }

    fn request_redraw(&self) {
        self.redraw();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use mapsketch_types::pos;

    use super::*;
    use crate::tests::test_viewer;

    #[test]
    fn viewer_ids_change_on_every_switch() {
        let mut map = Map::new(Some(test_viewer()));
        let first = map.viewer().map(Viewer::id).expect("has viewer");

        map.set_viewer(Some(Viewer::new(
            ViewerKind::Globe3d,
            pos!(0.0, 0.0),
            1.0,
            800.0,
            600.0,
        )));
        let second = map.viewer().map(Viewer::id).expect("has viewer");

        assert_ne!(first, second);
        assert_eq!(map.drag_controller().attached_viewer(), Some(second));
    }

    #[test]
    fn pick_without_viewer_is_dropped() {
        let mut map = Map::new(None);
        map.modes_mut().push("info");

        assert_eq!(map.pick(Position2d::new(10.0, 10.0)), None);
    }

    #[test]
    fn pick_is_delivered_to_top_mode() {
        let mut map = Map::new(Some(test_viewer()));
        let mode = map.modes_mut().push("info");

        assert_eq!(map.pick(Position2d::new(400.0, 300.0)), Some(mode));
        let picks = map.modes_mut().take_pending(mode);
        assert_eq!(picks, vec![PickEvent::at(pos!(0.0, 0.0))]);
    }

    #[test]
    fn redraw_is_requested_through_messenger() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut map = Map::new(None);
        let c = counter.clone();
        map.set_messenger(Some(move || {
            c.fetch_add(1, Ordering::Relaxed);
        }));

        map.request_redraw();
        map.set_viewer(Some(test_viewer()));

        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }
}
