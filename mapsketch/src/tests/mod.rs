//! Fixtures shared by the unit tests of the crate.

use std::sync::atomic::{AtomicUsize, Ordering};

use mapsketch_types::{pos, Position, Shape};

use crate::draw::{DragController, SessionId};
use crate::map::{CursorStyle, InteractionModeStack, MapContext, Viewer, ViewerId, ViewerKind};
use crate::render::{ShapePreview, ShapeRenderer};

pub(crate) fn test_viewer() -> Viewer {
    Viewer::new(ViewerKind::Flat2d, pos!(0.0, 0.0), 1.0, 800.0, 600.0)
}

/// Renderer remembering every call made to it.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    /// Snapshot of the preview positions at every update.
    pub(crate) previews: Vec<Vec<Position>>,
    pub(crate) cleared: Vec<SessionId>,
    pub(crate) shapes: Vec<Shape>,
}

impl ShapeRenderer for RecordingRenderer {
    fn update_preview(&mut self, preview: &ShapePreview) {
        self.previews.push(preview.source.positions());
    }

    fn clear_preview(&mut self, session: SessionId) {
        self.cleared.push(session);
    }

    fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

/// Map context with no rendering engine behind it.
pub(crate) struct TestContext {
    pub(crate) viewer: Option<Viewer>,
    pub(crate) modes: InteractionModeStack,
    pub(crate) cursor: CursorStyle,
    pub(crate) renderer: RecordingRenderer,
    pub(crate) drag: DragController,
    redraws: AtomicUsize,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        let viewer = test_viewer().with_id(ViewerId(1));
        let mut drag = DragController::new();
        drag.set_up(&viewer);

        Self {
            viewer: Some(viewer),
            modes: InteractionModeStack::new(),
            cursor: CursorStyle::Default,
            renderer: RecordingRenderer::default(),
            drag,
            redraws: AtomicUsize::new(0),
        }
    }

    pub(crate) fn without_viewer() -> Self {
        Self {
            viewer: None,
            drag: DragController::new(),
            ..Self::new()
        }
    }

    pub(crate) fn redraws(&self) -> usize {
        self.redraws.load(Ordering::Relaxed)
    }

    pub(crate) fn last_preview(&self) -> Option<&Vec<Position>> {
        self.renderer.previews.last()
    }
}

impl MapContext for TestContext {
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
        &mut self.renderer
    }

    fn drag_controller(&self) -> &DragController {
        &self.drag
    }

    fn drag_controller_mut(&mut self) -> &mut DragController {
        &mut self.drag
    }

    fn request_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::Relaxed);
    }
}
