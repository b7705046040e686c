use std::sync::Arc;

use mapsketch_types::{Position, Shape, ShapeKind};
use maybe_sync::{MaybeSend, MaybeSync};
use parking_lot::RwLock;

use crate::draw::{DrawingConfig, PointId, PointStore, SessionId};
use crate::error::DrawError;
use crate::map::{CursorStyle, MapContext, ModeId, PickEvent, PickedEntity};
use crate::render::{PointSource, ShapePreview};

/// Host callback receiving the session's points.
pub type StoreCallback = Arc<dyn Fn(&PointStore) + MaybeSend + MaybeSync>;

/// Host callback called when a session is cleaned up.
pub type CleanUpCallback = Arc<dyn Fn() + MaybeSend + MaybeSync>;

/// State of a [`DrawingSession`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Draw mode was not entered yet.
    Idle,
    /// Pick mode is registered, no points are placed yet.
    Armed,
    /// At least one point is placed.
    Drawing,
    /// The user asked to finish the shape; waiting for [`DrawingSession::close`].
    Closing,
    /// The session is torn down. This state is terminal.
    Cleaned,
}

/// Optional callbacks a host can set on a [`DrawingSession`].
///
/// The callbacks are called from inside session operations. When the session is driven by a
/// [`DrawingTool`](super::DrawingTool), the tool's session lock is held while they run, so they
/// must not call methods of the same tool; use the store given to the callback instead.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    on_point_clicked: Option<StoreCallback>,
    on_point_moved: Option<StoreCallback>,
    on_clean_up: Option<CleanUpCallback>,
}

impl SessionCallbacks {
    /// Called when the user clicks an existing point without closing the shape.
    pub fn with_on_point_clicked(
        mut self,
        callback: impl Fn(&PointStore) + MaybeSend + MaybeSync + 'static,
    ) -> Self {
        self.on_point_clicked = Some(Arc::new(callback));
        self
    }

    /// Called after a point was dragged to a new position.
    pub fn with_on_point_moved(
        mut self,
        callback: impl Fn(&PointStore) + MaybeSend + MaybeSync + 'static,
    ) -> Self {
        self.on_point_moved = Some(Arc::new(callback));
        self
    }

    /// Called when the session is cancelled or closed.
    pub fn with_on_clean_up(
        mut self,
        callback: impl Fn() + MaybeSend + MaybeSync + 'static,
    ) -> Self {
        self.on_clean_up = Some(Arc::new(callback));
        self
    }
}

/// Drawing state machine. See [module documentation](super) for the overview.
///
/// The session owns the points it draws. The map it draws on is given to every operation as a
/// [`MapContext`], so the same context must be used for the whole life of the session.
///
/// While drawing a line or a polygon, the last point in the session's store is the *floating
/// point*: a point that follows the pointer and shows where the next vertex would be placed. When
/// the user picks a location, the floating point is committed there and a new floating point is
/// appended after it. Point sets do not use a floating point.
pub struct DrawingSession {
    id: SessionId,
    kind: ShapeKind,
    config: DrawingConfig,
    state: SessionState,
    store: Arc<RwLock<PointStore>>,
    floating: Option<PointId>,
    mode: Option<ModeId>,
    guide_line: bool,
    callbacks: SessionCallbacks,
}

impl DrawingSession {
    /// Creates a session with the default configuration.
    pub fn new(kind: ShapeKind) -> Self {
        Self::with_config(kind, DrawingConfig::default())
    }

    /// Creates a session with the given configuration.
    pub fn with_config(kind: ShapeKind, config: DrawingConfig) -> Self {
        Self {
            id: SessionId::next(),
            kind,
            config,
            state: SessionState::Idle,
            store: Arc::new(RwLock::new(PointStore::new())),
            floating: None,
            mode: None,
            guide_line: false,
            callbacks: SessionCallbacks::default(),
        }
    }

    /// Sets host callbacks of the session.
    pub fn with_callbacks(mut self, callbacks: SessionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Creates a new idle session with the same kind, configuration and callbacks.
    pub fn fresh(&self) -> Self {
        Self::with_config(self.kind, self.config).with_callbacks(self.callbacks.clone())
    }

    /// Id of the session.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Kind of the shape drawn by the session.
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Configuration of the session.
    pub fn config(&self) -> &DrawingConfig {
        &self.config
    }

    /// Current state of the session.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true while the session owns a pick mode: in `Armed`, `Drawing` or `Closing` state.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SessionState::Armed | SessionState::Drawing | SessionState::Closing
        )
    }

    /// Pick mode registered by the session.
    pub fn mode(&self) -> Option<ModeId> {
        self.mode
    }

    /// The point following the pointer.
    pub fn floating_point(&self) -> Option<PointId> {
        self.floating
    }

    /// Whether the preview shows a guide line to the floating point.
    pub fn renders_guide_line(&self) -> bool {
        self.guide_line
    }

    /// Live read-only view of the session's points.
    pub fn points(&self) -> PointSource {
        PointSource::new(self.store.clone())
    }

    /// Current positions of all points including the floating point, in drawing order.
    pub fn positions(&self) -> Vec<Position> {
        self.store.read().to_ordered_positions().collect()
    }

    /// Positions of the committed points, in drawing order.
    pub fn committed_positions(&self) -> Vec<Position> {
        self.store
            .read()
            .iter()
            .filter(|p| Some(p.id()) != self.floating)
            .map(|p| p.position())
            .collect()
    }

    /// Number of committed points.
    pub fn committed_count(&self) -> usize {
        let store = self.store.read();
        match self.floating {
            Some(floating) if store.get(floating).is_some() => store.len() - 1,
            _ => store.len(),
        }
    }

    /// Enters draw mode: registers the session's pick mode and sets the crosshair cursor.
    ///
    /// Does nothing if the session is already in draw mode. Returns [`DrawError::NotReady`] if
    /// the map has no viewer yet; the session stays idle and the call can be retried.
    pub fn enter_draw_mode(
        &mut self,
        ctx: &mut impl MapContext,
        render_guide_line: bool,
    ) -> Result<(), DrawError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Armed | SessionState::Drawing | SessionState::Closing => {
                log::debug!("{} is already in draw mode", self.id);
                return Ok(());
            }
            SessionState::Cleaned => {
                return Err(DrawError::InvalidState {
                    operation: "enter_draw_mode",
                    state: self.state,
                })
            }
        }

        let Some(viewer) = ctx.viewer().filter(|v| v.is_valid()).cloned() else {
            log::debug!("Cannot enter draw mode for {}: no viewer", self.id);
            return Err(DrawError::NotReady);
        };

        let mode = ctx
            .modes_mut()
            .push_owned(format!("draw {:?}", self.kind), self.id)?;
        ctx.set_cursor(CursorStyle::Crosshair);

        let drag = ctx.drag_controller_mut();
        drag.set_up(&viewer);
        drag.update_draggable_objects(&self.store);

        self.mode = Some(mode);
        self.guide_line = render_guide_line;
        self.state = SessionState::Armed;
        log::debug!("{} entered draw mode for {:?}", self.id, self.kind);

        Ok(())
    }

    /// Takes the picks queued for the session's mode and handles them in delivery order.
    pub fn process_pending_picks(&mut self, ctx: &mut impl MapContext) {
        let Some(mode) = self.mode else {
            return;
        };

        for event in ctx.modes_mut().take_pending(mode) {
            self.on_pick(ctx, &event);
        }
    }

    /// Handles a resolved pick on the map.
    ///
    /// * A click on the first or the last committed point closes the shape if enough points
    ///   were placed.
    /// * Any other pick on a point of this session does not place a new point. If the drag
    ///   controller counted at least [`DrawingConfig::drag_threshold`] drag samples since the
    ///   previous pick, the pick is the end of a drag; otherwise it is a click and the
    ///   `on_point_clicked` callback is called.
    /// * A pick anywhere else commits a new point.
    pub fn on_pick(&mut self, ctx: &mut impl MapContext, event: &PickEvent) {
        match self.state {
            SessionState::Armed | SessionState::Drawing => {}
            SessionState::Closing => {
                log::debug!("{} is closing, pick ignored", self.id);
                return;
            }
            SessionState::Idle | SessionState::Cleaned => {
                self.log_invalid("on_pick");
                return;
            }
        }

        let drag_count = ctx.drag_controller().drag_count();
        ctx.drag_controller_mut().reset_drag_count();
        let is_click = drag_count < self.config.drag_threshold();

        if let Some(point) = self.own_point(&event.picked) {
            if is_click
                && self.is_end_point(point)
                && self.committed_count() >= self.kind.min_vertices()
            {
                self.state = SessionState::Closing;
                log::debug!("{} is closing by a click on point {point}", self.id);
                return;
            }

            if is_click {
                if let Some(callback) = &self.callbacks.on_point_clicked {
                    callback(&self.store.read());
                }
            } else {
                log::debug!("Pick on point {point} after {drag_count} drag samples, not a click");
                self.push_shape(ctx);
            }

            return;
        }

        self.commit_point(event.position);
        self.push_shape(ctx);
    }

    /// Moves the floating point to the pointer position.
    pub fn on_pointer_move(&mut self, ctx: &mut impl MapContext, position: Position) {
        match self.state {
            SessionState::Drawing => {}
            SessionState::Idle | SessionState::Cleaned => {
                self.log_invalid("on_pointer_move");
                return;
            }
            SessionState::Armed | SessionState::Closing => return,
        }

        let Some(floating) = self.floating else {
            return;
        };

        if self.store.write().update(floating, position) {
            self.push_shape(ctx);
        }
    }

    /// Updates the preview after a point was dragged.
    pub fn on_point_moved(&mut self, ctx: &mut impl MapContext, point: PointId) {
        if !self.is_active() {
            self.log_invalid("on_point_moved");
            return;
        }

        if self.store.read().get(point).is_none() {
            log::debug!("Point {point} does not belong to {}", self.id);
            return;
        }

        self.push_shape(ctx);
        if let Some(callback) = &self.callbacks.on_point_moved {
            callback(&self.store.read());
        }
    }

    /// Asks to finish the shape, e.g. on a right click.
    ///
    /// Moves the session to [`SessionState::Closing`] if enough points were placed. Returns
    /// false if the request was ignored.
    pub fn request_close(&mut self) -> bool {
        match self.state {
            SessionState::Drawing if self.committed_count() >= self.kind.min_vertices() => {
                self.state = SessionState::Closing;
                log::debug!("{} is closing on request", self.id);
                true
            }
            SessionState::Idle | SessionState::Cleaned => {
                self.log_invalid("request_close");
                false
            }
            _ => false,
        }
    }

    /// Removes the last committed point. Returns false if there was nothing to remove.
    ///
    /// Removing the only committed point returns the session to [`SessionState::Armed`].
    pub fn undo_last_point(&mut self, ctx: &mut impl MapContext) -> bool {
        if self.state != SessionState::Drawing {
            return false;
        }

        {
            let mut store = self.store.write();
            let last_committed = store
                .iter()
                .filter(|p| Some(p.id()) != self.floating)
                .last()
                .map(|p| p.id());
            let Some(last_committed) = last_committed else {
                return false;
            };

            store.remove(last_committed);
            log::debug!("{} removed point {last_committed}", self.id);

            if store.len() == self.floating.map_or(0, |_| 1) {
                if let Some(floating) = self.floating.take() {
                    store.remove(floating);
                }
                self.state = SessionState::Armed;
            }
        }

        self.push_shape(ctx);
        true
    }

    /// Cancels drawing: removes all points and the preview, pops the pick mode and calls the
    /// `on_clean_up` callback.
    pub fn cancel(&mut self, ctx: &mut impl MapContext) {
        if self.state == SessionState::Cleaned {
            log::debug!("{} is already cleaned", self.id);
            return;
        }

        log::debug!("{} cancelled in {:?} state", self.id, self.state);
        self.clean_up(ctx);
    }

    /// Finalizes the shape and tears down the session.
    ///
    /// The floating point is dropped and, for polygons, the first point is repeated at the end
    /// to close the ring. The shape is given to the renderer as a finalized shape and returned.
    ///
    /// If not enough points were placed, returns [`DrawError::TooFewPoints`] and leaves the
    /// session untouched.
    pub fn close(&mut self, ctx: &mut impl MapContext) -> Result<Shape, DrawError> {
        match self.state {
            SessionState::Armed | SessionState::Drawing | SessionState::Closing => {}
            SessionState::Idle | SessionState::Cleaned => {
                return Err(DrawError::InvalidState {
                    operation: "close",
                    state: self.state,
                })
            }
        }

        let vertices = self.committed_positions();
        let required = self.kind.min_vertices();
        if vertices.len() < required {
            return Err(DrawError::TooFewPoints {
                kind: self.kind,
                required,
                actual: vertices.len(),
            });
        }

        let shape = Shape::from_vertices(self.kind, vertices)?;
        ctx.renderer_mut().add_shape(shape.clone());
        log::debug!(
            "{} finalized {:?} with {} points",
            self.id,
            self.kind,
            shape.points().len()
        );

        self.clean_up(ctx);
        Ok(shape)
    }

    fn clean_up(&mut self, ctx: &mut impl MapContext) {
        if let Some(mode) = self.mode.take() {
            ctx.modes_mut().remove(mode);
        }

        ctx.renderer_mut().clear_preview(self.id);
        ctx.drag_controller_mut()
            .release_draggable_objects(&self.store);
        ctx.set_cursor(CursorStyle::Default);
        ctx.request_redraw();

        self.store.write().clear();
        self.floating = None;
        self.state = SessionState::Cleaned;

        if let Some(callback) = &self.callbacks.on_clean_up {
            callback();
        }
    }

    fn commit_point(&mut self, position: Position) {
        let point_style = self.config.point_style();
        let floating_style = self.config.floating_point_style();
        let mut store = self.store.write();

        let committed = match self.floating {
            Some(floating) if store.get(floating).is_some() => {
                store.update(floating, position);
                store.restyle(floating, point_style, true);
                self.floating = Some(store.add_with(position, floating_style, false));
                floating
            }
            _ => {
                let committed = store.add_with(position, point_style, true);
                if self.kind.has_floating_point() {
                    self.floating = Some(store.add_with(position, floating_style, false));
                }
                committed
            }
        };

        self.state = SessionState::Drawing;
        log::debug!(
            "{} committed point {committed} at ({}, {})",
            self.id,
            position.x,
            position.y
        );
    }

    fn own_point(&self, picked: &[PickedEntity]) -> Option<PointId> {
        let store = self.store.read();
        picked.iter().find_map(|entity| match entity {
            PickedEntity::Point { session, point }
                if *session == self.id
                    && Some(*point) != self.floating
                    && store.get(*point).is_some() =>
            {
                Some(*point)
            }
            _ => None,
        })
    }

    fn is_end_point(&self, point: PointId) -> bool {
        let store = self.store.read();
        let mut committed = store.iter().filter(|p| Some(p.id()) != self.floating);
        let first = committed.next().map(|p| p.id());
        let last = committed.last().map(|p| p.id()).or(first);

        first == Some(point) || last == Some(point)
    }

    fn push_shape(&self, ctx: &mut impl MapContext) {
        let preview = ShapePreview {
            session: self.id,
            kind: self.kind,
            guide_line: self.guide_line,
            source: self.points(),
        };

        ctx.renderer_mut().update_preview(&preview);
        ctx.request_redraw();
    }

    fn log_invalid(&self, operation: &'static str) {
        log::warn!(
            "{}: {}",
            self.id,
            DrawError::InvalidState {
                operation,
                state: self.state,
            }
        );
    }
}
