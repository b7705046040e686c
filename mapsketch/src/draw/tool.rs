use std::sync::Arc;

use mapsketch_types::{Position, Position2d, Shape};
use maybe_sync::{MaybeSend, MaybeSync};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::control::{EventPropagation, MouseButton, UserEvent, UserEventHandler};
use crate::draw::{DrawingSession, SessionState};
use crate::error::DrawError;
use crate::map::{CursorStyle, Map, MapContext};

/// Callback called with every shape finished by a [`DrawingTool`].
pub type FinishedCallback = Arc<dyn Fn(&Shape) + MaybeSend + MaybeSync>;

/// User event handler driving a [`DrawingSession`] from mouse input.
///
/// * left click places a point, or closes the shape when clicking the first or the last point;
/// * left button drag on a placed point moves it;
/// * right click finishes the shape.
///
/// When the session reaches the [`SessionState::Closing`] state, the tool closes it and gives the
/// shape to the `on_finished` callback. When the map viewer changes, the session is cancelled and
/// replaced with a new one with the same settings.
///
/// The tool is a cheap handle: clones share the same session, so one clone can be given to the
/// [`EventProcessor`](crate::control::EventProcessor) while another is kept by the application.
#[derive(Clone)]
pub struct DrawingTool {
    session: Arc<RwLock<DrawingSession>>,
    on_finished: Option<FinishedCallback>,
}

impl DrawingTool {
    /// Creates a tool for the session.
    pub fn new(session: DrawingSession) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            on_finished: None,
        }
    }

    /// Sets the callback called with every finished shape.
    pub fn with_on_finished(
        mut self,
        callback: impl Fn(&Shape) + MaybeSend + MaybeSync + 'static,
    ) -> Self {
        self.on_finished = Some(Arc::new(callback));
        self
    }

    /// Read access to the current session.
    pub fn session(&self) -> RwLockReadGuard<'_, DrawingSession> {
        self.session.read()
    }

    /// State of the current session.
    pub fn state(&self) -> SessionState {
        self.session.read().state()
    }

    /// Enters draw mode. See [`DrawingSession::enter_draw_mode`].
    ///
    /// A finished or cancelled session is replaced with a new one with the same settings first,
    /// so the tool can be started again after every shape.
    pub fn start(&self, map: &mut Map, render_guide_line: bool) -> Result<(), DrawError> {
        let mut session = self.session.write();
        if session.state() == SessionState::Cleaned {
            *session = session.fresh();
        }

        session.enter_draw_mode(map, render_guide_line)
    }

    /// Finishes the shape drawn so far. See [`DrawingSession::close`].
    pub fn finish(&self, map: &mut Map) -> Result<Shape, DrawError> {
        let shape = self.session.write().close(map)?;
        self.notify_finished(&shape);

        Ok(shape)
    }

    /// Throws away the shape being drawn. See [`DrawingSession::cancel`].
    pub fn cancel(&self, map: &mut Map) {
        self.session.write().cancel(map);
    }

    /// Removes the last placed point. See [`DrawingSession::undo_last_point`].
    pub fn undo(&self, map: &mut Map) -> bool {
        self.session.write().undo_last_point(map)
    }

    /// Throws away the shape being drawn, if any, and starts drawing a new one.
    pub fn restart(&self, map: &mut Map, render_guide_line: bool) -> Result<(), DrawError> {
        {
            let mut session = self.session.write();
            if session.is_active() {
                session.cancel(map);
            }
        }

        self.start(map, render_guide_line)
    }

    fn notify_finished(&self, shape: &Shape) {
        if let Some(callback) = &self.on_finished {
            callback(shape);
        }
    }

    fn pick(
        session: &mut DrawingSession,
        map: &mut Map,
        screen_position: Position2d,
    ) -> Option<Shape> {
        let delivered = map.pick(screen_position);
        if delivered.is_none() || delivered != session.mode() {
            log::debug!("Pick at {screen_position:?} was not delivered to {}", session.id());
            map.drag_controller_mut().reset_drag_count();
        }

        session.process_pending_picks(map);
        Self::finish_if_closing(session, map)
    }

    fn finish_if_closing(session: &mut DrawingSession, map: &mut Map) -> Option<Shape> {
        if session.state() != SessionState::Closing {
            return None;
        }

        match session.close(map) {
            Ok(shape) => Some(shape),
            Err(err) => {
                log::warn!("Failed to finish the shape: {err}");
                None
            }
        }
    }

    fn rebind(session: &mut DrawingSession, map: &mut Map) {
        if !session.is_active() {
            return;
        }

        let guide_line = session.renders_guide_line();
        session.cancel(map);
        *session = session.fresh();

        match session.enter_draw_mode(map, guide_line) {
            Ok(()) => log::debug!("{} rebound to the new viewer", session.id()),
            Err(DrawError::NotReady) => log::debug!("No viewer to rebind {} to", session.id()),
            Err(err) => log::warn!("Failed to rebind drawing to the new viewer: {err}"),
        }
    }

    fn hover(session: &DrawingSession, map: &mut Map, position: Position) {
        if map.drag_controller().is_dragging() {
            return;
        }

        let tolerance = hit_tolerance(session, map);
        let over_point = session
            .points()
            .with_store(|store| store.nearest_draggable(&position, tolerance).is_some());

        map.set_cursor(if over_point {
            CursorStyle::Grab
        } else {
            CursorStyle::Crosshair
        });
    }
}

fn hit_tolerance(session: &DrawingSession, map: &Map) -> f64 {
    map.viewer()
        .map(|viewer| viewer.px_to_map_distance(session.config().hit_tolerance_px()))
        .unwrap_or_default()
}

impl UserEventHandler for DrawingTool {
    fn handle(&self, event: &UserEvent, map: &mut Map) -> EventPropagation {
        let (propagation, finished) = {
            let mut session = self.session.write();
            handle_session_event(&mut session, event, map)
        };

        if let Some(shape) = finished {
            self.notify_finished(&shape);
        }

        propagation
    }
}

fn handle_session_event(
    session: &mut DrawingSession,
    event: &UserEvent,
    map: &mut Map,
) -> (EventPropagation, Option<Shape>) {
    if let UserEvent::ViewerChanged(_) = event {
        DrawingTool::rebind(session, map);
        return (EventPropagation::Propagate, None);
    }

    if !session.is_active() {
        return (EventPropagation::Propagate, None);
    }

    let propagation = match event {
        UserEvent::ButtonPressed(MouseButton::Left, mouse) => {
            let Some(position) = mouse.map_pointer_position else {
                return (EventPropagation::Propagate, None);
            };

            let tolerance = hit_tolerance(session, map);
            if map.drag_controller_mut().pointer_down(&position, tolerance) {
                map.set_cursor(CursorStyle::Grabbing);
                EventPropagation::Stop
            } else {
                EventPropagation::Propagate
            }
        }
        UserEvent::DragStarted(MouseButton::Left, _) if map.drag_controller().is_dragging() => {
            EventPropagation::Consume
        }
        UserEvent::Drag(MouseButton::Left, _, mouse) => {
            if let Some(position) = mouse.map_pointer_position {
                map.drag_controller_mut().pointer_move(&position);
            }

            EventPropagation::Stop
        }
        UserEvent::ButtonReleased(MouseButton::Left, _) => {
            if map.drag_controller().is_dragging() {
                if let Some(point) = map.drag_controller_mut().pointer_up() {
                    session.on_point_moved(map, point);
                }
                map.set_cursor(CursorStyle::Crosshair);
            }

            EventPropagation::Propagate
        }
        UserEvent::DragEnded(MouseButton::Left, _) => {
            // Only drags of the session's points reach the tool, so the release is not a pick.
            map.drag_controller_mut().reset_drag_count();
            EventPropagation::Stop
        }
        UserEvent::Click(MouseButton::Left, mouse) => {
            let finished = DrawingTool::pick(session, map, mouse.screen_pointer_position);
            return (EventPropagation::Stop, finished);
        }
        UserEvent::Click(MouseButton::Right, _) => {
            let finished = if session.request_close() {
                DrawingTool::finish_if_closing(session, map)
            } else {
                None
            };
            return (EventPropagation::Stop, finished);
        }
        UserEvent::PointerMoved(mouse) => {
            if let Some(position) = mouse.map_pointer_position {
                DrawingTool::hover(session, map, position);
                if !map.drag_controller().is_dragging() {
                    session.on_pointer_move(map, position);
                }
            }

            EventPropagation::Propagate
        }
        _ => EventPropagation::Propagate,
    };

    (propagation, None)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mapsketch_types::{pos, ShapeKind};

    use super::*;
    use crate::control::{EventProcessor, EventProcessorConfig, RawUserEvent};
    use crate::draw::{DrawingConfig, SessionCallbacks};
    use crate::map::{Viewer, ViewerKind};
    use crate::tests::test_viewer;

    struct Fixture {
        map: Map,
        processor: EventProcessor,
        tool: DrawingTool,
        finished: Arc<RwLock<Vec<Shape>>>,
    }

    impl Fixture {
        fn new(kind: ShapeKind) -> Self {
            Self::with_session(DrawingSession::new(kind))
        }

        fn with_session(session: DrawingSession) -> Self {
            let _ = env_logger::builder().is_test(true).try_init();

            let finished = Arc::new(RwLock::new(vec![]));
            let f = finished.clone();
            let tool = DrawingTool::new(session).with_on_finished(move |shape| {
                f.write().push(shape.clone());
            });

            let mut processor = EventProcessor::new(
                EventProcessorConfig::default()
                    .with_click_timeout(Duration::from_secs(60))
                    .with_dbl_click_timeout(Duration::ZERO),
            );
            processor.add_handler(tool.clone());

            let mut map = Map::new(Some(test_viewer()));
            tool.start(&mut map, true).expect("map has a viewer");

            Self {
                map,
                processor,
                tool,
                finished,
            }
        }

        fn send(&mut self, event: RawUserEvent) {
            self.processor.handle(event, &mut self.map);
        }

        /// Moves the pointer to the world position `(x, y)`.
        fn move_to(&mut self, x: f64, y: f64) {
            self.send(RawUserEvent::PointerMoved(Position2d::new(
                400.0 + x,
                300.0 - y,
            )));
        }

        fn click(&mut self, x: f64, y: f64) {
            self.move_to(x, y);
            self.send(RawUserEvent::ButtonPressed(MouseButton::Left));
            self.send(RawUserEvent::ButtonReleased(MouseButton::Left));
        }

        fn right_click(&mut self) {
            self.send(RawUserEvent::ButtonPressed(MouseButton::Right));
            self.send(RawUserEvent::ButtonReleased(MouseButton::Right));
        }
    }

    #[test]
    fn draws_polygon_with_clicks() {
        let mut fixture = Fixture::new(ShapeKind::Polygon);

        fixture.click(0.0, 0.0);
        fixture.click(100.0, 0.0);
        fixture.click(100.0, 100.0);
        assert_eq!(fixture.tool.session().committed_count(), 3);
        assert_eq!(fixture.map.layer().previews().len(), 1);

        fixture.click(0.0, 0.0);

        let expected = vec![
            pos!(0.0, 0.0),
            pos!(100.0, 0.0),
            pos!(100.0, 100.0),
            pos!(0.0, 0.0),
        ];
        assert_eq!(fixture.tool.state(), SessionState::Cleaned);
        assert_eq!(fixture.map.layer().shapes().len(), 1);
        assert_eq!(fixture.map.layer().shapes()[0].points(), &expected[..]);
        assert!(fixture.map.layer().previews().is_empty());
        assert_eq!(fixture.finished.read().len(), 1);
        assert_eq!(fixture.map.cursor(), CursorStyle::Default);
    }

    #[test]
    fn floating_point_follows_pointer() {
        let mut fixture = Fixture::new(ShapeKind::Polyline);

        fixture.click(0.0, 0.0);
        fixture.move_to(20.0, 30.0);

        let preview = fixture
            .map
            .layer()
            .preview(fixture.tool.session().id())
            .map(|p| p.source.positions());
        assert_eq!(preview, Some(vec![pos!(0.0, 0.0), pos!(20.0, 30.0)]));
    }

    #[test]
    fn right_click_finishes_polyline() {
        let mut fixture = Fixture::new(ShapeKind::Polyline);

        fixture.click(0.0, 0.0);
        fixture.right_click();
        assert_eq!(fixture.tool.state(), SessionState::Drawing);

        fixture.click(50.0, 0.0);
        fixture.move_to(80.0, 80.0);
        fixture.right_click();

        assert_eq!(fixture.tool.state(), SessionState::Cleaned);
        assert_eq!(
            fixture.finished.read()[0].points(),
            &[pos!(0.0, 0.0), pos!(50.0, 0.0)]
        );
    }

    #[test]
    fn dragging_point_moves_it() {
        let mut fixture = Fixture::new(ShapeKind::Polyline);
        fixture.click(0.0, 0.0);
        fixture.click(100.0, 0.0);

        fixture.move_to(0.0, 0.0);
        fixture.send(RawUserEvent::ButtonPressed(MouseButton::Left));
        assert_eq!(fixture.map.cursor(), CursorStyle::Grabbing);
        for i in 1..=20 {
            fixture.move_to(0.0, i as f64 * 2.0);
        }
        fixture.send(RawUserEvent::ButtonReleased(MouseButton::Left));

        let session = fixture.tool.session();
        assert_eq!(session.state(), SessionState::Drawing);
        assert_eq!(
            session.committed_positions(),
            vec![pos!(0.0, 40.0), pos!(100.0, 0.0)]
        );
        assert_eq!(fixture.map.cursor(), CursorStyle::Crosshair);
        assert_eq!(fixture.map.drag_controller().drag_count(), 0);
    }

    #[test]
    fn closes_after_dragging_a_point() {
        let mut fixture = Fixture::new(ShapeKind::Polygon);
        fixture.click(0.0, 0.0);
        fixture.click(100.0, 0.0);
        fixture.click(100.0, 100.0);

        fixture.move_to(100.0, 0.0);
        fixture.send(RawUserEvent::ButtonPressed(MouseButton::Left));
        for i in 1..=20 {
            fixture.move_to(100.0 + i as f64, 0.0);
        }
        fixture.send(RawUserEvent::ButtonReleased(MouseButton::Left));
        assert!(!fixture.processor.is_dragging());
        assert_eq!(fixture.map.drag_controller().drag_count(), 0);

        fixture.click(0.0, 0.0);

        assert_eq!(fixture.tool.state(), SessionState::Cleaned);
        assert_eq!(
            fixture.finished.read()[0].points(),
            &[
                pos!(0.0, 0.0),
                pos!(120.0, 0.0),
                pos!(100.0, 100.0),
                pos!(0.0, 0.0)
            ]
        );
        assert!(fixture.map.modes().is_empty());
    }

    #[test]
    fn short_drag_of_end_point_does_not_close() {
        let mut fixture = Fixture::new(ShapeKind::Polyline);
        fixture.click(0.0, 0.0);
        fixture.click(100.0, 0.0);

        fixture.move_to(100.0, 0.0);
        fixture.send(RawUserEvent::ButtonPressed(MouseButton::Left));
        fixture.move_to(100.0, 5.0);
        fixture.move_to(100.0, 10.0);
        fixture.send(RawUserEvent::ButtonReleased(MouseButton::Left));

        let session = fixture.tool.session();
        assert_eq!(session.state(), SessionState::Drawing);
        assert_eq!(
            session.committed_positions(),
            vec![pos!(0.0, 0.0), pos!(100.0, 10.0)]
        );
        assert!(fixture.finished.read().is_empty());
    }

    #[test]
    fn pick_taken_by_host_mode_resets_drag_count() {
        let mut fixture = Fixture::new(ShapeKind::Polygon);
        fixture.click(0.0, 0.0);
        fixture.click(100.0, 0.0);
        fixture.click(100.0, 100.0);

        let drag = fixture.map.drag_controller_mut();
        assert!(drag.pointer_down(&pos!(100.0, 0.0), 1.0));
        for i in 1..20 {
            drag.pointer_move(&pos!(100.0, i as f64));
        }
        drag.pointer_move(&pos!(100.0, 0.0));
        drag.pointer_up();
        assert_eq!(fixture.map.drag_controller().drag_count(), 20);

        let host = fixture.map.modes_mut().push("measure");
        fixture.click(300.0, 200.0);
        assert_eq!(fixture.map.drag_controller().drag_count(), 0);
        assert_eq!(fixture.map.modes_mut().take_pending(host).len(), 1);
        fixture.map.modes_mut().pop();

        fixture.click(0.0, 0.0);

        assert_eq!(fixture.tool.state(), SessionState::Cleaned);
        assert_eq!(fixture.finished.read().len(), 1);
    }

    #[test]
    fn click_on_first_point_of_short_polyline_finishes_it() {
        let mut fixture = Fixture::new(ShapeKind::Polyline);
        fixture.click(0.0, 0.0);
        fixture.click(100.0, 0.0);

        fixture.click(1.0, 1.0);

        assert_eq!(fixture.tool.state(), SessionState::Cleaned);
        assert_eq!(fixture.finished.read().len(), 1);
    }

    #[test]
    fn click_on_middle_point_calls_callback() {
        let clicks = Arc::new(RwLock::new(0));
        let c = clicks.clone();
        let session = DrawingSession::new(ShapeKind::Polygon).with_callbacks(
            SessionCallbacks::default().with_on_point_clicked(move |_| *c.write() += 1),
        );
        let mut fixture = Fixture::with_session(session);
        fixture.click(0.0, 0.0);
        fixture.click(100.0, 0.0);
        fixture.click(100.0, 100.0);

        fixture.click(100.0, 0.0);

        assert_eq!(*clicks.read(), 1);
        assert_eq!(fixture.tool.session().committed_count(), 3);
    }

    #[test]
    fn viewer_change_restarts_drawing() {
        let mut fixture = Fixture::new(ShapeKind::Polygon);
        fixture.click(0.0, 0.0);
        fixture.click(10.0, 0.0);
        let old_id = fixture.tool.session().id();

        let globe = Viewer::new(ViewerKind::Globe3d, pos!(0.0, 0.0), 1.0, 800.0, 600.0);
        fixture.send(RawUserEvent::ViewerChanged(Some(globe)));

        let session = fixture.tool.session();
        assert_ne!(session.id(), old_id);
        assert_eq!(session.state(), SessionState::Armed);
        assert!(session.renders_guide_line());
        assert!(session.points().is_empty());
        assert!(fixture.map.layer().preview(old_id).is_none());
        assert_eq!(fixture.map.modes().len(), 1);
        assert!(fixture.finished.read().is_empty());
    }

    #[test]
    fn viewer_removal_leaves_tool_idle() {
        let mut fixture = Fixture::new(ShapeKind::Polygon);
        fixture.click(0.0, 0.0);

        fixture.send(RawUserEvent::ViewerChanged(None));

        assert_eq!(fixture.tool.state(), SessionState::Idle);
        assert!(fixture.map.modes().is_empty());

        fixture.send(RawUserEvent::ViewerChanged(Some(test_viewer())));
        fixture.tool.start(&mut fixture.map, true).expect("viewer is back");
        fixture.click(5.0, 5.0);
        assert_eq!(fixture.tool.session().committed_count(), 1);
    }

    #[test]
    fn start_without_viewer() {
        let tool = DrawingTool::new(DrawingSession::new(ShapeKind::Points));
        let mut map = Map::new(None);

        assert_eq!(tool.start(&mut map, false), Err(DrawError::NotReady));
        assert_eq!(tool.state(), SessionState::Idle);
    }

    #[test]
    fn restart_after_finish() {
        let mut fixture = Fixture::with_session(DrawingSession::with_config(
            ShapeKind::Points,
            DrawingConfig::default(),
        ));
        fixture.click(1.0, 1.0);
        let shape = fixture
            .tool
            .finish(&mut fixture.map)
            .expect("one point is enough");
        assert_eq!(shape.points(), &[pos!(1.0, 1.0)]);

        fixture.tool.restart(&mut fixture.map, false).expect("ready");
        assert_eq!(fixture.tool.state(), SessionState::Armed);

        fixture.click(2.0, 2.0);
        fixture.tool.finish(&mut fixture.map).expect("one point is enough");
        assert_eq!(fixture.finished.read().len(), 2);
        assert_eq!(fixture.map.layer().shapes().len(), 2);
    }

    #[test]
    fn start_after_finish_binds_new_session() {
        let mut fixture = Fixture::new(ShapeKind::Points);
        fixture.click(1.0, 1.0);
        fixture.tool.finish(&mut fixture.map).expect("one point is enough");
        let old_id = fixture.tool.session().id();

        fixture.tool.start(&mut fixture.map, false).expect("ready");

        assert_ne!(fixture.tool.session().id(), old_id);
        assert_eq!(fixture.tool.state(), SessionState::Armed);
        fixture.click(2.0, 2.0);
        assert_eq!(
            fixture.tool.session().committed_positions(),
            vec![pos!(2.0, 2.0)]
        );
    }

    #[test]
    fn restart_discards_current_drawing() {
        let mut fixture = Fixture::new(ShapeKind::Polyline);
        fixture.click(0.0, 0.0);
        fixture.click(10.0, 0.0);
        let old_id = fixture.tool.session().id();

        fixture.tool.restart(&mut fixture.map, true).expect("ready");

        let session = fixture.tool.session();
        assert_ne!(session.id(), old_id);
        assert_eq!(session.state(), SessionState::Armed);
        assert!(fixture.map.layer().preview(old_id).is_none());
        assert_eq!(fixture.map.modes().len(), 1);
        assert!(fixture.finished.read().is_empty());
    }

    #[test]
    fn undo_removes_last_point() {
        let mut fixture = Fixture::new(ShapeKind::Polyline);
        fixture.click(0.0, 0.0);
        fixture.click(10.0, 0.0);

        assert!(fixture.tool.undo(&mut fixture.map));

        assert_eq!(
            fixture.tool.session().committed_positions(),
            vec![pos!(0.0, 0.0)]
        );
    }
}
