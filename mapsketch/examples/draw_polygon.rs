//! This example replays a recorded sequence of mouse events through the event processor and draws
//! a polygon with them. It moves one of the vertices with a drag before closing the shape.
//!
//! Run with `RUST_LOG=debug` to see what the drawing session does with every event.

use mapsketch::control::{EventProcessor, MouseButton, RawUserEvent};
use mapsketch::{
    pos, DrawingSession, DrawingTool, Map, MapContext, Position2d, SessionCallbacks, ShapeKind,
    Viewer, ViewerKind,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let viewer = Viewer::new(ViewerKind::Flat2d, pos!(0.0, 0.0), 10.0, 800.0, 600.0);
    let mut map = Map::new(Some(viewer));
    map.set_messenger(Some(|| log::trace!("Redraw requested")));

    let session = DrawingSession::new(ShapeKind::Polygon).with_callbacks(
        SessionCallbacks::default()
            .with_on_point_moved(|store| log::info!("Point moved, {} points", store.len()))
            .with_on_clean_up(|| log::info!("Drawing session is cleaned up")),
    );
    let tool = DrawingTool::new(session).with_on_finished(|shape| {
        match serde_json::to_string(shape) {
            Ok(json) => log::info!("Finished shape: {json}"),
            Err(err) => log::error!("Failed to serialize the shape: {err}"),
        }
    });

    let mut processor = EventProcessor::default();
    processor.add_handler(tool.clone());

    tool.start(&mut map, true).expect("map has a viewer");

    for (x, y) in [(200.0, 200.0), (600.0, 200.0), (600.0, 400.0)] {
        click(&mut processor, &mut map, x, y);
    }

    drag(&mut processor, &mut map, (600.0, 400.0), (500.0, 450.0));

    // Click on the first vertex closes the polygon.
    click(&mut processor, &mut map, 200.0, 200.0);

    for shape in map.layer().shapes() {
        log::info!("Layer contains {:?} with {} points", shape.kind(), shape.points().len());
    }
    log::info!("Cursor is {:?}", map.cursor());
    assert!(map.modes().is_empty());
}

fn click(processor: &mut EventProcessor, map: &mut Map, x: f64, y: f64) {
    processor.handle(RawUserEvent::PointerMoved(Position2d::new(x, y)), map);
    processor.handle(RawUserEvent::ButtonPressed(MouseButton::Left), map);
    processor.handle(RawUserEvent::ButtonReleased(MouseButton::Left), map);
}

fn drag(processor: &mut EventProcessor, map: &mut Map, from: (f64, f64), to: (f64, f64)) {
    const STEPS: usize = 20;

    processor.handle(RawUserEvent::PointerMoved(Position2d::new(from.0, from.1)), map);
    processor.handle(RawUserEvent::ButtonPressed(MouseButton::Left), map);
    for step in 1..=STEPS {
        let t = step as f64 / STEPS as f64;
        let position = Position2d::new(from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
        processor.handle(RawUserEvent::PointerMoved(position), map);
    }
    processor.handle(RawUserEvent::ButtonReleased(MouseButton::Left), map);
}
