//! Mapsketch is an interactive drawing pipeline for map viewers. It lets a user place points and
//! draw polylines or polygons on a map surface, drag placed vertices around and finalize the
//! result into a persisted [`Shape`].
//!
//! # Main components
//!
//! * [`DrawingSession`] is the state machine at the heart of the crate. It consumes resolved pick
//!   events and pointer moves, keeps the placed points in its [`PointStore`] and pushes the
//!   current position sequence to a [`ShapeRenderer`] after every change.
//! * [`DragController`] detects pointer-down-drag-up sequences on placed points and moves them.
//! * [`MapContext`] is the narrow capability interface the session talks to: the
//!   [`InteractionModeStack`], cursor style, renderer, drag controller and repaint requests.
//!   [`Map`] is a ready-to-use implementation of it backed by a [`ShapeLayer`].
//!
//! User input is handled the same way as in a map engine: raw input is converted by an
//! [`EventProcessor`](control::EventProcessor) into [`UserEvent`](control::UserEvent)s, which are
//! given to a chain of [`UserEventHandler`](control::UserEventHandler)s. [`DrawingTool`] is the
//! handler that connects a session to the map input.
//!
//! ```no_run
//! use mapsketch::control::{EventProcessor, MouseButton, RawUserEvent};
//! use mapsketch::{pos, DrawingSession, DrawingTool, Map, Position2d, ShapeKind, Viewer, ViewerKind};
//!
//! let viewer = Viewer::new(ViewerKind::Flat2d, pos!(0.0, 0.0), 1.0, 800.0, 600.0);
//! let mut map = Map::new(Some(viewer));
//!
//! let tool = DrawingTool::new(DrawingSession::new(ShapeKind::Polygon));
//! tool.start(&mut map, true).expect("viewer is ready");
//!
//! let mut processor = EventProcessor::default();
//! processor.add_handler(tool);
//!
//! processor.handle(RawUserEvent::PointerMoved(Position2d::new(100.0, 100.0)), &mut map);
//! processor.handle(RawUserEvent::ButtonPressed(MouseButton::Left), &mut map);
//! processor.handle(RawUserEvent::ButtonReleased(MouseButton::Left), &mut map);
//! ```

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod color;
pub mod control;
pub mod draw;
pub mod error;
pub mod map;
mod messenger;
pub mod render;

#[cfg(test)]
pub(crate) mod tests;

pub use color::Color;
pub use draw::{
    DragController, DrawingConfig, DrawingSession, DrawingTool, Point, PointId, PointStore,
    PointStyle, SessionCallbacks, SessionId, SessionState,
};
pub use error::DrawError;
pub use map::{
    CursorStyle, InteractionModeStack, Map, MapContext, ModeId, PickEvent, PickedEntity, Viewer,
    ViewerId, ViewerKind,
};
pub use messenger::Messenger;
pub use render::{PointSource, ShapeLayer, ShapePreview, ShapeRenderer};

// Reexport mapsketch_types
pub use mapsketch_types;
pub use mapsketch_types::{pos, Position, Position2d, Shape, ShapeKind};
