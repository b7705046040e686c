//! Interactive drawing: placing points and drawing lines and polygons on the map.
//!
//! A drawing goes through the following steps:
//! 1. A [`DrawingSession`] is created for a [`ShapeKind`](mapsketch_types::ShapeKind) and
//!    [`DrawingSession::enter_draw_mode`] registers a pick mode in the map's
//!    [`InteractionModeStack`](crate::InteractionModeStack).
//! 2. Every pick on the map is given to [`DrawingSession::on_pick`], which either places a new
//!    point, treats the pick as a click on an existing point, or closes the shape.
//! 3. Points already placed can be moved with the [`DragController`]; the session is told about
//!    that through [`DrawingSession::on_point_moved`].
//! 4. [`DrawingSession::close`] finalizes the shape, or [`DrawingSession::cancel`] throws it away.
//!
//! [`DrawingTool`] runs these steps from user input events.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

mod config;
mod drag;
mod point_store;
mod session;
mod tool;

pub use config::DrawingConfig;
pub use drag::{DragController, DragEndCallback};
pub use point_store::{Point, PointId, PointStore, PointStyle};
pub use session::{
    CleanUpCallback, DrawingSession, SessionCallbacks, SessionState, StoreCallback,
};
pub use tool::{DrawingTool, FinishedCallback};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a drawing session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "session {}", self.0)
    }
}
