use std::sync::Arc;

use mapsketch_types::Position;
use maybe_sync::{MaybeSend, MaybeSync};
use parking_lot::RwLock;

use crate::draw::{PointId, PointStore};
use crate::map::{Viewer, ViewerId};

/// Callback called when a point drag is finished.
pub type DragEndCallback = Arc<dyn Fn(&PointStore, PointId) + MaybeSend + MaybeSync>;

#[derive(Debug, Copy, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging { point: PointId, moved: bool },
}

/// Moves draggable points of a [`PointStore`] following pointer-down-move-up sequences.
///
/// The controller is bound to a viewer with [`DragController::set_up`] and to a store with
/// [`DragController::update_draggable_objects`]. Every pointer move while dragging is counted as a
/// drag motion sample; a [`DrawingSession`](super::DrawingSession) uses the count to tell a click
/// on a point from the end of a drag.
pub struct DragController {
    attached: Option<ViewerId>,
    store: Option<Arc<RwLock<PointStore>>>,
    state: DragState,
    drag_count: usize,
    on_drag_end: Option<DragEndCallback>,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    /// Creates a controller not attached to any viewer.
    pub fn new() -> Self {
        Self {
            attached: None,
            store: None,
            state: DragState::Idle,
            drag_count: 0,
            on_drag_end: None,
        }
    }

    /// Attaches the controller to the viewer, detaching it from the previous one first.
    ///
    /// Calling it again with the same viewer does nothing. A drag in progress on a different
    /// viewer is abandoned without calling the drag end callback.
    pub fn set_up(&mut self, viewer: &Viewer) {
        if self.attached == Some(viewer.id()) {
            return;
        }

        if self.attached.is_some() {
            self.tear_down();
        }

        log::debug!("Drag controller attached to {:?}", viewer.id());
        self.attached = Some(viewer.id());
    }

    /// Detaches the controller from the viewer. A drag in progress is abandoned without calling
    /// the drag end callback, and the drag sample counter is reset.
    pub fn tear_down(&mut self) {
        if let DragState::Dragging { point, .. } = self.state {
            log::debug!("Drag of point {point} abandoned");
        }

        if let Some(viewer) = self.attached.take() {
            log::debug!("Drag controller detached from {viewer:?}");
        }

        self.state = DragState::Idle;
        self.drag_count = 0;
    }

    /// Viewer the controller is attached to.
    pub fn attached_viewer(&self) -> Option<ViewerId> {
        self.attached
    }

    /// Replaces the set of points that can be dragged with the draggable points of `store`.
    pub fn update_draggable_objects(&mut self, store: &Arc<RwLock<PointStore>>) {
        let same_store = self
            .store
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, store));
        if !same_store {
            self.state = DragState::Idle;
            self.store = Some(store.clone());
        }
    }

    /// Stops dragging points of `store`. Does nothing if a different store is registered.
    pub fn release_draggable_objects(&mut self, store: &Arc<RwLock<PointStore>>) {
        if self
            .store
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, store))
        {
            self.store = None;
            self.state = DragState::Idle;
        }
    }

    /// Sets the callback called with the store and the moved point when a drag is finished.
    pub fn set_on_drag_end(&mut self, callback: Option<DragEndCallback>) {
        self.on_drag_end = callback;
    }

    /// Number of drag motion samples since the last reset.
    pub fn drag_count(&self) -> usize {
        self.drag_count
    }

    /// Resets the drag motion sample counter.
    pub fn reset_drag_count(&mut self) {
        self.drag_count = 0;
    }

    /// Returns true while a point is being dragged.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Point being dragged.
    pub fn dragged_point(&self) -> Option<PointId> {
        match self.state {
            DragState::Dragging { point, .. } => Some(point),
            DragState::Idle => None,
        }
    }

    /// Handles pointer press at the world `position`. Starts dragging the closest draggable point
    /// within `tolerance` map units.
    ///
    /// Returns true if a drag was started.
    pub fn pointer_down(&mut self, position: &Position, tolerance: f64) -> bool {
        if self.attached.is_none() || self.is_dragging() {
            return false;
        }

        let Some(store) = &self.store else {
            return false;
        };

        match store.read().nearest_draggable(position, tolerance) {
            Some(point) => {
                log::debug!("Started dragging point {point}");
                self.state = DragState::Dragging {
                    point,
                    moved: false,
                };
                true
            }
            None => false,
        }
    }

    /// Handles pointer move while dragging: moves the point and counts a drag motion sample.
    ///
    /// Returns true if the move was consumed by a drag.
    pub fn pointer_move(&mut self, position: &Position) -> bool {
        let DragState::Dragging { point, .. } = self.state else {
            return false;
        };

        let Some(store) = &self.store else {
            self.state = DragState::Idle;
            return false;
        };

        if !store.write().update(point, *position) {
            log::debug!("Dragged point {point} was removed from the store");
            self.state = DragState::Idle;
            return false;
        }

        self.drag_count += 1;
        self.state = DragState::Dragging { point, moved: true };
        true
    }

    /// Handles pointer release. Finishes the drag, calls the drag end callback and returns the
    /// moved point.
    ///
    /// Returns `None` if no drag was in progress or the point was pressed and released without
    /// moving.
    pub fn pointer_up(&mut self) -> Option<PointId> {
        let previous = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging { point, moved } = previous else {
            return None;
        };

        if !moved {
            return None;
        }

        log::debug!(
            "Finished dragging point {point} after {} samples",
            self.drag_count
        );

        if let (Some(callback), Some(store)) = (&self.on_drag_end, &self.store) {
            callback(&store.read(), point);
        }

        Some(point)
    }
}
