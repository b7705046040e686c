//! User input handling.
//!
//! Input is processed in several steps:
//! 1. The host converts OS events into a common [`RawUserEvent`] enum.
//! 2. `RawUserEvent` is given to the [`EventProcessor`], which keeps track of the input state
//!    (pressed buttons, pointer position, timings) and converts it into [`UserEvent`]s.
//! 3. `EventProcessor` has a list of [`UserEventHandler`]s that react to the events. The
//!    [`DrawingTool`](crate::DrawingTool) is one of them.

use mapsketch_types::{Position, Position2d};
use maybe_sync::{MaybeSend, MaybeSync};
use nalgebra::Vector2;

use crate::map::{Map, Viewer, ViewerKind};

mod event_processor;

pub use event_processor::{EventProcessor, EventProcessorConfig};

/// User input handler.
pub trait UserEventHandler {
    /// Handle the event.
    fn handle(&self, event: &UserEvent, map: &mut Map) -> EventPropagation;
}

impl<T: for<'a> Fn(&'a UserEvent, &'a mut Map) -> EventPropagation> UserEventHandler for T
where
    T: MaybeSync + MaybeSend,
{
    fn handle(&self, event: &UserEvent, map: &mut Map) -> EventPropagation {
        self(event, map)
    }
}

/// Raw user interaction event, as reported by the host platform.
///
/// It carries no input state. The state is kept by the [`EventProcessor`], which combines it with
/// `RawUserEvent`s to produce [`UserEvent`]s.
#[derive(Debug, Clone)]
pub enum RawUserEvent {
    /// A mouse button was pressed.
    ButtonPressed(MouseButton),
    /// A mouse button was released.
    ButtonReleased(MouseButton),
    /// Mouse pointer was moved to the given screen pixel position.
    PointerMoved(Position2d),
    /// The map viewer was replaced, e.g. when switching between 2D and 3D views. `None` if the
    /// viewer was destroyed.
    ViewerChanged(Option<Viewer>),
}

/// User interaction event given to [`UserEventHandler`]s.
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// A mouse button was pressed.
    ButtonPressed(MouseButton, MouseEvent),
    /// A mouse button was released.
    ButtonReleased(MouseButton, MouseEvent),
    /// A mouse button was clicked. Fired right after [`UserEvent::ButtonReleased`] if the
    /// button was released shortly after it was pressed and the pointer was not dragged.
    Click(MouseButton, MouseEvent),
    /// Fired right after the second [`UserEvent::Click`] if it followed the first one shortly.
    DoubleClick(MouseButton, MouseEvent),
    /// Mouse pointer moved.
    PointerMoved(MouseEvent),

    /// Drag started: the user pressed a mouse button and moves the pointer without releasing it.
    ///
    /// A handler returning [`EventPropagation::Consume`] for this event becomes the owner of the
    /// drag and receives all following [`UserEvent::Drag`] and [`UserEvent::DragEnded`] events.
    DragStarted(MouseButton, MouseEvent),

    /// Mouse pointer moved while dragging. The vector is the pointer move in map units.
    Drag(MouseButton, Vector2<f64>, MouseEvent),

    /// Mouse button was released while dragging.
    DragEnded(MouseButton, MouseEvent),

    /// The map viewer was replaced. `None` if the map has no viewer anymore.
    ViewerChanged(Option<ViewerKind>),
}

/// Value returned by an [`UserEventHandler`] to indicate the status of the event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventPropagation {
    /// Event should be propagated to the next handler.
    Propagate,
    /// Event should not be propagated to the next handler.
    Stop,
    /// Event should not be propagated to the next handler, and the current handler takes
    /// ownership of it. Used to take ownership of a [`UserEvent::DragStarted`].
    Consume,
}

/// Mouse button enum.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button. Places points and drags them.
    Left,
    /// Middle button.
    Middle,
    /// Secondary button. Finishes the shape being drawn.
    Right,
    /// Any other button.
    Other,
}

/// State of the mouse at the moment of the event.
#[derive(Debug, Clone)]
pub struct MouseEvent {
    /// Pointer position on the screen in pixels from the top-left corner.
    pub screen_pointer_position: Position2d,
    /// Pointer position on the map. `None` if the map has no viewer.
    pub map_pointer_position: Option<Position>,
    /// State of the mouse buttons.
    pub buttons: MouseButtonsState,
}

/// State of a mouse button.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseButtonState {
    /// Button is pressed.
    Pressed,
    /// Button is not pressed.
    Released,
}

/// State of all mouse buttons.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MouseButtonsState {
    /// State of the left mouse button.
    pub left: MouseButtonState,
    /// State of the middle mouse button.
    pub middle: MouseButtonState,
    /// State of the right mouse button.
    pub right: MouseButtonState,
}

impl MouseButtonsState {
    pub(crate) fn set_pressed(&mut self, button: MouseButton) {
        self.set_state(button, MouseButtonState::Pressed);
    }

    pub(crate) fn set_released(&mut self, button: MouseButton) {
        self.set_state(button, MouseButtonState::Released);
    }

    fn set_state(&mut self, button: MouseButton, state: MouseButtonState) {
        match button {
            MouseButton::Left => self.left = state,
            MouseButton::Middle => self.middle = state,
            MouseButton::Right => self.right = state,
            MouseButton::Other => {}
        }
    }

    fn single_pressed(&self) -> Option<MouseButton> {
        let pressed = [
            (self.left, MouseButton::Left),
            (self.middle, MouseButton::Middle),
            (self.right, MouseButton::Right),
        ];
        let mut buttons = pressed
            .into_iter()
            .filter(|(state, _)| *state == MouseButtonState::Pressed)
            .map(|(_, button)| button);

        match (buttons.next(), buttons.next()) {
            (Some(button), None) => Some(button),
            _ => None,
        }
    }
}

impl Default for MouseButtonsState {
    fn default() -> Self {
        Self {
            left: MouseButtonState::Released,
            middle: MouseButtonState::Released,
            right: MouseButtonState::Released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pressed_button() {
        let mut state = MouseButtonsState::default();
        assert_eq!(state.single_pressed(), None);

        state.set_pressed(MouseButton::Right);
        assert_eq!(state.single_pressed(), Some(MouseButton::Right));

        state.set_pressed(MouseButton::Left);
        assert_eq!(state.single_pressed(), None);

        state.set_released(MouseButton::Right);
        assert_eq!(state.single_pressed(), Some(MouseButton::Left));
    }
}
