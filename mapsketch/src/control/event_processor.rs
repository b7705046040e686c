use std::time::Duration;

use mapsketch_types::{PlanarPoint, Position, Position2d};
use nalgebra::Vector2;
use web_time::SystemTime;

use crate::control::{
    EventPropagation, MouseButtonsState, MouseEvent, RawUserEvent, UserEvent, UserEventHandler,
};
use crate::map::{Map, MapContext, Viewer};

const DEFAULT_DRAG_THRESHOLD_PX: f64 = 3.0;
const DEFAULT_CLICK_TIMEOUT: Duration = Duration::from_millis(200);
const DEFAULT_DBL_CLICK_TIMEOUT: Duration = Duration::from_millis(500);

/// Timings and distances used by the [`EventProcessor`] to recognize clicks and drags.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EventProcessorConfig {
    drag_threshold_px: f64,
    click_timeout: Duration,
    dbl_click_timeout: Duration,
}

impl Default for EventProcessorConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            click_timeout: DEFAULT_CLICK_TIMEOUT,
            dbl_click_timeout: DEFAULT_DBL_CLICK_TIMEOUT,
        }
    }
}

impl EventProcessorConfig {
    /// Distance in pixels (taxicab) the pointer must move with a pressed button to start a drag.
    pub fn drag_threshold_px(&self) -> f64 {
        self.drag_threshold_px
    }

    /// Sets the distance the pointer must move with a pressed button to start a drag.
    pub fn with_drag_threshold_px(mut self, threshold: f64) -> Self {
        self.drag_threshold_px = threshold;
        self
    }

    /// Maximum time between button press and release for the release to be a click.
    pub fn click_timeout(&self) -> Duration {
        self.click_timeout
    }

    /// Sets maximum time between button press and release for the release to be a click.
    pub fn with_click_timeout(mut self, timeout: Duration) -> Self {
        self.click_timeout = timeout;
        self
    }

    /// Maximum time between two clicks for the second one to be a double click.
    pub fn dbl_click_timeout(&self) -> Duration {
        self.dbl_click_timeout
    }

    /// Sets maximum time between two clicks for the second one to be a double click.
    pub fn with_dbl_click_timeout(mut self, timeout: Duration) -> Self {
        self.dbl_click_timeout = timeout;
        self
    }
}

/// Converts [`RawUserEvent`]s into [`UserEvent`]s and runs them through the handler chain.
///
/// Handlers are called in the order they were added until one of them stops the event. Drag events
/// are only given to the handler that consumed the [`UserEvent::DragStarted`] event. Viewer
/// changes are given to every handler.
pub struct EventProcessor {
    config: EventProcessorConfig,
    handlers: Vec<Box<dyn UserEventHandler>>,
    pointer_position: Position2d,
    pointer_pressed_position: Position2d,

    buttons_state: MouseButtonsState,

    last_pressed_time: SystemTime,
    last_click_time: SystemTime,

    drag_target: Option<usize>,
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new(EventProcessorConfig::default())
    }
}

impl EventProcessor {
    /// Creates a processor with no handlers.
    pub fn new(config: EventProcessorConfig) -> Self {
        Self {
            config,
            handlers: vec![],
            pointer_position: Position2d::origin(),
            pointer_pressed_position: Position2d::origin(),
            buttons_state: Default::default(),
            last_pressed_time: SystemTime::UNIX_EPOCH,
            last_click_time: SystemTime::UNIX_EPOCH,
            drag_target: None,
        }
    }

    /// Configuration of the processor.
    pub fn config(&self) -> &EventProcessorConfig {
        &self.config
    }

    /// Adds a handler to the end of the chain.
    pub fn add_handler(&mut self, handler: impl UserEventHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Returns true if there is a drag in progress owned by a handler.
    pub fn is_dragging(&self) -> bool {
        self.drag_target.is_some()
    }

    /// Processes a raw event.
    pub fn handle(&mut self, event: RawUserEvent, map: &mut Map) {
        if let RawUserEvent::ViewerChanged(viewer) = event {
            self.change_viewer(viewer, map);
            return;
        }

        for user_event in self.process(event, map) {
            let mut drag_start_target = None;

            let delta = self.get_map_delta(map, self.pointer_pressed_position);
            let mouse_event = self.get_mouse_event(map);

            for (index, handler) in self.handlers.iter().enumerate() {
                if matches!(user_event, UserEvent::Drag(..) | UserEvent::DragEnded(..))
                    && self.drag_target != Some(index)
                {
                    continue;
                }

                match handler.handle(&user_event, map) {
                    EventPropagation::Propagate => {}
                    EventPropagation::Stop => break,
                    EventPropagation::Consume => {
                        if let UserEvent::DragStarted(button, _) = user_event {
                            drag_start_target = Some(index);

                            handler.handle(&UserEvent::Drag(button, delta, mouse_event), map);
                        }

                        break;
                    }
                }
            }

            if drag_start_target.is_some() {
                self.drag_target = drag_start_target;
            }

            if let UserEvent::DragEnded(..) = user_event {
                self.drag_target = None;
            }
        }
    }

    fn change_viewer(&mut self, viewer: Option<Viewer>, map: &mut Map) {
        let kind = viewer.as_ref().map(Viewer::kind);
        map.set_viewer(viewer);

        self.drag_target = None;
        self.buttons_state = MouseButtonsState::default();

        let event = UserEvent::ViewerChanged(kind);
        for handler in &self.handlers {
            handler.handle(&event, map);
        }
    }

    fn process(&mut self, event: RawUserEvent, map: &Map) -> Vec<UserEvent> {
        let now = SystemTime::now();
        match event {
            RawUserEvent::ButtonPressed(button) => {
                self.buttons_state.set_pressed(button);
                self.last_pressed_time = now;
                self.pointer_pressed_position = self.pointer_position;

                vec![UserEvent::ButtonPressed(button, self.get_mouse_event(map))]
            }
            RawUserEvent::ButtonReleased(button) => {
                self.buttons_state.set_released(button);
                let mouse_event = self.get_mouse_event(map);
                let mut events = vec![UserEvent::ButtonReleased(button, mouse_event.clone())];

                // The drag target is cleared after `DragEnded` reaches it.
                if self.drag_target.is_some() {
                    events.push(UserEvent::DragEnded(button, mouse_event));
                    return events;
                }

                if now
                    .duration_since(self.last_pressed_time)
                    .unwrap_or_default()
                    < self.config.click_timeout
                {
                    events.push(UserEvent::Click(button, mouse_event.clone()));

                    if now.duration_since(self.last_click_time).unwrap_or_default()
                        < self.config.dbl_click_timeout
                    {
                        events.push(UserEvent::DoubleClick(button, mouse_event));
                        self.last_click_time = SystemTime::UNIX_EPOCH;
                    } else {
                        self.last_click_time = now;
                    }
                }

                events
            }
            RawUserEvent::PointerMoved(position) => {
                let prev_position = self.pointer_position;
                self.pointer_position = position;

                let mut events = vec![UserEvent::PointerMoved(self.get_mouse_event(map))];
                if let Some(button) = self.buttons_state.single_pressed() {
                    if self.drag_target.is_none()
                        && position.taxicab_distance(&self.pointer_pressed_position)
                            > self.config.drag_threshold_px
                    {
                        events.push(UserEvent::DragStarted(
                            button,
                            self.get_mouse_event_pos(map, self.pointer_pressed_position),
                        ));
                    }

                    if self.drag_target.is_some() {
                        events.push(UserEvent::Drag(
                            button,
                            self.get_map_delta(map, prev_position),
                            self.get_mouse_event(map),
                        ));
                    }
                }

                events
            }
            RawUserEvent::ViewerChanged(_) => vec![],
        }
    }

    fn get_mouse_event(&self, map: &Map) -> MouseEvent {
        self.get_mouse_event_pos(map, self.pointer_position)
    }

    fn get_mouse_event_pos(&self, map: &Map, screen_pointer_position: Position2d) -> MouseEvent {
        MouseEvent {
            screen_pointer_position,
            map_pointer_position: to_map(map, screen_pointer_position),
            buttons: self.buttons_state,
        }
    }

    fn get_map_delta(&self, map: &Map, prev_position: Position2d) -> Vector2<f64> {
        match (
            to_map(map, self.pointer_position),
            to_map(map, prev_position),
        ) {
            (Some(curr), Some(prev)) => Vector2::new(curr.x - prev.x, curr.y - prev.y),
            _ => Vector2::zeros(),
        }
    }
}

fn to_map(map: &Map, px_position: Position2d) -> Option<Position> {
    map.viewer()?.screen_to_world(px_position)
}
