/// Platform-agnostic input handling
use std::collections::HashMap;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Physical key went down; carries the W3C key code ("KeyW")
    KeyDown(String),
    KeyUp(String),

    /// Relative mouse motion in pixels
    MouseMove { dx: f32, dy: f32 },

    /// Pointer lock acquired or released by the platform
    PointerLockChanged { locked: bool },
}

/// Key-code to pressed flag. Entries are never removed; a released key
/// stays in the map as `false`.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashMap<String, bool>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key_down(&mut self, code: &str) {
        self.keys.insert(code.to_string(), true);
    }

    pub fn on_key_up(&mut self, code: &str) {
        self.keys.insert(code.to_string(), false);
    }

    pub fn is_pressed(&self, code: &str) -> bool {
        self.keys.get(code).copied().unwrap_or(false)
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(code) => self.on_key_down(code),
            InputEvent::KeyUp(code) => self.on_key_up(code),
            _ => {}
        }
    }
}

type Handler = Box<dyn FnMut(&InputEvent)>;

/// Fan-out of input events to registered handlers, in registration order.
/// Platform glue translates browser or window events and dispatches them here.
#[derive(Default)]
pub struct InputDispatcher {
    handlers: Vec<Handler>,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl FnMut(&InputEvent) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn dispatch(&mut self, event: &InputEvent) {
        tracing::trace!(?event, "dispatch");
        for handler in self.handlers.iter_mut() {
            handler(event);
        }
    }
}

pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let code = e.code();
        if is_down {
            InputEvent::KeyDown(code)
        } else {
            InputEvent::KeyUp(code)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::event::ElementState;
    use winit::keyboard::PhysicalKey;

    /// winit names its key codes after the W3C codes, so the `Debug` name
    /// is the same string a browser reports.
    pub fn key_event_to_input(key: &PhysicalKey, state: ElementState) -> Option<InputEvent> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        let code = format!("{code:?}");
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown(code),
            ElementState::Released => InputEvent::KeyUp(code),
        })
    }

    pub fn mouse_motion_to_input(delta: (f64, f64)) -> InputEvent {
        InputEvent::MouseMove {
            dx: delta.0 as f32,
            dy: delta.1 as f32,
        }
    }
}
