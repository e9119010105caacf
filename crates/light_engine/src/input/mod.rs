//! Input codes and polled input state
//!
//! Raw window input arrives as [`crate::events::Event`]s; [`InputState`]
//! folds them into "is this key held" queries for modifier handling.

use std::collections::HashSet;

use crate::events::Event;
use crate::foundation::math::Vec2;

/// Keyboard keys the editor binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// E key
    E,
    /// R key
    R,
    /// T key
    T,
    /// O key
    O,
    /// Escape key
    Escape,
    /// Left control modifier
    LeftControl,
    /// Right control modifier
    RightControl,
    /// Left alt modifier
    LeftAlt,
    /// Left shift modifier
    LeftShift,
    /// Any other key by platform scancode
    Other(u32),
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
    /// Extra buttons
    Other(u8),
}

/// Held keys, held buttons and cursor position accumulated from events
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event into the state
    pub fn on_event(&mut self, event: &Event) {
        match *event {
            Event::KeyPressed { key, .. } => {
                self.keys.insert(key);
            }
            Event::KeyReleased { key } => {
                self.keys.remove(&key);
            }
            Event::MouseButtonPressed(button) => {
                self.buttons.insert(button);
            }
            Event::MouseButtonReleased(button) => {
                self.buttons.remove(&button);
            }
            Event::MouseMoved { x, y } => {
                self.mouse_position = Vec2::new(x, y);
            }
            _ => {}
        }
    }

    /// Whether a key is currently held
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Whether either control key is held
    pub fn is_control_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::LeftControl) || self.is_key_pressed(KeyCode::RightControl)
    }

    /// Whether a mouse button is currently held
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    /// Last known cursor position in screen pixels (origin top-left)
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }
}
