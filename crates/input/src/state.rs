use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys the editor reacts to. Platform key codes are mapped onto this set by
/// the window layer; anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Space,
    Shift,
    Control,
    Escape,
    F5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard and mouse state as seen by one tick.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys_held: HashSet<Key>,
    keys_pressed: HashSet<Key>,
    buttons_held: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    mouse_delta: Vec2,
    cursor: Option<Vec2>,
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame deltas. Called by the window layer before it drains
    /// platform events for the next tick.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.buttons_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll = 0.0;
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            if self.keys_held.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else {
            self.keys_held.remove(&key);
        }
    }

    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if self.buttons_held.insert(button) {
                self.buttons_pressed.insert(button);
            }
        } else {
            self.buttons_held.remove(&button);
        }
    }

    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn set_cursor(&mut self, position: Option<Vec2>) {
        self.cursor = position;
    }

    pub fn add_scroll(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_held.clear();
        self.buttons_held.clear();
    }

    pub fn key_held(&self, key: Key) -> bool {
        self.keys_held.contains(&key)
    }

    /// Whether `key` went down during this frame (auto-repeat excluded).
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }

    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }
}
