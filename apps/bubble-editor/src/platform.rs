use bubble_editor::{EditorRequest, EditorRequests};
use bubble_input::{InputState, Key, MouseButton};
use glam::Vec2;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::{
    DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Pixels per scroll line for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

/// Receives winit callbacks while the event loop is pumped.
pub struct WinitHandler {
    attributes: WindowAttributes,
    pub window: Option<Arc<Window>>,
    pub egui: Option<egui_winit::State>,
    pub input: InputState,
    pub close_requested: bool,
    pub resized: Option<winit::dpi::PhysicalSize<u32>>,
    pub create_error: Option<winit::error::OsError>,
    requests: EditorRequests,
}

impl WinitHandler {
    pub fn new(attributes: WindowAttributes, requests: EditorRequests) -> Self {
        Self {
            attributes,
            window: None,
            egui: None,
            input: InputState::new(),
            close_requested: false,
            resized: None,
            create_error: None,
            requests,
        }
    }

    fn on_key(&mut self, code: KeyCode, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        if let Some(key) = map_key(code) {
            let was_held = self.input.key_held(key);
            self.input.set_key(key, pressed);
            if pressed && !was_held {
                match key {
                    Key::F5 => self.requests.push(EditorRequest::EnterPlayMode),
                    Key::Escape => self.requests.push(EditorRequest::ExitPlayMode),
                    _ => {}
                }
            }
        }
    }

    fn on_button(&mut self, button: winit::event::MouseButton, state: ElementState) {
        let Some(button) = map_button(button) else {
            return;
        };
        let pressed = state == ElementState::Pressed;
        self.input.set_button(button, pressed);
        if button == MouseButton::Right {
            if let Some(window) = &self.window {
                window.set_cursor_visible(!pressed);
            }
        }
    }
}

impl ApplicationHandler for WinitHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                tracing::info!(id = ?window.id(), "window created");
                self.window = Some(Arc::new(window));
            }
            Err(err) => self.create_error = Some(err),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let consumed = match (&mut self.egui, &self.window) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event).consumed,
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(size) => self.resized = Some(size),
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                // Releases always go through so keys never stick.
                if !consumed || state == ElementState::Released {
                    self.on_key(code, state);
                }
            }
            WindowEvent::MouseInput { button, state, .. } => self.on_button(button, state),
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .set_cursor(Some(Vec2::new(position.x as f32, position.y as f32)));
            }
            WindowEvent::CursorLeft { .. } => self.input.set_cursor(None),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                if !consumed {
                    self.input.add_scroll(lines);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input
                .add_mouse_delta(Vec2::new(delta.0 as f32, delta.1 as f32));
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::Escape => Key::Escape,
        KeyCode::F5 => Key::F5,
        _ => return None,
    };
    Some(key)
}

fn map_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}
