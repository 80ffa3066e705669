use bubble_input::{InputState, Key, MouseButton};
use bubble_render::{FlyCamera, FrameUniforms};
use glam::{Mat4, Vec3};

/// Advances the editor's view from input and elapsed time.
pub trait CameraController {
    fn on_update(&mut self, dt: f32, input: &InputState);

    fn view(&self) -> Mat4;

    fn projection(&self) -> Mat4;

    fn uniforms(&self) -> FrameUniforms {
        FrameUniforms::new(self.view(), self.projection())
    }
}

/// Fly camera driven by the editor viewport.
///
/// While the right mouse button is held, WASD moves in the view plane, Q/E
/// or Ctrl/Space move down and up, and mouse motion rotates. Shift speeds up
/// movement. The scroll wheel dollies at any time.
#[derive(Debug, Clone)]
pub struct SceneCamera {
    camera: FlyCamera,
    pub fast_multiplier: f32,
    /// Units moved per scroll line.
    pub dolly_step: f32,
}

impl SceneCamera {
    pub fn new(camera: FlyCamera) -> Self {
        Self {
            camera,
            fast_multiplier: 3.0,
            dolly_step: 0.5,
        }
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut FlyCamera {
        &mut self.camera
    }

    fn movement(input: &InputState) -> Vec3 {
        let axis = |pos: Key, neg: Key| -> f32 {
            f32::from(u8::from(input.key_held(pos))) - f32::from(u8::from(input.key_held(neg)))
        };
        let up = axis(Key::E, Key::Q) + axis(Key::Space, Key::Control);
        Vec3::new(axis(Key::D, Key::A), up.clamp(-1.0, 1.0), axis(Key::W, Key::S))
    }
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self::new(FlyCamera::default())
    }
}

impl CameraController for SceneCamera {
    fn on_update(&mut self, dt: f32, input: &InputState) {
        if input.button_held(MouseButton::Right) {
            let delta = input.mouse_delta();
            if delta != glam::Vec2::ZERO {
                self.camera.rotate(delta.x, delta.y);
            }

            let dir = Self::movement(input);
            if dir != Vec3::ZERO {
                let mut speed = self.camera.speed * dt;
                if input.key_held(Key::Shift) {
                    speed *= self.fast_multiplier;
                }
                self.camera.translate_local(dir.normalize() * speed);
            }
        }

        let scroll = input.scroll();
        if scroll != 0.0 {
            self.camera.dolly(scroll * self.dolly_step);
        }
    }

    fn view(&self) -> Mat4 {
        self.camera.view_matrix()
    }

    fn projection(&self) -> Mat4 {
        self.camera.projection_matrix()
    }
}
