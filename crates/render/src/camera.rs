use glam::{Mat4, Vec3};

/// Fly camera with position, yaw, pitch, and projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 6.0),
            yaw: -90.0_f32.to_radians(),
            pitch: -25.0_f32.to_radians(),
            fov: 60.0_f32.to_radians(),
            aspect: 800.0 / 640.0,
            near: 0.1,
            far: 1000.0,
            speed: 5.0,
            sensitivity: 0.003,
        }
    }
}

const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

impl FlyCamera {
    /// Camera at `eye` facing `target`.
    pub fn looking_at(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        let dir = (target - eye).normalize_or(Vec3::NEG_Z);
        Self {
            position: eye,
            yaw: dir.z.atan2(dir.x),
            pitch: dir.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT),
            aspect,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move along the camera axes; `local` is (right, up, forward) in units.
    pub fn translate_local(&mut self, local: Vec3) {
        self.position += self.right() * local.x + Vec3::Y * local.y + self.forward() * local.z;
    }

    /// Move along the view direction by `amount` units.
    pub fn dolly(&mut self, amount: f32) {
        self.position += self.forward() * amount;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
