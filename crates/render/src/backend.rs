use bubble_common::Extent;
use bubble_ecs::{Model, ShaderHandle};
use glam::Mat4;

use crate::object_id::ObjectId;

/// Which of the two offscreen targets a pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// RGBA color + depth, displayed by the editor UI.
    Scene,
    /// Unsigned-integer object id + depth, read back for picking.
    Pick,
}

impl TargetKind {
    pub fn color_format(self) -> AttachmentFormat {
        match self {
            Self::Scene => AttachmentFormat::Rgba8,
            Self::Pick => AttachmentFormat::ObjectId,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Scene => "scene_target",
            Self::Pick => "pick_target",
        }
    }
}

/// Format of a target's first attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentFormat {
    Rgba8,
    /// 32-bit unsigned integer, one entity handle per pixel.
    ObjectId,
}

/// Clear applied when a pass begins. Depth is always cleared to the far plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    ObjectId(ObjectId),
}

impl ClearValue {
    pub fn format(&self) -> AttachmentFormat {
        match self {
            Self::Color(_) => AttachmentFormat::Rgba8,
            Self::ObjectId(_) => AttachmentFormat::ObjectId,
        }
    }
}

/// What a shader writes to its color attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Shaded color, for the scene target.
    Color,
    /// Per-draw object id uniform, for the pick target.
    ObjectId,
}

impl ShaderKind {
    pub fn format(self) -> AttachmentFormat {
        match self {
            Self::Color => AttachmentFormat::Rgba8,
            Self::ObjectId => AttachmentFormat::ObjectId,
        }
    }
}

/// WGSL source plus the kind of output it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub label: String,
    pub kind: ShaderKind,
    pub wgsl: String,
}

impl ShaderSource {
    pub fn new(label: impl Into<String>, kind: ShaderKind, wgsl: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind,
            wgsl: wgsl.into(),
        }
    }
}

/// Camera matrices shared by every draw of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
}

impl FrameUniforms {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// Errors from render operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("unknown shader {0:?}")]
    UnknownShader(ShaderHandle),
    #[error("unknown mesh {0:?}")]
    UnknownMesh(bubble_ecs::MeshHandle),
    #[error("shader {shader:?} writes {shader_format:?}, target expects {target_format:?}")]
    ShaderTargetMismatch {
        shader: ShaderHandle,
        shader_format: AttachmentFormat,
        target_format: AttachmentFormat,
    },
    #[error("clear value {clear:?} does not fit the {target:?} target")]
    ClearTargetMismatch { target: TargetKind, clear: AttachmentFormat },
    #[error("shader {0:?} has no object-id uniform")]
    NoObjectIdUniform(ShaderHandle),
    #[error("no render pass is active")]
    NoActivePass,
    #[error("a {0:?} pass is already active")]
    PassAlreadyActive(TargetKind),
    #[error("shader '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },
    #[error("read-back failed: {0}")]
    Readback(String),
}

/// Accepts new source for an already loaded shader.
///
/// Used by the hot-reload poller; on error the previous pipeline stays bound
/// to the handle.
pub trait ShaderReloader {
    fn reload_shader(&mut self, shader: ShaderHandle, source: &ShaderSource)
    -> Result<(), RenderError>;
}

/// Pass-oriented renderer interface driven by the frame orchestrator.
///
/// A pass binds one target and clears it; draws issued until `end_pass`
/// land in that target only.
pub trait RenderBackend: ShaderReloader {
    /// Size shared by both targets, fixed at construction.
    fn extent(&self) -> Extent;

    /// Build a pipeline from `source`. Used at startup; failures are fatal.
    fn load_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError>;

    /// Upload the camera matrices used by every draw until the next call.
    fn set_frame_uniforms(&mut self, uniforms: &FrameUniforms);

    /// Bind `target` and clear its color/id and depth attachments.
    fn begin_pass(&mut self, target: TargetKind, clear: ClearValue) -> Result<(), RenderError>;

    /// Set the per-draw object id uniform of an object-id shader.
    fn set_object_id(&mut self, shader: ShaderHandle, id: ObjectId) -> Result<(), RenderError>;

    /// Draw `model` with world matrix `world` using `shader`.
    fn draw_model(
        &mut self,
        model: &Model,
        world: Mat4,
        shader: ShaderHandle,
    ) -> Result<(), RenderError>;

    /// Finish the active pass and submit its work.
    fn end_pass(&mut self) -> Result<(), RenderError>;
}
