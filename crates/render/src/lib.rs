//! Rendering adapter: renderer-agnostic pass interface.
//!
//! The frame orchestrator drives a [`RenderBackend`] through explicit passes
//! (`begin_pass` → draws → `end_pass`) against one of the two offscreen
//! targets named by [`TargetKind`]. Two backends implement it: the wgpu
//! backend in `bubble-render-wgpu`, and the CPU [`SoftwareRenderer`] here,
//! which rasterizes into plain buffers and is what headless runs and tests
//! use.
//!
//! # Invariants
//! - The renderer reads entity data but never mutates the entity store.
//! - Object-id pixels hold the raw entity handle; `0` means "no entity".
//! - Both targets use a standard `Less` depth test, so the nearest surface
//!   owns the pixel.

mod backend;
mod camera;
mod mesh;
mod object_id;
pub mod shaders;
mod software;

pub use backend::{
    AttachmentFormat, ClearValue, FrameUniforms, RenderBackend, RenderError, ShaderKind,
    ShaderReloader, ShaderSource, TargetKind,
};
pub use camera::FlyCamera;
pub use mesh::{Mesh, MeshLibrary, Vertex};
pub use object_id::ObjectId;
pub use software::{RenderCall, SoftwareRenderer};

/// Editor background for the scene pass.
pub const SCENE_CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];
