//! wgpu render backend for the bubble editor.
//!
//! Owns the render target pair (scene color + depth, object id + depth),
//! one pipeline per loaded shader, and GPU copies of the mesh library.
//! Passes are recorded on `begin_pass`/draw calls and encoded and submitted
//! on `end_pass`.
//!
//! # Invariants
//! - Both targets share the viewport extent given at construction and are
//!   never resized.
//! - Only the frame orchestrator binds or clears the targets; the UI samples
//!   the scene target and [`PickReader`] copies single pick pixels.

mod gpu;
mod readback;
mod targets;

pub use gpu::WgpuSceneRenderer;
pub use readback::PickReader;
pub use targets::{OBJECT_ID_FORMAT, RenderTargetPair, SCENE_COLOR_FORMAT};
