//! Built-in WGSL sources.
//!
//! Both shaders share one vertex layout: position + normal per vertex, and a
//! per-draw record (model matrix columns, base color, object id) stepped per
//! instance. Entry points are `vs_main` / `fs_main`.

use crate::backend::{ShaderKind, ShaderSource};

/// Lit color shader for the scene pass.
pub const SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");

/// Writes the per-draw object id into an `R32Uint` attachment.
pub const OBJECT_ID_WGSL: &str = include_str!("../shaders/object_id.wgsl");

pub const SCENE_FILE: &str = "scene.wgsl";
pub const OBJECT_ID_FILE: &str = "object_id.wgsl";

pub fn scene() -> ShaderSource {
    ShaderSource::new("scene", ShaderKind::Color, SCENE_WGSL)
}

pub fn object_id() -> ShaderSource {
    ShaderSource::new("object_id", ShaderKind::ObjectId, OBJECT_ID_WGSL)
}
