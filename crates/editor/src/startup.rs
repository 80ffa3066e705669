use crate::StartupError;
use bubble_assets::{HotReloader, ResourceLoader};
use bubble_ecs::ShaderHandle;
use bubble_render::{RenderBackend, ShaderKind, shaders};

/// Pipelines every editor session needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorShaders {
    pub scene: ShaderHandle,
    /// Shared object-id shader used for every pick-pass draw.
    pub pick: ShaderHandle,
}

/// Load the scene and pick shaders into `renderer`.
///
/// Files read from a shader directory are registered with `hot_reload`.
/// Any failure is fatal to startup.
pub fn load_editor_shaders(
    renderer: &mut impl RenderBackend,
    loader: &ResourceLoader,
    hot_reload: &mut HotReloader,
) -> Result<EditorShaders, StartupError> {
    let mut load = |file: &str, kind: ShaderKind| -> Result<ShaderHandle, StartupError> {
        let source = loader.load_shader(file, kind)?;
        let handle = renderer.load_shader(&source)?;
        if let Some(path) = loader.shader_path(file) {
            hot_reload.watch(handle, source, path)?;
        }
        Ok(handle)
    };

    let shaders = EditorShaders {
        scene: load(shaders::SCENE_FILE, ShaderKind::Color)?,
        pick: load(shaders::OBJECT_ID_FILE, ShaderKind::ObjectId)?,
    };
    tracing::info!(?shaders, "editor shaders loaded");
    Ok(shaders)
}
