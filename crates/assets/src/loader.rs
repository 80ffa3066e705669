use crate::AssetError;
use bubble_render::{ShaderKind, ShaderSource, shaders};
use std::path::{Path, PathBuf};

/// Resolves shader sources by file name.
///
/// Without a shader directory only the built-in file names are known.
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    shader_dir: Option<PathBuf>,
}

impl ResourceLoader {
    /// Loader serving the WGSL compiled into the binary.
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            shader_dir: Some(dir.into()),
        }
    }

    pub fn shader_dir(&self) -> Option<&Path> {
        self.shader_dir.as_deref()
    }

    /// On-disk path of `file`, if this loader reads from a directory.
    pub fn shader_path(&self, file: &str) -> Option<PathBuf> {
        self.shader_dir.as_ref().map(|dir| dir.join(file))
    }

    /// Load `file` as a shader of `kind`. A missing file is an error.
    pub fn load_shader(&self, file: &str, kind: ShaderKind) -> Result<ShaderSource, AssetError> {
        match self.shader_path(file) {
            Some(path) => Self::load_shader_file(&path, kind),
            None => {
                let wgsl = builtin_source(file).ok_or_else(|| AssetError::NotFound(file.into()))?;
                tracing::debug!(file, "using built-in shader");
                Ok(ShaderSource::new(file, kind, wgsl))
            }
        }
    }

    pub fn load_shader_file(path: &Path, kind: ShaderKind) -> Result<ShaderSource, AssetError> {
        let wgsl = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        tracing::info!(path = %path.display(), "shader loaded");
        Ok(ShaderSource::new(label_for(path), kind, wgsl))
    }
}

fn builtin_source(file: &str) -> Option<&'static str> {
    match file {
        shaders::SCENE_FILE => Some(shaders::SCENE_WGSL),
        shaders::OBJECT_ID_FILE => Some(shaders::OBJECT_ID_WGSL),
        _ => None,
    }
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
