use crate::EditorMode;
use bubble_common::Extent;
use bubble_render::SCENE_CLEAR_COLOR;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Editor settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub window_title: String,
    pub window_size: Extent,
    /// Size of both render targets.
    pub viewport: Extent,
    pub background: [f32; 4],
    /// Upper bound on a tick's delta time, in seconds.
    pub max_frame_delta: f32,
    /// Directory to load and watch shaders from. Built-in WGSL when unset.
    pub shader_dir: Option<PathBuf>,
    pub hot_reload_interval_ms: u64,
    pub initial_mode: EditorMode,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            window_title: "Bubble".into(),
            window_size: Extent::new(1200, 720),
            viewport: Extent::new(800, 640),
            background: SCENE_CLEAR_COLOR,
            max_frame_delta: 0.1,
            shader_dir: None,
            hot_reload_interval_ms: 250,
            initial_mode: EditorMode::Editing,
        }
    }
}

impl EditorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn hot_reload_interval(&self) -> Duration {
        Duration::from_millis(self.hot_reload_interval_ms)
    }
}
