//! Shader resource loading and polling hot-reload.
//!
//! [`ResourceLoader`] resolves shader sources at startup, either from a
//! configured shader directory or from the WGSL built into `bubble-render`.
//! [`HotReloader`] watches the files it was told about and pushes changed
//! sources into a [`ShaderReloader`] synchronously, inside the frame that
//! polls it.

mod hot_reload;
mod loader;

pub use hot_reload::{HotReload, HotReloader};
pub use loader::ResourceLoader;

use std::path::PathBuf;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset not found: {0}")]
    NotFound(PathBuf),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
