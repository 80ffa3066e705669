use serde::{Deserialize, Serialize};

/// Top-level editor state. Exactly one is active per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Authoring: camera, hot-reload, scripts and both render passes run.
    #[default]
    Editing,
    /// Reserved for play mode. Ticks only poll and present.
    Running,
}

impl std::fmt::Display for EditorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editing => f.write_str("editing"),
            Self::Running => f.write_str("running"),
        }
    }
}
