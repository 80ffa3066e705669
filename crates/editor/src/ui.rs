use crate::EditorMode;
use std::path::Path;

/// Immediate-mode editor UI.
///
/// `on_update` runs before the render passes, `on_draw` inside the UI frame
/// after them.
pub trait EditorUi {
    fn on_update(&mut self, dt: f32);

    fn on_draw(&mut self, dt: f32);

    /// A project was requested through the UI or a shortcut.
    fn on_open_project(&mut self, path: &Path) {
        tracing::info!(path = %path.display(), "open project requested");
    }

    fn on_mode_changed(&mut self, _mode: EditorMode) {}
}

/// UI that draws nothing. Used by headless runs.
#[derive(Debug, Default)]
pub struct NullUi {
    pub updates: u64,
    pub draws: u64,
}

impl EditorUi for NullUi {
    fn on_update(&mut self, _dt: f32) {
        self.updates += 1;
    }

    fn on_draw(&mut self, _dt: f32) {
        self.draws += 1;
    }
}
