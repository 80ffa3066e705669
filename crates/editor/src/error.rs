use bubble_assets::AssetError;
use bubble_ecs::EcsError;
use bubble_render::RenderError;

/// A failure inside a tick. Not recovered: `run` returns it and the frame
/// loop stops.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Ecs(#[from] EcsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A missing or invalid resource while building the editor. Fatal.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
