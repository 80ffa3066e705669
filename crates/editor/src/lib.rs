//! Frame orchestration for the bubble editor.
//!
//! [`FrameOrchestrator`] drives one editor session: it polls the window,
//! advances the [`FrameClock`], applies queued [`EditorRequest`]s and, in
//! [`EditorMode::Editing`], updates the camera, hot-reload and UI, dispatches
//! scripts and renders the scene and pick passes before the UI composites
//! and the window presents.
//!
//! # Invariants
//! - The tick order is fixed: poll, clock, requests, mode pipeline, present.
//! - Requests are the only way the mode changes.
//! - Only the orchestrator binds or clears the render targets.
//! - Errors inside a tick are returned, never retried.

mod camera;
mod clock;
mod config;
mod demo;
mod error;
mod mode;
mod orchestrator;
mod requests;
mod startup;
mod stats;
mod ui;
mod window;

pub use camera::{CameraController, SceneCamera};
pub use clock::FrameClock;
pub use config::{ConfigError, EditorConfig};
pub use demo::spawn_demo_scene;
pub use error::{FrameError, StartupError};
pub use mode::EditorMode;
pub use orchestrator::{FrameOrchestrator, PICK_VIEW, SCENE_VIEW};
pub use requests::{EditorRequest, EditorRequests};
pub use startup::{EditorShaders, load_editor_shaders};
pub use stats::FrameStats;
pub use ui::{EditorUi, NullUi};
pub use window::{HeadlessWindow, Window};
