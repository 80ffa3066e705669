mod desktop;
mod platform;
mod ui;

use anyhow::Context;
use bubble_assets::{HotReloader, ResourceLoader};
use bubble_ecs::ComponentStore;
use bubble_editor::{
    EditorConfig, EditorMode, EditorRequests, FrameOrchestrator, load_editor_shaders,
    spawn_demo_scene,
};
use bubble_render::MeshLibrary;
use bubble_render_wgpu::WgpuSceneRenderer;
use bubble_script::NativeScriptRunner;
use clap::Parser;
use desktop::DesktopWindow;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use ui::EguiEditorUi;

#[derive(Parser)]
#[command(name = "bubble-editor", about = "Bubble scene editor")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Editor config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load and watch shaders in this directory
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Start in play mode
    #[arg(long)]
    play: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("bubble-editor starting");

    let mut config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    if cli.shader_dir.is_some() {
        config.shader_dir = cli.shader_dir;
    }
    if cli.play {
        config.initial_mode = EditorMode::Running;
    }

    let requests = EditorRequests::new();
    let mut window = DesktopWindow::new(&config, requests.clone())?;

    let mut renderer = WgpuSceneRenderer::new(
        window.device(),
        window.queue(),
        config.viewport,
        &MeshLibrary::new(),
    );
    let loader = match &config.shader_dir {
        Some(dir) => ResourceLoader::from_dir(dir),
        None => ResourceLoader::builtin(),
    };
    let mut hot_reload = HotReloader::new(config.hot_reload_interval());
    let shaders = load_editor_shaders(&mut renderer, &loader, &mut hot_reload)
        .context("loading editor shaders")?;

    let scene_texture = window.register_texture(renderer.targets().scene_view());
    let ui = EguiEditorUi::new(
        window.egui_context(),
        scene_texture,
        config.viewport,
        renderer.pick_reader(),
        requests.clone(),
    );

    let mut store = ComponentStore::new();
    let mut scripts = NativeScriptRunner::new();
    spawn_demo_scene(&mut store, shaders.scene, &mut scripts)?;

    let mut editor = FrameOrchestrator::new(renderer, store, shaders.pick, &config)
        .with_script_runner(scripts)
        .with_hot_reload(hot_reload)
        .with_ui(ui)
        .with_requests(requests);

    editor.run(&mut window)?;

    let stats = editor.stats();
    tracing::info!(
        ticks = stats.ticks,
        editing_ticks = stats.editing_ticks,
        draws = stats.draws,
        "bubble-editor exiting"
    );
    Ok(())
}
