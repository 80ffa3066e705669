use anyhow::Context;
use bubble_assets::{HotReloader, ResourceLoader};
use bubble_common::Extent;
use bubble_ecs::ComponentStore;
use bubble_editor::{
    EditorConfig, EditorMode, FrameClock, FrameOrchestrator, HeadlessWindow, load_editor_shaders,
    spawn_demo_scene,
};
use bubble_render::{ObjectId, SoftwareRenderer};
use bubble_script::NativeScriptRunner;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bubble-cli", about = "Headless frame runner for the bubble editor")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Editor config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load shaders from this directory instead of the built-in sources
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Start in play mode
    #[arg(long)]
    play: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective configuration
    Info,
    /// Run frames over the demo scene and print frame statistics
    Frames {
        /// Number of ticks to run
        #[arg(short, long, default_value = "60")]
        ticks: u64,
    },
    /// Render one editing frame and report the entity under a pixel
    Pick {
        x: u32,
        y: u32,
    },
    /// Render one editing frame and print the pick target as text
    Map {
        /// Characters per row
        #[arg(short, long, default_value = "80")]
        columns: u32,
    },
}

type HeadlessEditor = FrameOrchestrator<SoftwareRenderer, ComponentStore>;

fn build_editor(config: &EditorConfig) -> anyhow::Result<HeadlessEditor> {
    let loader = match &config.shader_dir {
        Some(dir) => ResourceLoader::from_dir(dir),
        None => ResourceLoader::builtin(),
    };
    let mut renderer = SoftwareRenderer::new(config.viewport);
    let mut hot_reload = HotReloader::new(config.hot_reload_interval());
    let shaders = load_editor_shaders(&mut renderer, &loader, &mut hot_reload)
        .context("loading editor shaders")?;

    let mut store = ComponentStore::new();
    let mut scripts = NativeScriptRunner::new();
    spawn_demo_scene(&mut store, shaders.scene, &mut scripts)?;

    Ok(FrameOrchestrator::new(renderer, store, shaders.pick, config)
        .with_script_runner(scripts)
        .with_hot_reload(hot_reload)
        .with_clock(FrameClock::fixed(1.0 / 60.0)))
}

/// One editing frame, regardless of the configured start mode.
fn render_once(config: &EditorConfig) -> anyhow::Result<HeadlessEditor> {
    let config = EditorConfig {
        initial_mode: EditorMode::Editing,
        ..config.clone()
    };
    let mut editor = build_editor(&config)?;
    editor.run(&mut HeadlessWindow::closing_after(1))?;
    Ok(editor)
}

fn pick_glyph(id: ObjectId) -> char {
    match id.0 {
        0 => '.',
        n @ 1..=9 => char::from_digit(n, 10).unwrap_or('#'),
        _ => '#',
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    if cli.shader_dir.is_some() {
        config.shader_dir = cli.shader_dir.clone();
    }
    if cli.play {
        config.initial_mode = EditorMode::Running;
    }

    match cli.command {
        Commands::Info => {
            println!("bubble-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "viewport: {}x{}",
                config.viewport.width, config.viewport.height
            );
            println!("initial mode: {}", config.initial_mode);
            match &config.shader_dir {
                Some(dir) => println!("shaders: {}", dir.display()),
                None => println!("shaders: built-in"),
            }
            println!("pick handle ceiling: {}", ObjectId::MAX_HANDLE);
        }
        Commands::Frames { ticks } => {
            tracing::info!(ticks, mode = %config.initial_mode, "running headless frames");
            let mut editor = build_editor(&config)?;
            editor.run(&mut HeadlessWindow::closing_after(ticks))?;
            let stats = editor.stats();
            println!("ticks: {}", stats.ticks);
            println!("editing ticks: {}", stats.editing_ticks);
            println!(
                "passes: scene={} pick={}",
                stats.scene_passes, stats.pick_passes
            );
            println!("draws: {}", stats.draws);
            println!("script dispatches: {}", stats.script_dispatches);
        }
        Commands::Pick { x, y } => {
            let editor = render_once(&config)?;
            let id = editor.renderer().read_object_id(x, y);
            match id.entity() {
                Some(entity) => println!("({x}, {y}) -> entity {entity}"),
                None => println!("({x}, {y}) -> none"),
            }
        }
        Commands::Map { columns } => {
            let editor = render_once(&config)?;
            let Extent { width, height } = config.viewport;
            let columns = columns.clamp(1, width.max(1));
            let step_x = width / columns;
            // Terminal cells are about twice as tall as wide.
            let step_y = (step_x * 2).max(1);
            for row in 0..height / step_y {
                let line: String = (0..columns)
                    .map(|col| {
                        let id = editor
                            .renderer()
                            .read_object_id(col * step_x + step_x / 2, row * step_y + step_y / 2);
                        pick_glyph(id)
                    })
                    .collect();
                println!("{line}");
            }
        }
    }

    Ok(())
}
