//! Headless editor driver
//!
//! Builds the editor on the software device, runs a few frames with the
//! cursor over the viewport center, selects what is under it and optionally
//! writes the final viewport image to a PNG file.

use std::path::PathBuf;

use clap::Parser;
use light_editor::EditorLayer;
use light_engine::config::Config;
use light_engine::events::Event;
use light_engine::foundation::logging;
use light_engine::foundation::math::Vec2;
use light_engine::foundation::time::Timer;
use light_engine::input::MouseButton;
use light_engine::render::backends::SoftwareBackend;
use light_engine::render::{Renderer, RendererConfig};
use light_engine::scene::SceneRendererConfig;

/// Light editor, headless
#[derive(Debug, Parser)]
#[command(name = "light_editor", version, about)]
struct Args {
    /// Number of frames to run before exiting
    #[arg(long, default_value_t = 3)]
    frames: u64,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Editor key-value config (TOML)
    #[arg(long, default_value = "light_editor.toml")]
    config: PathBuf,

    /// Renderer settings (TOML or RON); defaults are used when absent
    #[arg(long)]
    renderer_config: Option<PathBuf>,

    /// Scene renderer settings (TOML or RON); defaults are used when absent
    #[arg(long)]
    scene_config: Option<PathBuf>,

    /// Write the final viewport color attachment here
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let args = Args::parse();

    let renderer_config = match &args.renderer_config {
        Some(path) => RendererConfig::load_from_file(path)?,
        None => RendererConfig::default(),
    };
    let scene_config = match &args.scene_config {
        Some(path) => SceneRendererConfig::load_from_file(path)?,
        None => SceneRendererConfig::default(),
    };

    let renderer = Renderer::new(Box::new(SoftwareBackend::new()), renderer_config);
    let mut editor = EditorLayer::with_scene_config(renderer, scene_config, &args.config)?;
    if editor.prompt().is_open() {
        log::info!("No project configured in {}", args.config.display());
    }

    let size = Vec2::new(args.width as f32, args.height as f32);
    editor.set_viewport_state(Vec2::zeros(), size, true, true);
    editor.on_event(&Event::MouseMoved { x: size.x * 0.5, y: size.y * 0.5 });

    let mut timer = Timer::new();
    for frame in 0..args.frames {
        editor.on_update(timer.tick())?;

        // Click once the first frame has resolved what is under the cursor
        if frame == 0 {
            editor.on_event(&Event::MouseButtonPressed(MouseButton::Left));
            editor.on_event(&Event::MouseButtonReleased(MouseButton::Left));
            let name = editor.selection().and_then(|e| editor.scene().name(e));
            log::info!("Selected {:?}", name);
        }
    }

    if let Some(text) = editor.perf_stats().hud_text() {
        log::info!("{}", text.replace('\n', "  "));
    }
    let stats = editor.scene_renderer().renderer().command().stats();
    log::info!("Last frame: {:?}", stats);

    if let Some(path) = &args.output {
        editor.save_viewport_png(path)?;
        log::info!("Wrote viewport to {}", path.display());
    }
    Ok(())
}
