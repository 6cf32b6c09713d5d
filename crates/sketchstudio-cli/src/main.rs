//! SketchStudio command-line entry point.

mod generate;
mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sketchstudio_core::config::StudioConfig;
use sketchstudio_core::handoff::{
    DesignHandoff, FileHandoffStore, HandoffMode, HandoffStore, LATEST_HANDOFF_KEY,
};
use sketchstudio_core::scene::SceneDocument;
use sketchstudio_core::sketchpad::Sketchpad;
use sketchstudio_render::{Rasterizer, SurfaceExport};
use std::path::{Path, PathBuf};

/// SketchStudio - sketch garments and turn them into design renders
#[derive(Parser, Debug)]
#[command(name = "sketchstudio")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Font used to draw text shapes (defaults to the built-in DejaVu Sans)
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterize a scene JSON file to PNG or JPEG
    #[command(alias = "export")]
    Render {
        scene: PathBuf,
        /// Output image (.png, .jpg)
        #[arg(short, long)]
        output: PathBuf,
        /// Resolution multiplier
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
    /// Replay a gesture script and save the resulting scene
    Sketch {
        script: PathBuf,
        /// Start from an existing scene instead of a blank canvas
        #[arg(long)]
        open: Option<PathBuf>,
        /// Where to write the scene JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also export an image
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Store a sketch and prompt for the generation step
    Handoff {
        #[arg(short, long)]
        prompt: String,
        /// Scene JSON or PNG/JPEG sketch
        #[arg(short, long)]
        sketch: PathBuf,
        /// Handoff directory (defaults to the platform data dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Submit a sketch to the generation endpoint and wait for the design
    Generate {
        #[arg(short, long)]
        prompt: Option<String>,
        /// Scene JSON or PNG/JPEG sketch
        #[arg(short, long)]
        sketch: Option<PathBuf>,
        /// Use the last handoff instead of --prompt/--sketch
        #[arg(long, conflicts_with_all = ["prompt", "sketch"])]
        from_handoff: bool,
        /// Handoff directory (defaults to the platform data dir)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Override the configured endpoint
        #[arg(long)]
        endpoint: Option<String>,
        /// Retry this many times after a failure
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// Hand off the built-in sample sketch and prompt
    Demo {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StudioConfig> {
    match path {
        Some(path) => {
            let mut config = StudioConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => Ok(StudioConfig::load_default()?),
    }
}

fn rasterizer(font: Option<&Path>, scale: f32) -> anyhow::Result<Rasterizer> {
    let rasterizer = Rasterizer::new().with_scale(scale);
    match font {
        Some(path) => Ok(rasterizer.with_font_file(path)?),
        None => Ok(rasterizer),
    }
}

fn handoff_store(dir: Option<PathBuf>) -> anyhow::Result<FileHandoffStore> {
    Ok(match dir {
        Some(dir) => FileHandoffStore::new(dir)?,
        None => FileHandoffStore::default_location()?,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    let font = args.font.as_deref();

    match args.command {
        Command::Render {
            scene,
            output,
            scale,
        } => {
            let doc = SceneDocument::load(&scene)
                .with_context(|| format!("loading scene {}", scene.display()))?;
            doc.export_to_file(&rasterizer(font, scale)?, &output)?;
        }
        Command::Sketch {
            script,
            open,
            output,
            image,
        } => {
            let steps = script::load(&script)?;
            let mut pad = match open {
                Some(path) => Sketchpad::open(SceneDocument::load(&path)?, &config)?,
                None => Sketchpad::with_config(&config)?,
            };
            script::Player::new().play(&mut pad, &steps)?;
            log::info!(
                "replayed {} steps, {} shapes",
                steps.len(),
                pad.surface().len()
            );

            let json = pad.serialize().to_json_pretty()?;
            match output {
                Some(path) => std::fs::write(&path, json)?,
                None => println!("{}", json),
            }
            if let Some(path) = image {
                pad.export_to_file(&rasterizer(font, 1.0)?, &path)?;
            }
        }
        Command::Handoff { prompt, sketch, dir } => {
            let uri = generate::sketch_data_uri(&sketch, &rasterizer(font, 1.0)?)?;
            let handoff = DesignHandoff::new(prompt, uri, HandoffMode::Live)?;
            let store = handoff_store(dir)?;
            store.save(LATEST_HANDOFF_KEY, &handoff).await?;
            println!("{}", store.base_path().display());
        }
        Command::Generate {
            prompt,
            sketch,
            from_handoff,
            dir,
            endpoint,
            retries,
        } => {
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
                config.validate()?;
            }
            let source = if from_handoff {
                generate::Source::Handoff(dir)
            } else {
                let sketch = sketch
                    .map(|path| generate::sketch_data_uri(&path, &rasterizer(font, 1.0)?))
                    .transpose()?;
                generate::Source::Direct { prompt, sketch }
            };
            let request = generate::load_request(source).await?;
            let url = generate::run(&config, request, retries).await?;
            println!("{}", url);
        }
        Command::Demo { dir } => {
            let store = handoff_store(dir)?;
            store.save(LATEST_HANDOFF_KEY, &DesignHandoff::demo()).await?;
            println!("{}", store.base_path().display());
        }
    }
    Ok(())
}
