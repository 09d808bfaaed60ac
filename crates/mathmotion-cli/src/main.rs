use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mathmotion_cli::{all_scenes, find_scene};
use mathmotion_core::SceneConfig;
use mathmotion_scene::{Construct, RecordingSink, Scene};

#[derive(Parser)]
#[command(
    name = "mathmotion",
    version,
    about = "mathmotion: programmatic animation of mathematical scenes",
    long_about = "Describe a scene as objects and beats, and mathmotion plays it on a\nlogical clock, sampling every frame's state for a renderer."
)]
struct Cli {
    /// Scene configuration file (TOML). Defaults are used when absent.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one built-in scene, or all of them
    Run {
        /// Scene name, as printed by `mathmotion list`
        #[arg(required_unless_present = "all")]
        scene: Option<String>,

        /// Run every built-in scene in order
        #[arg(long, conflicts_with = "scene")]
        all: bool,
    },

    /// List the built-in scenes
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Some(path) = &cli.config {
        load_config(path)?;
    }

    match cli.command {
        Commands::Run { scene, all } => {
            let scenes = if all {
                all_scenes()
            } else {
                let name = scene.unwrap_or_default();
                vec![find_scene(&name).with_context(|| format!("no scene named '{}'", name))?]
            };
            cmd_run(&scenes)
        }
        Commands::List => {
            for scene in all_scenes() {
                println!("{}", scene.name());
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = SceneConfig::from_toml_str(&text)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    if SceneConfig::install(config).is_err() {
        anyhow::bail!("scene configuration was already initialised");
    }
    tracing::debug!(path = %path.display(), "loaded scene config");
    Ok(())
}

fn cmd_run(scenes: &[Box<dyn Construct>]) -> Result<()> {
    let mut failed = 0;
    for construct in scenes {
        let start = Instant::now();
        let sink = RecordingSink::new();
        let mut scene = Scene::new().with_sink(sink.clone());
        let status = scene.run(construct.as_ref());
        println!(
            "{}: {} ({} samples, {} logical, {:.2}s)",
            construct.name(),
            status,
            sink.len(),
            scene.clock(),
            start.elapsed().as_secs_f64()
        );
        if !status.is_ok() {
            failed += 1;
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} scenes failed", failed, scenes.len());
    }
    Ok(())
}
