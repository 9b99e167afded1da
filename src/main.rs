use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scene_compositor::{AssemblyEngine, Config, JobManifest};

#[derive(Parser)]
#[command(
    name = "scene-compositor",
    version,
    about = "Assemble scene-ordered stills and clips into one graded video",
    long_about = "Scene-Compositor reads a job manifest listing visual assets per scene, \
                  normalizes them to one frame size, adds motion, captions and a color grade, \
                  mixes music, ambience and narration, and writes a single timestamped mp4."
)]
struct Cli {
    /// Job manifest (TOML) listing assets and audio
    #[arg(short, long)]
    manifest: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Style tag, overriding the manifest's
    #[arg(short, long)]
    style: Option<String>,

    /// Directory for the finished video, overriding the configuration
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seed for the zoom-direction choice
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<scene_compositor::CompositorError>() {
                Some(err) if err.is_no_media() => {
                    error!("{}", err.user_message());
                    return ExitCode::from(2);
                }
                Some(err) => error!("{}", err.user_message()),
                None => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<PathBuf> {
    info!("Starting Scene-Compositor v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output.output_dir = dir;
    }
    if cli.seed.is_some() {
        config.motion.seed = cli.seed;
    }

    let manifest = JobManifest::from_file(&cli.manifest)
        .with_context(|| format!("reading manifest {:?}", cli.manifest))?;
    let style = cli.style.unwrap_or_else(|| manifest.style.clone());
    let audio = manifest.audio_sources();

    info!("Manifest: {:?} ({} assets)", cli.manifest, manifest.assets.len());
    info!("Style: {:?}", style);

    let engine = AssemblyEngine::new(config)?;
    let path = engine.assemble(manifest.assets, &style, audio).await?;
    Ok(path)
}
