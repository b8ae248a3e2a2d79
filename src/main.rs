use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod cli;
mod config;
mod media;

use config::{Config, LogFormat, LoggingConfig};
use media::{Extractor, Orchestrator, YtDlpExtractor};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Default directory downloads go into
    #[arg(short, long)]
    download_root: Option<PathBuf>,
}

fn get_config_path(args: &Args) -> Option<String> {
    find_config_path(
        args.config.as_deref(),
        std::env::var("CONFIG_FILE").ok(),
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
    )
}

/// Config lookup: flag, then `CONFIG_FILE`, then the XDG and home config dirs.
fn find_config_path(
    flag: Option<&str>,
    config_file_env: Option<String>,
    xdg_config_home: Option<String>,
    home: Option<PathBuf>,
) -> Option<String> {
    if let Some(path) = flag {
        return Some(path.to_string());
    }

    if let Some(path) = config_file_env {
        return Some(path);
    }

    if let Some(xdg_config_home) = xdg_config_home {
        let config_path = format!("{}/grabtube/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = home {
        let config_path = format!("{}/.config/grabtube/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn load_config(args: &Args, config_path: Option<&str>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };
    if let Some(root) = &args.download_root {
        config.downloads.root = root.clone();
    }
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) {
    let default_level = logging.level.parse().unwrap_or(LevelFilter::WARN);
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // stdout belongs to the prompts
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = get_config_path(&args);
    let config = load_config(&args, config_path.as_deref())?;

    init_logging(&config.logging);

    info!("Starting grabtube...");
    match &config_path {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    let extractor = YtDlpExtractor::new(config.ytdlp.clone());
    if !extractor.test_availability().await {
        warn!("{} is not available, downloads will fail", extractor.name());
        println!(
            "Warning: '{}' was not found. Install yt-dlp or set ytdlp.binary in the config file.",
            config.ytdlp.binary
        );
    }

    let orchestrator = Orchestrator::new(Box::new(extractor), config.downloads.clone());
    let console = cli::Console::new(
        tokio::io::BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
    );

    let mut session = cli::Session::new(console, &orchestrator, &config.quality);
    session.run().await
}
