//! Live emoji detection: webcam emotion overlay.

use anyhow::Result;
use clap::Parser;
use live_emoji_detection::{
    app::{LiveEmojiApp, Termination},
    capture::VideoSource,
    config::{Config, EXAMPLE_CONFIG},
    Error,
};
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use (overrides the config file)
    #[arg(long)]
    cam: Option<i32>,

    /// Video file to process instead of a camera
    #[arg(short, long, conflicts_with = "cam")]
    video: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Live Emoji Detection");

    let config = match &args.config {
        Some(config_path) => {
            info!("Loading configuration from: {}", config_path);
            match Config::from_file(config_path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!("Failed to load config file: {}. Using defaults.", e);
                    Config::default()
                }
            }
        }
        None => Config::default(),
    };

    let source = match args.video {
        Some(path) => VideoSource::File(path),
        None => VideoSource::Camera(args.cam.unwrap_or(config.capture.camera_index)),
    };

    let mut app = match LiveEmojiApp::from_config(&config, &source) {
        Ok(app) => app,
        Err(e @ Error::DeviceOpen(_)) => {
            error!("{}", e);
            eprintln!("Error: Could not open video stream.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let summary = app.run()?;
    if summary.termination == Termination::CaptureFailed {
        eprintln!("Error: Failed to capture image.");
    }
    info!("Processed {} frames", summary.frames_rendered);

    Ok(())
}
