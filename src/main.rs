// galleryd: photo and video gallery media server
// main entry point with minimal bootstrap logic

use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter, Level};
use tracing_subscriber::EnvFilter;

use galleryd::config::{load_configuration, AppConfig, Cli};
use galleryd::server::start_server;
use galleryd::utils::paths::resolve_root;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    // file, GALLERYD_* environment and flags, already validated
    let config = load_configuration(&cli)?;
    log_roots(&config)?;

    start_server(config).await
}

/// initialize structured logging with tracing. `RUST_LOG`, when set, takes
/// over from the -v / -q flags
fn init_logging(verbose_count: u8, quiet_count: u8) -> Result<()> {
    // info by default, each -v / -q moves one level
    let adjustment = verbose_count as i8 - quiet_count as i8;
    let level = match (2i8 + adjustment).clamp(0, 4) {
        i8::MIN..=0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        4.. => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

/// relative roots are resolved against the working directory once, log what
/// they actually point at
fn log_roots(config: &AppConfig) -> Result<()> {
    let gallery = &config.gallery;
    info!("albums: {}", resolve_root(&gallery.image_dir)?.display());
    info!("thumbnail cache: {}", resolve_root(&gallery.thumb_dir)?.display());
    info!(
        "video extensions: {}, ffmpeg: {}",
        gallery.video_extensions.join(", "),
        gallery.ffmpeg_path.display()
    );
    if gallery.invalidate_stale {
        info!("stale thumbnails are regenerated");
    }
    Ok(())
}
