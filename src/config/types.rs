// configuration type definitions

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::gallery::batch::DEFAULT_CONCURRENCY;

/// command line interface definition
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "galleryd", version = env!("CARGO_PKG_VERSION"))]
#[command(about = "photo and video gallery media server")]
pub struct Cli {
    /// directory holding one subdirectory per album
    pub image_dir: Option<PathBuf>,

    /// directory for cached thumbnails, must not overlap the image dir
    #[arg(short = 't', long)]
    pub thumb_dir: Option<PathBuf>,

    /// host to listen on
    #[arg(short = 'l', long)]
    pub host: Option<String>,

    /// port to listen on
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// max files processed at once per batch request
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// config file to use
    #[arg(short = 'c', long)]
    pub config_file: Option<PathBuf>,

    /// increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

/// complete application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gallery: GalleryConfig,
}

/// server configuration section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// media roots and thumbnail generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryConfig {
    pub image_dir: PathBuf,
    pub thumb_dir: PathBuf,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// extensions routed to the video thumbnail path, matched case-insensitively
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    /// per-file deadline inside batch requests; a timed out file is skipped
    #[serde(default)]
    pub item_timeout_secs: Option<u64>,
    /// regenerate cached thumbnails older than their source
    #[serde(default)]
    pub invalidate_stale: bool,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("."),
            thumb_dir: default_thumb_dir(),
            concurrency: default_concurrency(),
            video_extensions: default_video_extensions(),
            item_timeout_secs: None,
            invalidate_stale: false,
            ffmpeg_path: default_ffmpeg_path(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

// default value functions for serde
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

// outside any image root a relative default could land in
fn default_thumb_dir() -> PathBuf {
    std::env::temp_dir().join("galleryd-thumbnails")
}

fn default_video_extensions() -> Vec<String> {
    vec!["mov".to_string()]
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_jpeg_quality() -> u8 {
    85
}
