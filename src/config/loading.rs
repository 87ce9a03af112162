// configuration loading and merging logic

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::{debug, info};

use super::types::{AppConfig, Cli};
use crate::utils::paths::resolve_root;

/// `GALLERYD_GALLERY__CONCURRENCY=4` sets `gallery.concurrency`
pub const ENV_PREFIX: &str = "GALLERYD_";

/// load and merge configuration from multiple sources
/// precedence: defaults < config file < environment < cli arguments
pub fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    debug!("loading configuration with cli args: {:?}", cli);

    // start with default configuration
    let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

    // merge config file if provided
    if let Some(config_path) = &cli.config_file {
        if config_path.exists() {
            info!("loading config file: {}", config_path.display());
            figment = figment.merge(Toml::file(config_path));
        } else {
            anyhow::bail!("config file not found: {}", config_path.display());
        }
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    // merge cli overrides - highest precedence
    figment = apply_cli_overrides(figment, cli);

    // extract final configuration
    let config: AppConfig = figment.extract().context("failed to parse configuration")?;

    // validate configuration
    validate_configuration(&config)?;

    debug!("final configuration: {:?}", config);
    Ok(config)
}

/// only flags that were actually given override the file
fn apply_cli_overrides(mut figment: Figment, cli: &Cli) -> Figment {
    if let Some(image_dir) = &cli.image_dir {
        figment = figment.merge(Serialized::default("gallery.image_dir", image_dir));
    }
    if let Some(thumb_dir) = &cli.thumb_dir {
        figment = figment.merge(Serialized::default("gallery.thumb_dir", thumb_dir));
    }
    if let Some(concurrency) = cli.concurrency {
        figment = figment.merge(Serialized::default("gallery.concurrency", concurrency));
    }
    if let Some(host) = &cli.host {
        figment = figment.merge(Serialized::default("server.host", host));
    }
    if let Some(port) = cli.port {
        figment = figment.merge(Serialized::default("server.port", port));
    }
    figment
}

/// validate configuration for consistency
fn validate_configuration(config: &AppConfig) -> Result<()> {
    let image_dir = &config.gallery.image_dir;

    if !image_dir.exists() {
        anyhow::bail!("image directory does not exist: {}", image_dir.display());
    }

    if !image_dir.is_dir() {
        anyhow::bail!("image directory is not a directory: {}", image_dir.display());
    }

    let thumb_dir = &config.gallery.thumb_dir;
    if thumb_dir.exists() && !thumb_dir.is_dir() {
        anyhow::bail!("thumbnail path is not a directory: {}", thumb_dir.display());
    }

    // the cache must never be walked as an album, nor the albums as cache
    let image_root = resolve_root(image_dir)?;
    let thumb_root = resolve_root(thumb_dir)?;
    if thumb_root.starts_with(&image_root) || image_root.starts_with(&thumb_root) {
        anyhow::bail!(
            "thumbnail dir {} and image dir {} must not contain each other",
            thumb_root.display(),
            image_root.display()
        );
    }

    if config.gallery.concurrency == 0 {
        anyhow::bail!("concurrency must be at least 1");
    }

    if config.gallery.item_timeout_secs == Some(0) {
        anyhow::bail!("item timeout must be at least 1 second");
    }

    if config.gallery.video_extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
        anyhow::bail!("video extensions cannot be empty");
    }

    // validate port range
    if config.server.port == 0 {
        anyhow::bail!("port cannot be 0");
    }

    Ok(())
}

/// load configuration from a file without cli overrides or validation
pub fn load_config_from_file(config_path: &Path) -> Result<AppConfig> {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(config_path));

    let config: AppConfig = figment
        .extract()
        .context("failed to parse configuration file")?;

    Ok(config)
}
