pub mod persist;
pub mod settings;
mod types;

pub use settings::{FileSettings, SettingsSource, StaticSettings};
pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use wallshift_common::ImageSource;

/// Default config file locations, searched in order.
const DEFAULT_PATHS: &[&str] = &[
    "./wallshift.toml",
    "./config.toml",
    "~/.config/wallshift/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// First existing file among the default locations.
pub fn find_config_path() -> Option<PathBuf> {
    DEFAULT_PATHS.iter().find_map(|path_str| {
        let path = PathBuf::from(shellexpand::tilde(path_str).as_ref());
        path.exists().then_some(path)
    })
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match find_config_path() {
        Some(path) => load_config(&path),
        None => Ok(Config::default()),
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config
        .device
        .descriptor()
        .context("Invalid [device] section")?;

    if config.search.per_page == 0 {
        anyhow::bail!("search.per_page cannot be 0");
    }

    if config.search.max_concurrency == 0 {
        anyhow::bail!("search.max_concurrency cannot be 0");
    }

    if config.search.requests_per_second == 0 {
        anyhow::bail!("search.requests_per_second cannot be 0");
    }

    let mut usable = 0;
    for source in ImageSource::all() {
        let provider = config.providers.get(*source);
        if !provider.enabled {
            continue;
        }
        if provider.api_key.is_empty() && requires_api_key(*source) {
            tracing::warn!("Provider '{}' is enabled but has no API key, it will be skipped", source);
            continue;
        }
        usable += 1;
    }
    if usable == 0 {
        anyhow::bail!("No usable image provider: enable one and set its api_key");
    }

    if config.categories.iter().any(|c| c.trim().is_empty()) {
        anyhow::bail!("categories cannot contain empty entries");
    }

    Ok(())
}

/// Whether a provider refuses anonymous searches.
pub fn requires_api_key(source: ImageSource) -> bool {
    !matches!(source, ImageSource::Wallhaven)
}
