use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wallshift_common::{DeviceDescriptor, ImageSource, WallpaperTarget};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Categories searched on every run (plain query terms)
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Screen(s) the external applier should set
    #[serde(default)]
    pub target: WallpaperTarget,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub device: DeviceConfig,
}

fn default_categories() -> Vec<String> {
    ["nature", "minimal", "abstract"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            target: WallpaperTarget::default(),
            providers: ProvidersConfig::default(),
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
            history: HistoryConfig::default(),
            device: DeviceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub unsplash: ProviderConfig,

    #[serde(default)]
    pub pexels: ProviderConfig,

    #[serde(default)]
    pub pixabay: ProviderConfig,

    #[serde(default)]
    pub wallhaven: ProviderConfig,
}

impl ProvidersConfig {
    /// Settings for one provider.
    pub fn get(&self, source: ImageSource) -> &ProviderConfig {
        match source {
            ImageSource::Unsplash => &self.unsplash,
            ImageSource::Pexels => &self.pexels,
            ImageSource::Pixabay => &self.pixabay,
            ImageSource::Wallhaven => &self.wallhaven,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API key / client id. Wallhaven works without one.
    #[serde(default)]
    pub api_key: String,

    /// Override of the public API root (used for tests and proxies)
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            base_url: None,
        }
    }
}

impl ProviderConfig {
    /// Configured base URL or the provider's public API root, without a
    /// trailing slash.
    pub fn base_url_for(&self, source: ImageSource) -> String {
        let url = self
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(source).to_string());
        url.trim_end_matches('/').to_string()
    }
}

/// Public API root of each provider.
pub fn default_base_url(source: ImageSource) -> &'static str {
    match source {
        ImageSource::Unsplash => "https://api.unsplash.com",
        ImageSource::Pexels => "https://api.pexels.com",
        ImageSource::Pixabay => "https://pixabay.com",
        ImageSource::Wallhaven => "https://wallhaven.cc",
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Results requested per provider for a single query (default: 30)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Per-provider request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum provider searches in flight at once (default: 4)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Token-bucket rate per provider (default: 4 requests / second)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Minimum resolution passed to providers that filter server-side
    #[serde(default = "default_min_resolution")]
    pub min_resolution: String,

    /// Ranked candidates tried before a run gives up on downloading (default: 3)
    #[serde(default = "default_max_download_attempts")]
    pub max_download_attempts: usize,
}

fn default_per_page() -> u32 {
    30
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    4
}

fn default_requests_per_second() -> u32 {
    4
}

fn default_min_resolution() -> String {
    "1080x1920".to_string()
}

fn default_max_download_attempts() -> usize {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            request_timeout_secs: default_request_timeout(),
            max_concurrency: default_max_concurrency(),
            requests_per_second: default_requests_per_second(),
            min_resolution: default_min_resolution(),
            max_download_attempts: default_max_download_attempts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Cache directory (default: platform cache dir + `wallshift/wallpapers`)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Byte budget in megabytes (default: 100)
    #[serde(default = "default_cache_size_mb")]
    pub max_size_mb: u64,
}

pub(crate) fn default_cache_size_mb() -> u64 {
    100
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_size_mb: default_cache_size_mb(),
        }
    }
}

impl CacheConfig {
    /// Effective cache directory, with `~` expanded.
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => expand(dir),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("wallshift")
                .join("wallpapers"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// SQLite file (default: platform data dir + `wallshift/wallshift.db`)
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Applied entries retained after pruning (default: 500)
    #[serde(default = "default_history_keep")]
    pub keep: usize,
}

fn default_history_keep() -> usize {
    500
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            keep: default_history_keep(),
        }
    }
}

impl HistoryConfig {
    /// Effective database path, with `~` expanded.
    pub fn resolved_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => expand(path),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("wallshift")
                .join("wallshift.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default = "default_device_width")]
    pub width: u32,

    #[serde(default = "default_device_height")]
    pub height: u32,
}

fn default_device_width() -> u32 {
    1080
}

fn default_device_height() -> u32 {
    1920
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            width: default_device_width(),
            height: default_device_height(),
        }
    }
}

impl DeviceConfig {
    pub fn descriptor(&self) -> wallshift_common::Result<DeviceDescriptor> {
        DeviceDescriptor::new(self.width, self.height)
    }
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}
