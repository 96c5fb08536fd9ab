//! Core type definitions for wallpaper candidates, devices, and history.
//!
//! All enums are serialized in lowercase so they round-trip cleanly through
//! the history database and the TOML configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// External image provider a candidate originated from.
///
/// Declaration order is provider priority: results from earlier variants are
/// listed first when several providers answer the same query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// Unsplash photo search.
    Unsplash,
    /// Pexels photo search.
    Pexels,
    /// Pixabay image search.
    Pixabay,
    /// Wallhaven wallpaper search.
    Wallhaven,
}

impl ImageSource {
    /// All sources in priority order.
    pub fn all() -> &'static [ImageSource] {
        &[
            ImageSource::Unsplash,
            ImageSource::Pexels,
            ImageSource::Pixabay,
            ImageSource::Wallhaven,
        ]
    }

    /// Lowercase identifier, also used as the candidate id prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsplash => "unsplash",
            Self::Pexels => "pexels",
            Self::Pixabay => "pixabay",
            Self::Wallhaven => "wallhaven",
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unsplash" => Ok(Self::Unsplash),
            "pexels" => Ok(Self::Pexels),
            "pixabay" => Ok(Self::Pixabay),
            "wallhaven" => Ok(Self::Wallhaven),
            other => Err(Error::UnknownSource(other.to_string())),
        }
    }
}

/// A provider-agnostic wallpaper image descriptor.
///
/// Built once from a provider hit and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallpaperCandidate {
    /// Globally unique id, `<source>_<provider native id>`.
    pub id: String,
    /// Provider this candidate came from.
    pub source: ImageSource,
    /// The query (category) that produced it.
    pub category: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Full-size image URL used for caching.
    pub download_url: String,
    /// Small preview URL.
    pub thumbnail_url: String,
    /// Provider popularity signal; 0 when the provider doesn't report one.
    pub likes: u32,
    /// Credited author.
    pub photographer: String,
    /// Page to link back to for attribution.
    pub attribution_url: String,
}

impl WallpaperCandidate {
    /// Build the canonical candidate id for a provider-native id.
    ///
    /// # Examples
    ///
    /// ```
    /// use wallshift_common::{ImageSource, WallpaperCandidate};
    ///
    /// assert_eq!(WallpaperCandidate::make_id(ImageSource::Pexels, "1181"), "pexels_1181");
    /// ```
    pub fn make_id(source: ImageSource, native_id: &str) -> String {
        format!("{}_{}", source.as_str(), native_id)
    }

    /// Whether both dimensions are positive.
    pub fn is_scoreable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Total pixel count.
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Screen dimensions of the device a wallpaper is chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Screen width in pixels.
    pub screen_width_px: u32,
    /// Screen height in pixels.
    pub screen_height_px: u32,
}

impl DeviceDescriptor {
    /// Create a descriptor, rejecting zero dimensions.
    pub fn new(screen_width_px: u32, screen_height_px: u32) -> crate::Result<Self> {
        if screen_width_px == 0 || screen_height_px == 0 {
            return Err(Error::InvalidDevice {
                width: screen_width_px,
                height: screen_height_px,
            });
        }
        Ok(Self {
            screen_width_px,
            screen_height_px,
        })
    }

    /// Portrait aspect ratio, height / width.
    pub fn aspect(&self) -> f64 {
        f64::from(self.screen_height_px) / f64::from(self.screen_width_px)
    }

    /// Total pixel count.
    pub fn pixels(&self) -> u64 {
        u64::from(self.screen_width_px) * u64::from(self.screen_height_px)
    }
}

/// Projection of one history row: when (if ever) an id was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    /// Candidate id.
    pub id: String,
    /// Epoch milliseconds of the last apply; `None` if never applied.
    pub applied_at_epoch_millis: Option<i64>,
}

/// Which screen(s) the external applier should set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallpaperTarget {
    /// Home screen only.
    Home,
    /// Lock screen only.
    Lock,
    /// Both screens.
    #[default]
    Both,
}

impl WallpaperTarget {
    /// Lenient parse; anything unrecognised maps to [`WallpaperTarget::Both`].
    pub fn from_str_lossy(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "home" => Self::Home,
            "lock" => Self::Lock,
            _ => Self::Both,
        }
    }
}

impl fmt::Display for WallpaperTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Lock => write!(f, "lock"),
            Self::Both => write!(f, "both"),
        }
    }
}
