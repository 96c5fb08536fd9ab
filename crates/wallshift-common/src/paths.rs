//! Cache file naming.
//!
//! Cached wallpapers live in a single flat directory, one file per candidate,
//! named `<candidate id>.jpg`. In-flight downloads use a `.part` suffix and are
//! never treated as cache entries.

use std::path::Path;

/// Extension used for every cached wallpaper file.
pub const CACHE_EXTENSION: &str = "jpg";

/// Suffix of a partially written download.
pub const PARTIAL_SUFFIX: &str = ".part";

/// File name for a cached candidate.
///
/// # Examples
///
/// ```
/// use wallshift_common::paths::cache_file_name;
///
/// assert_eq!(cache_file_name("pexels_42"), "pexels_42.jpg");
/// ```
pub fn cache_file_name(id: &str) -> String {
    format!("{id}.{CACHE_EXTENSION}")
}

/// Returns `true` when `id` can be used verbatim as a file name inside the
/// cache directory.
///
/// Rejects empty ids, path separators, parent-directory references and
/// control characters.
///
/// # Examples
///
/// ```
/// use wallshift_common::paths::is_safe_cache_id;
///
/// assert!(is_safe_cache_id("wallhaven_8x1kxo"));
/// assert!(!is_safe_cache_id("../etc/passwd"));
/// assert!(!is_safe_cache_id(""));
/// ```
pub fn is_safe_cache_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains("..")
        && !id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Check if a path is an in-flight partial download.
pub fn is_partial_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(PARTIAL_SUFFIX))
        .unwrap_or(false)
}
