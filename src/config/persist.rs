//! Configuration persistence using toml_edit to preserve formatting and comments.

use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::{value, DocumentMut, Item, Table};

/// Save the entire config to a TOML file (full replacement).
pub fn save_config(path: &Path, config: &super::Config) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Update just `cache.max_size_mb`, keeping the rest of the file untouched.
///
/// Creates the file (and the `[cache]` table) if it doesn't exist yet.
pub fn set_cache_size_mb(path: &Path, max_size_mb: u64) -> Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if !doc.contains_table("cache") {
        doc["cache"] = Item::Table(Table::new());
    }
    let size = i64::try_from(max_size_mb).context("Cache size is too large")?;
    doc["cache"]["max_size_mb"] = value(size);

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cache_size_preserves_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallshift.toml");
        std::fs::write(
            &path,
            "# my wallpapers\ncategories = [\"space\"]\n\n[cache]\n# budget\nmax_size_mb = 100\n",
        )
        .unwrap();

        set_cache_size_mb(&path, 300).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# my wallpapers"));
        assert!(written.contains("# budget"));

        let config: super::super::Config = toml::from_str(&written).unwrap();
        assert_eq!(config.cache.max_size_mb, 300);
        assert_eq!(config.categories, vec!["space"]);
    }

    #[test]
    fn test_set_cache_size_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.toml");

        set_cache_size_mb(&path, 42).unwrap();

        let config: super::super::Config =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.cache.max_size_mb, 42);
    }

    #[test]
    fn test_save_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wallshift.toml");
        let mut config = super::super::Config::default();
        config.categories = vec!["aurora".into()];

        save_config(&path, &config).unwrap();

        let loaded: super::super::Config =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.categories, vec!["aurora"]);
    }
}
