use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Location of the library store that indexes known projects.
    /// Unset means `~/.cinescribe/library.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<PathBuf>,

    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Neither side of a generated thumbnail exceeds this many pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_max_dimension() -> u32 {
    512
}

fn default_jpeg_quality() -> u8 {
    85
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Extensions picked up when importing a whole directory.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_path: None,
            thumbnails: ThumbnailConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults out on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// The configured library store, or the per-user default.
    ///
    /// Without a configured path this fails when there is no home directory.
    pub fn library_store_path(&self) -> Result<PathBuf> {
        match &self.library_path {
            Some(path) => Ok(path.clone()),
            None => paths::resolve_library_store_path()
                .context("No library_path configured and no default location available"),
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cinescribe")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [thumbnails]
            jpeg_quality = 70
            "#,
        )
        .unwrap();

        assert_eq!(config.thumbnails.jpeg_quality, 70);
        assert_eq!(config.thumbnails.max_dimension, 512);
        assert!(config.import.image_extensions.contains(&"png".to_string()));
        assert!(config.library_path.is_none());
    }

    #[test]
    fn test_unset_library_path_is_not_written() {
        let content = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(!content.contains("library_path"));
        assert!(content.contains("[thumbnails]"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.library_path = Some(dir.path().join("lib.sqlite"));
        config.import.image_extensions = vec!["png".to_string()];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.library_path, Some(dir.path().join("lib.sqlite")));
        assert_eq!(loaded.library_store_path().unwrap(), dir.path().join("lib.sqlite"));
        assert_eq!(loaded.import.image_extensions, vec!["png".to_string()]);
    }
}
