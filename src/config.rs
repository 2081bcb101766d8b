//! Catalog configuration: where definitions live and how they are named.
//!
//! Stored as JSON; every field is optional in the file and falls back to
//! the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a catalog load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root searched for item definitions
    pub items_dir: PathBuf,
    /// Root searched for preset definitions
    pub presets_dir: PathBuf,
    /// File name suffix of item definitions
    pub item_extension: String,
    /// File name suffix of preset definitions
    pub preset_extension: String,
    /// Preset applied right after loading, if it exists
    pub default_preset: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            items_dir: PathBuf::from("Installers"),
            presets_dir: PathBuf::from("Presets"),
            item_extension: ".info".to_string(),
            preset_extension: ".preset".to_string(),
            default_preset: Some("default".to_string()),
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.items_dir.as_os_str().is_empty() {
            anyhow::bail!("Items directory must be specified");
        }
        if self.presets_dir.as_os_str().is_empty() {
            anyhow::bail!("Presets directory must be specified");
        }

        for (label, ext) in [
            ("Item", &self.item_extension),
            ("Preset", &self.preset_extension),
        ] {
            if ext.len() < 2 || !ext.starts_with('.') {
                anyhow::bail!("{} extension must start with '.' and name a suffix", label);
            }
            if ext.contains(['/', '\\']) {
                anyhow::bail!("{} extension cannot contain path separators", label);
            }
        }

        if self.item_extension == self.preset_extension {
            anyhow::bail!("Item and preset extensions must differ");
        }

        if let Some(preset) = &self.default_preset {
            if preset.trim().is_empty() {
                anyhow::bail!("Default preset id cannot be empty");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = CatalogConfig::default();
        assert_eq!(config.items_dir, PathBuf::from("Installers"));
        assert_eq!(config.presets_dir, PathBuf::from("Presets"));
        assert_eq!(config.item_extension, ".info");
        assert_eq!(config.preset_extension, ".preset");
        assert_eq!(config.default_preset.as_deref(), Some("default"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let config = CatalogConfig {
            items_dir: PathBuf::from("/srv/defs/items"),
            default_preset: None,
            ..Default::default()
        };
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();
        let loaded = CatalogConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{ "item_extension": ".pkg" }"#)
            .unwrap();
        temp_file.flush().unwrap();

        let loaded = CatalogConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.item_extension, ".pkg");
        assert_eq!(loaded.preset_extension, ".preset");
        assert_eq!(loaded.items_dir, PathBuf::from("Installers"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = CatalogConfig::load_from_file(Path::new("/nonexistent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ invalid json }").unwrap();
        temp_file.flush().unwrap();

        assert!(CatalogConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_extensions() {
        let mut config = CatalogConfig::default();
        config.item_extension = "info".to_string();
        assert!(config.validate().is_err());

        config.item_extension = ".".to_string();
        assert!(config.validate().is_err());

        config.item_extension = ".a/b".to_string();
        assert!(config.validate().is_err());

        config.item_extension = ".preset".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_dirs_and_preset() {
        let mut config = CatalogConfig::default();
        config.items_dir = PathBuf::new();
        assert!(config.validate().is_err());

        let mut config = CatalogConfig::default();
        config.default_preset = Some("  ".to_string());
        assert!(config.validate().is_err());
    }
}
