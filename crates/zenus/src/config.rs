//! # Configuration
//!
//! Zenus configuration is loaded by [`confique`] from layered sources.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `ZENUS_DATA_DIR`, `ZENUS_MACHINE_ID`, `ZENUS_LOG_LEVEL`.
//! 2. **Explicit file**: the path given to [`ZenusConfig::load`] (the CLI's `--config`).
//! 3. **User config**: `zenus.toml` in the OS config directory (via `directories`).
//! 4. **Compiled defaults**.
//!
//! Missing files are skipped.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | `<os data dir>/zenus` | Where block files live |
//! | `machine_id` | `1` | Machine component of generated ids (0..=1023) |
//! | `log_level` | `warn` | Default log filter when `ZENUS_LOG` is unset |

use confique::Config;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const CONFIG_FILE: &str = "zenus.toml";
const APP_DIR: &str = "zenus";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ZenusConfig {
    /// Directory holding block files. Archived blocks go to `archive/` inside it.
    #[config(env = "ZENUS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Machine id baked into every generated block id.
    #[config(env = "ZENUS_MACHINE_ID", default = 1)]
    pub machine_id: u16,

    /// Log filter directive used when `ZENUS_LOG` is not set.
    #[config(env = "ZENUS_LOG_LEVEL", default = "warn")]
    pub log_level: String,
}

impl Default for ZenusConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            machine_id: 1,
            log_level: "warn".to_string(),
        }
    }
}

impl ZenusConfig {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        if let Some(dirs) = BaseDirs::new() {
            builder = builder.file(dirs.config_dir().join(APP_DIR).join(CONFIG_FILE));
        }
        Ok(builder.load()?)
    }

    /// The configured data directory, or the OS data directory for zenus.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        BaseDirs::new()
            .map(|dirs| dirs.data_dir().join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".zenus"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ZenusConfig::default();
        assert_eq!(config.machine_id, 1);
        assert_eq!(config.log_level, "warn");
        assert!(config.data_dir().ends_with("zenus") || config.data_dir().ends_with(".zenus"));
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let config = ZenusConfig {
            data_dir: Some(PathBuf::from("/tmp/blocks")),
            ..Default::default()
        };
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/blocks"));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "machine_id = 7\ndata_dir = \"/srv/notes\"\n").unwrap();

        let config = ZenusConfig::builder().file(&path).load().unwrap();
        assert_eq!(config.machine_id, 7);
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/notes")));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ZenusConfig::builder()
            .file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(config, ZenusConfig::default());
    }

    #[test]
    fn test_serializes_to_toml() {
        let config = ZenusConfig {
            machine_id: 3,
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("machine_id = 3"));
        let back: ZenusConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
