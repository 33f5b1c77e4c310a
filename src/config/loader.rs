//! Configuration Loader
//!
//! Loads router settings from JSON config files and the environment.
//! Files are merged in order (later wins); API keys from the environment are
//! appended after file-configured keys and de-duplicated.

use crate::config::settings::RouterConfig;
use crate::error::{Result, RouterError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file that overrides the search paths.
const CONFIG_PATH_ENV: &str = "KEYFAN_CONFIG_PATH";

/// Single-key environment variable.
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Comma-separated multi-key environment variable.
const API_KEYS_ENV: &str = "GEMINI_API_KEYS";

/// A config file's contents: only the fields the file actually sets.
///
/// Scalars are `Option` so a later file that omits a field leaves the value
/// an earlier file (or the defaults) established untouched.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    api_keys: Vec<String>,
    base_url: Option<String>,
    text_model: Option<String>,
    vision_model: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    config: RouterConfig,
}

impl ConfigLoader {
    /// Load from default locations and the environment.
    ///
    /// Reads `.env` first so key variables defined there are visible.
    pub fn new() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut loader = Self {
            config: RouterConfig::default(),
        };

        loader.load_from_default_paths()?;
        loader.load_keys_from_env();

        Ok(loader)
    }

    /// Load from a specific config file, then the environment.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut loader = Self {
            config: RouterConfig::default(),
        };

        loader.load_from_file(path)?;
        loader.load_keys_from_env();

        Ok(loader)
    }

    /// Load configuration from default paths (first missing files are skipped).
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }

        Ok(())
    }

    /// List of config paths to check, in merge order.
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(custom_path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths.push(PathBuf::from("keyfan.json"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("keyfan").join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".keyfan").join("config.json"));
        }

        paths
    }

    /// Load configuration from a specific file.
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RouterError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: FileConfig = serde_json::from_str(&content).map_err(|e| {
            RouterError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        self.merge_config(config);
        Ok(())
    }

    /// Merge a config file into this one. Keys accumulate; a scalar is
    /// overridden only when the later file actually sets it.
    fn merge_config(&mut self, other: FileConfig) {
        for key in other.api_keys {
            if !self.config.api_keys.contains(&key) {
                self.config.api_keys.push(key);
            }
        }

        if let Some(base_url) = other.base_url {
            self.config.base_url = base_url;
        }
        if let Some(text_model) = other.text_model {
            self.config.text_model = text_model;
        }
        if let Some(vision_model) = other.vision_model {
            self.config.vision_model = vision_model;
        }
        if let Some(secs) = other.request_timeout_secs {
            self.config.request_timeout_secs = secs;
        }
        if let Some(secs) = other.connect_timeout_secs {
            self.config.connect_timeout_secs = secs;
        }
    }

    /// Append keys from the environment: `GEMINI_API_KEY`, comma-separated
    /// `GEMINI_API_KEYS`, and numbered `GEMINI_API_KEY_1..=9`.
    fn load_keys_from_env(&mut self) {
        let mut env_keys: Vec<String> = Vec::new();

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            env_keys.push(key);
        }

        if let Ok(list) = std::env::var(API_KEYS_ENV) {
            env_keys.extend(list.split(',').map(|k| k.trim().to_string()));
        }

        for n in 1..=9 {
            if let Ok(key) = std::env::var(format!("{}_{}", API_KEY_ENV, n)) {
                env_keys.push(key);
            }
        }

        for key in env_keys {
            if !key.trim().is_empty() && !self.config.api_keys.contains(&key) {
                self.config.api_keys.push(key);
            }
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Take ownership of the configuration.
    pub fn into_config(self) -> RouterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_custom_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "api_keys": ["file-key-1", "file-key-2"],
                "text_model": "gemini-2.0-flash"
            }}"#
        )
        .unwrap();

        let loader = ConfigLoader::from_path(file.path()).unwrap();
        let config = loader.config();

        assert!(config.api_keys.contains(&"file-key-1".to_string()));
        assert!(config.api_keys.contains(&"file-key-2".to_string()));
        assert_eq!(config.text_model, "gemini-2.0-flash");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        let err = ConfigLoader::from_path(file.path()).err().unwrap();
        assert!(matches!(err, RouterError::Config(_)));
    }

    #[test]
    fn test_merge_accumulates_keys() {
        let mut loader = ConfigLoader {
            config: RouterConfig {
                api_keys: vec!["a".to_string()],
                ..Default::default()
            },
        };

        loader.merge_config(FileConfig {
            api_keys: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        });

        assert_eq!(loader.config().api_keys, vec!["a", "b"]);
    }

    #[test]
    fn test_later_file_preserves_scalars_it_omits() {
        let mut first = NamedTempFile::new().unwrap();
        writeln!(
            first,
            r#"{{
                "api_keys": ["k1"],
                "base_url": "https://proxy.internal/v1beta",
                "text_model": "gemini-2.0-flash"
            }}"#
        )
        .unwrap();

        // Keys-only overlay, as in a ~/.keyfan/config.json holding secrets.
        let mut second = NamedTempFile::new().unwrap();
        writeln!(second, r#"{{"api_keys": ["k2"]}}"#).unwrap();

        let mut loader = ConfigLoader {
            config: RouterConfig::default(),
        };
        loader.load_from_file(first.path()).unwrap();
        loader.load_from_file(second.path()).unwrap();

        let config = loader.config();
        assert_eq!(config.api_keys, vec!["k1", "k2"]);
        assert_eq!(config.base_url, "https://proxy.internal/v1beta");
        assert_eq!(config.text_model, "gemini-2.0-flash");
    }

    #[test]
    fn test_later_file_overrides_scalars_it_sets() {
        let mut loader = ConfigLoader {
            config: RouterConfig::default(),
        };

        loader.merge_config(FileConfig {
            text_model: Some("gemini-2.0-flash".to_string()),
            ..Default::default()
        });
        loader.merge_config(FileConfig {
            text_model: Some("gemini-2.5-pro".to_string()),
            request_timeout_secs: Some(60),
            ..Default::default()
        });

        assert_eq!(loader.config().text_model, "gemini-2.5-pro");
        assert_eq!(loader.config().request_timeout_secs, 60);
    }
}
