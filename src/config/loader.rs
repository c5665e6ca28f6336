//! Configuration File Loading
//!
//! Finds and loads engine configuration from the usual locations, in TOML or
//! JSON, falling back to defaults when nothing is found.

use super::{EngineConfig, OptionValue};
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files (without extension)
    search_paths: Vec<PathBuf>,
    /// Path of the file the configuration came from, if any
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    const ALL: [ConfigFormat; 2] = [ConfigFormat::Toml, ConfigFormat::Json];

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }

    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

impl ConfigLoader {
    /// Loader over the default search paths
    pub fn new() -> Self {
        Self::with_search_paths(Self::default_search_paths())
    }

    /// Loader over explicit search paths
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            current_path: None,
        }
    }

    /// Load configuration from the default locations, or defaults if none
    /// exists
    pub fn load() -> Result<EngineConfig> {
        Self::new().find_or_default()
    }

    /// Path of the file loaded by the last [`find_or_default`](Self::find_or_default)
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Search for a config file; use defaults if there is none
    pub fn find_or_default(&mut self) -> Result<EngineConfig> {
        for base in &self.search_paths {
            for format in ConfigFormat::ALL {
                let path = base.with_extension(format.extension());
                if !path.exists() {
                    continue;
                }

                match Self::load_file(&path, format) {
                    Ok(config) => {
                        info!("Loaded configuration from {}", path.display());
                        self.current_path = Some(path);
                        return Ok(config);
                    }
                    Err(e) => {
                        // Keep searching
                        warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(EngineConfig::default())
    }

    /// Load and validate a specific configuration file
    pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
        Self::load_file(path, ConfigFormat::from_path(path))
    }

    /// Save configuration to a specific path, format chosen by extension
    pub fn save_to_path(config: &EngineConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
            ConfigFormat::Toml => {
                toml::to_string_pretty(&Self::without_triggers(config)).map_err(|e| e.to_string())
            }
        }
        .map_err(|reason| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason,
        })?;

        fs::write(path, content)?;
        Ok(())
    }

    /// TOML has no null, so trigger overrides are left out of TOML files.
    /// They are never sent during setup either way.
    fn without_triggers(config: &EngineConfig) -> EngineConfig {
        let mut config = config.clone();
        config.options.retain(|key, value| {
            if *value == OptionValue::Trigger {
                debug!("Option '{}' is a trigger, not written to TOML", key);
                return false;
            }
            true
        });
        config
    }

    fn load_file(path: &Path, format: ConfigFormat) -> Result<EngineConfig> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: EngineConfig = match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        }
        .map_err(|reason| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ucidriver").join("config"));
        }

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("ucidriver").join("config"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ucidriver"));
        }

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join("ucidriver"));
        }

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
