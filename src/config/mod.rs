//! Configuration management for ucidriver
//!
//! Which engine to launch, how long the quiescence windows are, how the
//! handshake decides it is complete, and which option overrides to apply.

pub mod loader;
pub mod options;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub use options::{OptionKind, OptionMap, OptionValue, OPTION_CATALOG};

/// Conventional engine binary looked up on the search path
pub const DEFAULT_ENGINE_PATH: &str = "stockfish";

/// Quiescence window for ordinary commands
pub const DEFAULT_WINDOW_MS: u64 = 10;

/// Quiescence window for `go`
pub const DEFAULT_SEARCH_WINDOW_MS: u64 = 100;

/// Main configuration structure for an engine session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How the handshake and readiness probe decide they are complete
    pub handshake: ReadStrategy,

    /// Executable and arguments
    pub engine: EngineCommand,

    /// Quiescence windows
    pub timing: TimingConfig,

    /// Option overrides merged over the catalog defaults
    pub options: BTreeMap<String, OptionValue>,
}

impl EngineConfig {
    /// Config for the engine at `path`, everything else default
    pub fn for_engine(path: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineCommand {
                path: path.into(),
                args: Vec::new(),
            },
            ..Self::default()
        }
    }

    /// Builder-style option override
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Builder-style handshake strategy
    pub fn with_handshake(mut self, strategy: ReadStrategy) -> Self {
        self.handshake = strategy;
        self
    }

    /// Catalog defaults with this config's overrides applied
    pub fn option_map(&self) -> OptionMap {
        OptionMap::defaults().merged(self.options.clone())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyEnginePath);
        }
        self.timing.validate()?;
        self.option_map().validate()
    }
}

/// Engine executable and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineCommand {
    pub path: PathBuf,
    pub args: Vec<String>,
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ENGINE_PATH),
            args: Vec::new(),
        }
    }
}

/// Quiescence windows, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Window for every command without an explicit end condition
    pub command_window_ms: u64,

    /// Default window for `go`
    pub search_window_ms: u64,
}

impl TimingConfig {
    pub fn command_window(&self) -> Duration {
        Duration::from_millis(self.command_window_ms)
    }

    pub fn search_window(&self) -> Duration {
        Duration::from_millis(self.search_window_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // A zero window would poll in a tight loop
        if self.command_window_ms == 0 {
            return Err(ConfigError::InvalidWindow {
                name: "command_window_ms",
                value: self.command_window_ms,
            });
        }
        if self.search_window_ms == 0 {
            return Err(ConfigError::InvalidWindow {
                name: "search_window_ms",
                value: self.search_window_ms,
            });
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            command_window_ms: DEFAULT_WINDOW_MS,
            search_window_ms: DEFAULT_SEARCH_WINDOW_MS,
        }
    }
}

/// How initialization waits for `uci` and `isready` to be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Wait for the terminal tokens `uciok` / `readyok`. Blocks until they
    /// arrive or the engine exits.
    #[default]
    TerminalToken,
    /// Treat one silent window as the end of the answer, retrying
    /// `isready` until an exact `readyok` comes back
    Quiescence,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name}: {value} (must be at least 1ms)")]
    InvalidWindow { name: &'static str, value: u64 },

    #[error("Engine path cannot be empty")]
    EmptyEnginePath,

    #[error("Option '{key}' expects a {expected:?} value, got {found:?}")]
    OptionTypeMismatch {
        key: String,
        expected: OptionKind,
        found: OptionKind,
    },
}
