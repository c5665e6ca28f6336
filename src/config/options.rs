//! Engine option catalog
//!
//! The documented Stockfish options as static data: key, declared kind and
//! default. Sessions start from [`OptionMap::defaults`] and merge user
//! overrides on top.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ConfigError;

/// Typed value of a UCI option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Button-style option: applied with no value field
    Trigger,
}

impl OptionValue {
    /// Whether `setoption name <key> value <value>` should be sent at all
    ///
    /// Triggers and empty strings are never sent as valued options.
    pub fn is_sendable(&self) -> bool {
        match self {
            OptionValue::Trigger => false,
            OptionValue::Str(s) => !s.is_empty(),
            OptionValue::Bool(_) | OptionValue::Int(_) => true,
        }
    }

    /// Kind of this value
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Bool(_) => OptionKind::Check,
            OptionValue::Int(_) => OptionKind::Spin,
            OptionValue::Str(_) => OptionKind::String,
            OptionValue::Trigger => OptionKind::Button,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Str(s) => f.write_str(s),
            OptionValue::Trigger => Ok(()),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// UCI option types, as named by the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Check,
    Spin,
    /// Spin-like option restricted to listed strings
    Combo,
    String,
    Button,
}

impl OptionKind {
    /// Whether `value` is acceptable for an option of this kind
    ///
    /// Values that are never sent (triggers and empty strings) are accepted
    /// for every kind; they mean "skip this option".
    pub fn accepts(self, value: &OptionValue) -> bool {
        !value.is_sendable()
            || matches!(
                (self, value),
                (OptionKind::Check, OptionValue::Bool(_))
                    | (OptionKind::Spin, OptionValue::Int(_))
                    | (OptionKind::Combo, OptionValue::Str(_))
                    | (OptionKind::String, OptionValue::Str(_))
            )
    }
}

/// One entry of the static catalog
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: &'static str,
    pub kind: OptionKind,
    pub default: DefaultValue,
}

/// `const`-friendly mirror of [`OptionValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Str(&'static str),
    Trigger,
}

impl From<DefaultValue> for OptionValue {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Bool(b) => OptionValue::Bool(b),
            DefaultValue::Int(n) => OptionValue::Int(n),
            DefaultValue::Str(s) => OptionValue::Str(s.to_string()),
            DefaultValue::Trigger => OptionValue::Trigger,
        }
    }
}

const fn spec(key: &'static str, kind: OptionKind, default: DefaultValue) -> OptionSpec {
    OptionSpec { key, kind, default }
}

/// Documented Stockfish options and their defaults, in the order they are
/// applied during initialization
pub const OPTION_CATALOG: &[OptionSpec] = &[
    spec("Threads", OptionKind::Spin, DefaultValue::Int(1)),
    spec("Hash", OptionKind::Spin, DefaultValue::Int(16)),
    spec("Ponder", OptionKind::Check, DefaultValue::Bool(false)),
    spec("MultiPV", OptionKind::Spin, DefaultValue::Int(1)),
    spec("Use NNUE", OptionKind::Check, DefaultValue::Bool(true)),
    spec("EvalFile", OptionKind::String, DefaultValue::Str("")),
    spec("UCI_AnalyseMode", OptionKind::Check, DefaultValue::Bool(false)),
    spec("UCI_Chess960", OptionKind::Check, DefaultValue::Bool(false)),
    spec("UCI_ShowWDL", OptionKind::Check, DefaultValue::Bool(false)),
    spec("UCI_LimitStrength", OptionKind::Check, DefaultValue::Bool(false)),
    spec("UCI_Elo", OptionKind::Spin, DefaultValue::Int(1350)),
    spec("Skill Level", OptionKind::Spin, DefaultValue::Int(20)),
    spec("SyzygyPath", OptionKind::String, DefaultValue::Str("")),
    spec("SyzygyProbeDepth", OptionKind::Spin, DefaultValue::Int(1)),
    spec("Syzygy50MoveRule", OptionKind::Check, DefaultValue::Bool(true)),
    spec("SyzygyProbeLimit", OptionKind::Spin, DefaultValue::Int(7)),
    spec("Contempt", OptionKind::Spin, DefaultValue::Int(24)),
    spec("Analysis Contempt", OptionKind::Combo, DefaultValue::Str("Both")),
    spec("Move Overhead", OptionKind::Spin, DefaultValue::Int(10)),
    spec("Slow Mover", OptionKind::Spin, DefaultValue::Int(100)),
    spec("nodestime", OptionKind::Spin, DefaultValue::Int(0)),
    spec("Clear Hash", OptionKind::Button, DefaultValue::Trigger),
    spec("Debug Log File", OptionKind::String, DefaultValue::Str("")),
];

/// Look up a catalog entry by key
pub fn find_option(key: &str) -> Option<&'static OptionSpec> {
    OPTION_CATALOG.iter().find(|spec| spec.key == key)
}

/// Ordered option key → value mapping
///
/// Keys keep their first-insertion order; inserting an existing key replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: Vec<(String, OptionValue)>,
}

impl OptionMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog defaults
    pub fn defaults() -> Self {
        OPTION_CATALOG
            .iter()
            .map(|spec| (spec.key.to_string(), OptionValue::from(spec.default)))
            .collect()
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value for `key`, if present
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// `self` with every entry of `overrides` applied on top
    pub fn merged<I, K>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, OptionValue)>,
        K: Into<String>,
    {
        for (key, value) in overrides {
            self.insert(key, value);
        }
        self
    }

    /// Entries that would actually be sent to the engine
    pub fn sendable(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.iter().filter(|(_, value)| value.is_sendable())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that catalog options carry values of their declared kind
    ///
    /// Keys outside the catalog are allowed; engines differ in what they
    /// support.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in self.iter() {
            if let Some(spec) = find_option(key) {
                if !spec.kind.accepts(value) {
                    return Err(ConfigError::OptionTypeMismatch {
                        key: key.to_string(),
                        expected: spec.kind,
                        found: value.kind(),
                    });
                }
            } else {
                debug!("Option '{}' is not in the catalog, passing through", key);
            }
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for OptionMap {
    fn from_iter<T: IntoIterator<Item = (K, OptionValue)>>(iter: T) -> Self {
        OptionMap::new().merged(iter)
    }
}

impl From<BTreeMap<String, OptionValue>> for OptionMap {
    fn from(map: BTreeMap<String, OptionValue>) -> Self {
        map.into_iter().collect()
    }
}
