//! `vigil.toml` discovery and parsing.
//!
//! A configuration file is looked up from a start directory upwards. Keys the
//! loader does not understand are kept as [`ConfigWarning`]s instead of failing the
//! load, so an older binary can still read a newer file.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::diagnostic::Severity;
use crate::rules::RuleRegistry;

pub const CONFIG_FILENAME: &str = "vigil.toml";

pub const DEFAULT_MAX_FIX_PASSES: usize = 10;

const TOP_LEVEL_KEYS: &[&str] = &["rules", "fix"];
const SECTION_KEYS: &[(&str, &[&str])] = &[
    ("rules", &["disabled", "severity", "design", "naming", "usage"]),
    ("fix", &["max_passes"]),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: invalid configuration: {message}", .path.display())]
    Toml { path: PathBuf, message: String },
}

/// A key the loader ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// `None` for top-level keys.
    pub section: Option<&'static str>,
    pub key: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section {
            Some(section) => write!(f, "unknown key `{}` in [{}]", self.key, section),
            None => write!(f, "unknown top-level key `{}`", self.key),
        }
    }
}

/// A parsed configuration together with where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when no file was found and defaults are in use.
    pub path: Option<PathBuf>,
    pub warnings: Vec<ConfigWarning>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub fix: FixConfig,
}

/// The `[rules]` table. Rules are referenced by id (`D001`) or name
/// (`avoid-out-parameters`).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    pub disabled: Vec<String>,
    pub severity: HashMap<String, Severity>,
    pub design: Option<bool>,
    pub naming: Option<bool>,
    pub usage: Option<bool>,
}

impl RulesConfig {
    /// Entries in `disabled` or `severity` that name no rule in `registry`.
    pub fn unknown_rule_refs<'a>(&'a self, registry: &RuleRegistry) -> Vec<&'a str> {
        let mut unknown: Vec<&str> = self
            .disabled
            .iter()
            .chain(self.severity.keys())
            .map(String::as_str)
            .filter(|rule_ref| {
                registry.get_rule(rule_ref).is_none()
                    && registry.get_rule_by_name(rule_ref).is_none()
            })
            .collect();
        unknown.sort_unstable();
        unknown.dedup();
        unknown
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FixConfig {
    pub max_passes: usize,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_FIX_PASSES,
        }
    }
}

impl Config {
    /// Parses `content`; `path` is only used in error messages.
    pub fn from_toml(content: &str, path: &Path) -> Result<LoadedConfig, ConfigError> {
        let invalid = |e: toml::de::Error| ConfigError::Toml {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        };
        let table: toml::Table = toml::from_str(content).map_err(invalid)?;
        let warnings = unknown_keys(&table);
        let config: Config = toml::from_str(content).map_err(invalid)?;

        Ok(LoadedConfig {
            config,
            path: Some(path.to_path_buf()),
            warnings,
        })
    }

    pub fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let loaded = Self::from_toml(&content, path)?;
        debug!(path = %path.display(), warnings = loaded.warnings.len(), "loaded configuration");
        Ok(loaded)
    }

    /// Loads the nearest `vigil.toml` at or above `start_dir`.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file is logged
    /// and also yields the defaults, with `path` still pointing at it.
    pub fn discover(start_dir: &Path) -> LoadedConfig {
        let Some(path) = find_config_file(start_dir) else {
            return LoadedConfig::default();
        };
        match Self::load(&path) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(%err, "ignoring configuration file");
                LoadedConfig {
                    path: Some(path),
                    ..LoadedConfig::default()
                }
            }
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

fn unknown_keys(table: &toml::Table) -> Vec<ConfigWarning> {
    let mut warnings: Vec<ConfigWarning> = table
        .keys()
        .filter(|key| !TOP_LEVEL_KEYS.contains(&key.as_str()))
        .map(|key| ConfigWarning {
            section: None,
            key: key.clone(),
        })
        .collect();

    for &(section, known) in SECTION_KEYS {
        let Some(toml::Value::Table(entries)) = table.get(section) else {
            continue;
        };
        warnings.extend(
            entries
                .keys()
                .filter(|key| !known.contains(&key.as_str()))
                .map(|key| ConfigWarning {
                    section: Some(section),
                    key: key.clone(),
                }),
        );
    }

    warnings
}
