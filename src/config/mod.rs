//! Configuration management for `issue_tracker`.
//!
//! Values are resolved from layers, highest precedence first:
//! 1. CLI flags
//! 2. Environment (`ISSUE_TRACKER_*`, plus `PORT`)
//! 3. YAML config file
//! 4. Built-in defaults
//!
//! Keys are normalized to lowercase with `-` separators, so `lock_timeout`,
//! `LOCK_TIMEOUT` and `lock-timeout` name the same setting.

use crate::error::{Result, TrackerError};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database file.
pub const DEFAULT_DB: &str = "issues.db";

/// Config file picked up from the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "issue-tracker.yaml";

/// `--db` value that selects an in-memory store.
pub const MEMORY_DB: &str = ":memory:";

const ENV_PREFIX: &str = "ISSUE_TRACKER_";

/// Fully resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub db: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub lock_timeout_ms: Option<u64>,
    pub log_json: bool,
}

impl ServerConfig {
    /// Whether the database lives only in memory.
    #[must_use]
    pub fn is_memory_db(&self) -> bool {
        self.db.as_os_str() == MEMORY_DB
    }

    /// Resolve a merged layer into typed settings.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value cannot be parsed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let bind = layer
            .get("bind")
            .map_or_else(|| DEFAULT_BIND.to_string(), |v| v.trim().to_string());

        let port = match layer.get("port") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| TrackerError::Config(format!("invalid port: {raw}")))?,
            None => DEFAULT_PORT,
        };

        let db = layer
            .get("db")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DB), PathBuf::from);

        let static_dir = layer
            .get("static-dir")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let lock_timeout_ms = layer
            .get("lock-timeout")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| TrackerError::Config(format!("invalid lock timeout: {raw}")))
            })
            .transpose()?;

        let log_json = match layer.get("log-json") {
            Some(raw) => parse_bool(raw)
                .ok_or_else(|| TrackerError::Config(format!("invalid boolean for log-json: {raw}")))?,
            None => false,
        };

        Ok(Self {
            bind,
            port,
            db,
            static_dir,
            lock_timeout_ms,
            log_json,
        })
    }
}

/// One source of raw key/value settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Value for `key` after normalization.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `ISSUE_TRACKER_*` variables and `PORT`.
    ///
    /// `ISSUE_TRACKER_PORT` wins over `PORT` when both are set.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        let mut plain_port = None;

        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            } else if key == "PORT" {
                plain_port = Some(value);
            }
        }

        if let Some(port) = plain_port {
            layer.values.entry("port".to_string()).or_insert(port);
        }

        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub db: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub lock_timeout: Option<u64>,
    pub log_json: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(bind) = &self.bind {
            layer.insert("bind", bind.clone());
        }
        if let Some(port) = self.port {
            layer.insert("port", port.to_string());
        }
        if let Some(path) = &self.db {
            layer.insert("db", path.to_string_lossy());
        }
        if let Some(dir) = &self.static_dir {
            layer.insert("static-dir", dir.to_string_lossy());
        }
        if let Some(timeout) = self.lock_timeout {
            layer.insert("lock-timeout", timeout.to_string());
        }
        if let Some(json) = self.log_json {
            layer.insert("log-json", json.to_string());
        }

        layer
    }
}

/// Defaults as a layer, so `--print-config` and resolution share one source.
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("bind", DEFAULT_BIND);
    layer.insert("port", DEFAULT_PORT.to_string());
    layer.insert("db", DEFAULT_DB);
    layer
}

/// Load the YAML layer.
///
/// An explicitly named file must exist; the working-directory default is
/// optional.
///
/// # Errors
///
/// Returns an error if a named file is missing or any file fails to parse.
pub fn load_file_layer(explicit: Option<&Path>) -> Result<ConfigLayer> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(TrackerError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            ConfigLayer::from_yaml(path)
        }
        None => ConfigLayer::from_yaml(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

/// Resolve the full configuration from all layers.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or a value is invalid.
pub fn load_config(cli: &CliOverrides, config_file: Option<&Path>) -> Result<ServerConfig> {
    load_config_with_env(cli, config_file, ConfigLayer::from_env())
}

/// [`load_config`] with an explicit environment layer.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or a value is invalid.
pub fn load_config_with_env(
    cli: &CliOverrides,
    config_file: Option<&Path>,
    env_layer: ConfigLayer,
) -> Result<ServerConfig> {
    let file_layer = load_file_layer(config_file)?;
    let merged = ConfigLayer::merge_layers(&[
        default_config_layer(),
        file_layer,
        env_layer,
        cli.as_layer(),
    ]);
    ServerConfig::from_layer(&merged)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
