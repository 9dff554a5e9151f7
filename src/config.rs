//! Configuration loading.
//!
//! Layers, lowest first: built-in defaults, a YAML file, `STYLESCOPE__SECTION__KEY` variables,
//! then a `STYLESCOPE_OVERRIDE_JSON` blob.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use perceiver_design::ProbePolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};

pub const ENV_PREFIX: &str = "STYLESCOPE__";
pub const ENV_JSON: &str = "STYLESCOPE_OVERRIDE_JSON";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylescopeConfig {
    pub log_level: String,
    pub log_json: bool,
    pub policy: ProbePolicy,
}

impl Default for StylescopeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_json: false,
            policy: ProbePolicy::default(),
        }
    }
}

pub struct LoadedConfig {
    pub config: StylescopeConfig,
    /// File that was read, if any.
    pub path: Option<PathBuf>,
}

/// Explicit path, else `./stylescope.yaml`, else `<config dir>/stylescope/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("stylescope.yaml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|mut dir| {
        dir.push("stylescope");
        dir.push("config.yaml");
        dir
    })
}

pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let mut merged =
        serde_json::to_value(StylescopeConfig::default()).context("Failed to encode defaults")?;

    let candidate = config_path
        .map(Path::to_path_buf)
        .or_else(default_config_path);
    let mut path = None;
    if let Some(candidate) = candidate {
        if candidate.exists() {
            let content = fs::read_to_string(&candidate)
                .await
                .with_context(|| format!("Failed to read config file {}", candidate.display()))?;
            let overlay = parse_yaml(&content)
                .with_context(|| format!("Failed to parse config file {}", candidate.display()))?;
            merge(&mut merged, overlay);
            info!("Loaded configuration from: {}", candidate.display());
            path = Some(candidate);
        } else if config_path.is_some() {
            warn!(
                "Config file not found, using defaults: {}",
                candidate.display()
            );
        }
    }

    for (segments, value) in overlays_from_env() {
        debug!(key = %segments.join("."), "applying environment override");
        set_path(&mut merged, &segments, value);
    }
    if let Ok(raw) = env::var(ENV_JSON) {
        if !raw.trim().is_empty() {
            let overlay: Value =
                serde_json::from_str(&raw).with_context(|| format!("Invalid {ENV_JSON}"))?;
            merge(&mut merged, overlay);
        }
    }

    let config: StylescopeConfig =
        serde_json::from_value(merged).context("Configuration does not match the schema")?;
    Ok(LoadedConfig { config, path })
}

fn parse_yaml(content: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    Ok(serde_json::to_value(yaml)?)
}

fn overlays_from_env() -> Vec<(Vec<String>, Value)> {
    let mut overlays: Vec<(Vec<String>, Value)> = env::vars()
        .filter_map(|(key, raw)| {
            let stripped = key.strip_prefix(ENV_PREFIX)?;
            let segments: Vec<String> = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect();
            (!segments.is_empty()).then(|| (segments, parse_env_value(&raw)))
        })
        .collect();
    overlays.sort_by(|a, b| a.0.cmp(&b.0));
    overlays
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Objects merge key by key; anything else replaces.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

fn set_path(root: &mut Value, segments: &[String], value: Value) {
    let mut current = root;
    for segment in segments {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(segment.clone()).or_insert(Value::Null),
            _ => return,
        };
    }
    *current = value;
}
