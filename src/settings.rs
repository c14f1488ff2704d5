//! Settings store for the training framework
//!
//! Settings are a flat JSON object of key/value pairs. A store is read once at
//! start-up and handed explicitly to whatever needs it (for example
//! [`crate::callbacks::add_integration_callbacks`]); there is no process-wide
//! instance.
//!
//! # Example
//!
//! ```json
//! {
//!   "runs_dir": "runs",
//!   "raytune": true,
//!   "wandb": false
//! }
//! ```

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Version written into freshly created settings files.
pub const SETTINGS_VERSION: &str = "0.0.4";

/// Key of the flag that enables the Ray Tune integration.
pub const RAYTUNE_KEY: &str = "raytune";

/// Built-in defaults. Every known key and the JSON type its value must have.
fn default_entries() -> &'static Map<String, Value> {
    static DEFAULTS: OnceLock<Map<String, Value>> = OnceLock::new();
    DEFAULTS.get_or_init(build_defaults)
}

fn build_defaults() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("settings_version".into(), Value::from(SETTINGS_VERSION));
    map.insert("datasets_dir".into(), Value::from("datasets"));
    map.insert("weights_dir".into(), Value::from("weights"));
    map.insert("runs_dir".into(), Value::from("runs"));
    map.insert("uuid".into(), Value::from(""));
    map.insert("sync".into(), Value::from(true));
    map.insert("clearml".into(), Value::from(true));
    map.insert("comet".into(), Value::from(true));
    map.insert("dvc".into(), Value::from(true));
    map.insert("hub".into(), Value::from(true));
    map.insert("mlflow".into(), Value::from(true));
    map.insert("neptune".into(), Value::from(true));
    // Opt-in: reporting to a tuning session must be asked for explicitly.
    map.insert(RAYTUNE_KEY.into(), Value::from(false));
    map.insert("tensorboard".into(), Value::from(true));
    map.insert("wandb".into(), Value::from(true));
    map
}

fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Null, Value::Null)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Key/value settings snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    entries: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            entries: default_entries().clone(),
        }
    }
}

impl Settings {
    /// Build a store holding exactly `entries`, without merging defaults.
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Parse a JSON object and merge it over the defaults.
    ///
    /// Known keys must keep the JSON type of their default value; unknown keys
    /// are carried through untouched.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let parsed: Value = serde_json::from_str(contents)?;
        let overrides = match parsed {
            Value::Object(map) => map,
            other => {
                return Err(Error::invalid_setting(
                    "<root>",
                    format!("expected a JSON object, found {}", kind_name(&other)),
                ))
            }
        };

        let mut settings = Self::default();
        for (key, value) in overrides {
            settings.update(key, value)?;
        }
        Ok(settings)
    }

    /// Load settings from a JSON file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kan_tune::settings::Settings;
    ///
    /// let settings = Settings::load("settings.json").unwrap();
    /// let enabled = settings.get_bool("raytune").unwrap_or(false);
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let settings = Self::from_json_str(&contents)?;
        tracing::debug!(path = %path.display(), keys = settings.entries.len(), "loaded settings");
        Ok(settings)
    }

    /// Write the settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Set `key` to `value`, enforcing the default's JSON type for known keys.
    pub fn update(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        if let Some(default) = default_entries().get(&key) {
            if !same_kind(default, &value) {
                return Err(Error::invalid_setting(
                    key,
                    format!(
                        "expected {}, found {}",
                        kind_name(default),
                        kind_name(&value)
                    ),
                ));
            }
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Restore the defaults, dropping unknown keys.
    pub fn reset(&mut self) {
        self.entries = default_entries().clone();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Boolean value of `key`; `None` when absent or not a JSON boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
