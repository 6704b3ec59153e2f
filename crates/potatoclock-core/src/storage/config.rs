//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Grid geometry (visible hours, scale, snap unit)
//! - Timer durations and presets
//! - The default sync user
//!
//! Configuration is stored at `~/.config/potatoclock/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::grid::GridGeometry;
use crate::timer::TimerConfig;

/// Weekly grid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_window_start_hour")]
    pub window_start_hour: u32,
    #[serde(default = "default_window_end_hour")]
    pub window_end_hour: u32,
    #[serde(default = "default_pixels_per_hour")]
    pub pixels_per_hour: f64,
    #[serde(default = "default_snap_minutes")]
    pub snap_minutes: u32,
    #[serde(default = "default_min_block_minutes")]
    pub min_block_minutes: u32,
    #[serde(default = "default_min_height_px")]
    pub min_height_px: f64,
    #[serde(default = "default_header_height_px")]
    pub header_height_px: f64,
}

/// Sync configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// User whose collections are used when no `--user` is given.
    /// Unset means anonymous, local-only storage.
    #[serde(default)]
    pub user: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/potatoclock/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_window_start_hour() -> u32 {
    6
}
fn default_window_end_hour() -> u32 {
    24
}
fn default_pixels_per_hour() -> f64 {
    60.0
}
fn default_snap_minutes() -> u32 {
    15
}
fn default_min_block_minutes() -> u32 {
    30
}
fn default_min_height_px() -> f64 {
    20.0
}
fn default_header_height_px() -> f64 {
    40.0
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            window_start_hour: default_window_start_hour(),
            window_end_hour: default_window_end_hour(),
            pixels_per_hour: default_pixels_per_hour(),
            snap_minutes: default_snap_minutes(),
            min_block_minutes: default_min_block_minutes(),
            min_height_px: default_min_height_px(),
            header_height_px: default_header_height_px(),
        }
    }
}

impl GridConfig {
    pub fn geometry(&self) -> Result<GridGeometry, ValidationError> {
        GridGeometry::new(
            self.window_start_hour,
            self.window_end_hour,
            self.pixels_per_hour,
            self.snap_minutes,
        )
        .map(|g| {
            g.with_min_block_minutes(self.min_block_minutes)
                .with_min_height_px(self.min_height_px)
                .with_header_height_px(self.header_height_px)
        })
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional strings are stored as null until set.
                    serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing the defaults if no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing the defaults there if no file exists.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value by dot-separated key without saving.
    ///
    /// The configuration is unchanged if the key is unknown, the value does
    /// not parse, or the result is not a usable grid or timer setup.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.grid.geometry().map_err(|e| invalid(e.to_string()))?;
        updated.timer.validate().map_err(|e| invalid(e.to_string()))?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    pub fn geometry(&self) -> Result<GridGeometry, ValidationError> {
        self.grid.geometry()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
