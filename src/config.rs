//! Configuration loading and validation
//!
//! All preconditions of the gesture core (positive threshold, non-zero
//! timeout) are discharged here, at the configuration boundary: a config
//! that validates produces trackers that never need to re-check their
//! parameters. Missing configuration gracefully degrades to a written-out
//! default rather than preventing startup.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::gesture::action::{ActionBindings, KeyCode, KeyEvent, KeyTapAction, SwipeAction};
use crate::gesture::tracker::TrackerConfig;
use crate::gesture::GestureError;

const CONFIG_DIR: &str = "trackswipe";
const CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// One entry per physical input device
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Configuration of one swipe-tracked input device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name, used to route incoming events
    pub name: String,

    /// Minimum accumulated displacement on the dominant axis
    pub threshold: i32,

    /// Session timeout in milliseconds
    pub timeout_ms: u64,

    /// Key bindings per swipe direction; unbound directions do nothing
    #[serde(default)]
    pub bindings: BindingsConfig,
}

/// Optional key binding per direction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<BindingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<BindingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<BindingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<BindingConfig>,
}

/// A single direction binding
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Key emitted as a press/release pair when the direction fires
    pub key: KeyCode,
}

impl AppConfig {
    /// Built-in default: one trackball with arrow keys on all directions
    pub fn default_config() -> Self {
        Self {
            devices: vec![DeviceConfig {
                name: "trackball".to_string(),
                threshold: 50,
                timeout_ms: 300,
                bindings: BindingsConfig {
                    up: Some(BindingConfig {
                        key: KeyCode::ArrowUp,
                    }),
                    down: Some(BindingConfig {
                        key: KeyCode::ArrowDown,
                    }),
                    left: Some(BindingConfig {
                        key: KeyCode::ArrowLeft,
                    }),
                    right: Some(BindingConfig {
                        key: KeyCode::ArrowRight,
                    }),
                },
            }],
        }
    }

    /// Validates the whole configuration before any engine is constructed
    pub fn validate(&self) -> Result<(), GestureError> {
        if self.devices.is_empty() {
            return Err(GestureError::ConfigError(
                "At least one device must be configured".to_string(),
            ));
        }

        for device in &self.devices {
            device.validate()?;
        }

        // Gerätenamen müssen eindeutig sein, sonst ist das Routing mehrdeutig
        for (i, device) in self.devices.iter().enumerate() {
            if self.devices[i + 1..].iter().any(|d| d.name == device.name) {
                return Err(GestureError::ConfigError(format!(
                    "Duplicate device name: {}",
                    device.name
                )));
            }
        }

        Ok(())
    }

    /// Loads and validates a configuration file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))?;

        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration: {}", e))?;

        Ok(config)
    }

    /// Serializes the configuration to the given path, creating parent
    /// directories as needed
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize configuration: {}", e))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;

        Ok(())
    }
}

impl DeviceConfig {
    /// Checks the reducer preconditions for this device
    pub fn validate(&self) -> Result<(), GestureError> {
        if self.name.is_empty() {
            return Err(GestureError::ConfigError(
                "Device name must not be empty".to_string(),
            ));
        }

        if self.threshold <= 0 {
            return Err(GestureError::ConfigError(format!(
                "Threshold for {} must be positive, got {}",
                self.name, self.threshold
            )));
        }

        if self.timeout_ms == 0 {
            return Err(GestureError::ConfigError(format!(
                "Timeout for {} must be non-zero",
                self.name
            )));
        }

        Ok(())
    }

    /// Builds the tracker configuration, wiring key bindings onto the
    /// given output channel
    pub fn tracker_config(&self, key_tx: mpsc::Sender<KeyEvent>) -> TrackerConfig {
        TrackerConfig {
            threshold: self.threshold,
            timeout: Duration::from_millis(self.timeout_ms),
            bindings: self.bindings.build(&key_tx),
        }
    }
}

impl BindingsConfig {
    /// Creates the action handles for all bound directions
    pub fn build(&self, key_tx: &mpsc::Sender<KeyEvent>) -> ActionBindings {
        fn bind(
            binding: &Option<BindingConfig>,
            key_tx: &mpsc::Sender<KeyEvent>,
        ) -> Option<Arc<dyn SwipeAction>> {
            binding
                .as_ref()
                .map(|b| Arc::new(KeyTapAction::new(b.key, key_tx.clone())) as Arc<dyn SwipeAction>)
        }

        ActionBindings {
            up: bind(&self.up, key_tx),
            down: bind(&self.down, key_tx),
            left: bind(&self.left, key_tx),
            right: bind(&self.right, key_tx),
        }
    }
}

/// Resolves the default config file path under the user config directory
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

/// Writes the built-in default configuration if none exists yet
pub async fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();

    let exists = tokio::fs::try_exists(&path)
        .await
        .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?;

    if !exists {
        info!(
            "No configuration found, writing default to {}",
            path.display()
        );
        AppConfig::default_config().save(&path).await?;
    }

    Ok(path)
}
