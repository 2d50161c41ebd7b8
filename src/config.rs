//! Global engine configuration.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::error::{TimetableError, TimetableResult};

static DEFAULT_DATA_PATH: &str = "~/.local/share/unitable";

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn is_default_data_path(p: &PathBuf) -> bool {
    *p == default_data_path()
}

/// Configuration at ~/.config/unitable/config.toml
///
/// Only the engine's storage location lives here; everything else the
/// engine needs (owner id, subscriptions, feed snapshots) is handed in by
/// the host at runtime.
#[derive(Serialize, Deserialize, Clone)]
pub struct UnitableConfig {
    #[serde(default = "default_data_path", skip_serializing_if = "is_default_data_path")]
    pub data_dir: PathBuf,
}

impl UnitableConfig {
    pub fn config_path() -> TimetableResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TimetableError::Config("Could not determine config directory".into()))?
            .join("unitable");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> TimetableResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let config: UnitableConfig = Config::builder()
            .add_source(File::from(config_path).required(false))
            .build()
            .map_err(|e| TimetableError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TimetableError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Save the current config to ~/.config/unitable/config.toml
    pub fn save(&self) -> TimetableResult<()> {
        let config_path = Self::config_path()?;

        let content =
            toml::to_string_pretty(self).map_err(|e| TimetableError::Config(e.to_string()))?;

        std::fs::write(&config_path, content)
            .map_err(|e| TimetableError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> TimetableResult<()> {
        let contents = format!(
            "\
# unitable configuration

# Where timetable data (local events, feed annotations) is stored:
# data_dir = \"{}\"
",
            DEFAULT_DATA_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TimetableError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| TimetableError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }
}
