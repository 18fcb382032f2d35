//! Configuration file loading and parsing
//!
//! Savewarden is configured with a `savewarden.yaml` file describing the
//! watched world: where the game server writes its rotating autosaves, where
//! durable copies should be archived, and how aggressively old archives are
//! downsampled.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["savewarden.yaml", "savewarden.yml"];

/// Settle delay applied when the config leaves it at zero. Copying an
/// autosave the instant it appears risks capturing a partially-written file.
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 30;

/// Parsed savewarden.yaml contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// World identifier, as the game server names it
    pub world: String,

    /// Directory the game server writes rotating autosaves into (watched)
    pub autosave_dir: Utf8PathBuf,

    /// Directory durable archive copies are kept in (source of truth)
    pub archive_dir: Utf8PathBuf,

    /// Path of the live save slot the server loads from. Defaults to
    /// `saves/<world>/<world>.save` next to the server's working directory.
    #[serde(default)]
    pub save_slot: Option<Utf8PathBuf>,

    /// Seconds to wait after a create event before copying the new autosave
    #[serde(default)]
    pub settle_delay_secs: u64,

    /// Retention sweep configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Retention sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Whether the periodic retention sweep runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Most-recent archives that are always retained
    #[serde(default = "default_keep_last_n")]
    pub keep_last_n: usize,

    /// Age window (days) in which one archive per calendar day is retained
    #[serde(default = "default_keep_daily_days")]
    pub keep_daily_for_days: u64,

    /// Age window (days) in which one archive per ISO week is retained
    #[serde(default = "default_keep_weekly_days")]
    pub keep_weekly_for_days: u64,

    /// Age window (days) in which one archive per month is retained
    #[serde(default = "default_keep_monthly_days")]
    pub keep_monthly_for_days: u64,

    /// Seconds between retention sweeps
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_keep_last_n() -> usize {
    10
}

fn default_keep_daily_days() -> u64 {
    7
}

fn default_keep_weekly_days() -> u64 {
    30
}

fn default_keep_monthly_days() -> u64 {
    365
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            keep_last_n: default_keep_last_n(),
            keep_daily_for_days: default_keep_daily_days(),
            keep_weekly_for_days: default_keep_weekly_days(),
            keep_monthly_for_days: default_keep_monthly_days(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = if let Some(p) = path {
            let content = fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.as_str())
                } else {
                    Error::Io(e)
                }
            })?;
            (p.to_owned(), content)
        } else {
            Self::find_config()?
        };

        let config: WardenConfig = serde_yaml_ng::from_str(&content)?;
        config.validate().map_err(|e| {
            Error::invalid_config(format!("{}: {}", config_path, e))
        })?;

        Ok(config)
    }

    /// Search the working directory for a config file
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        for name in CONFIG_FILE_NAMES {
            let candidate = Utf8PathBuf::from(name);
            if let Ok(content) = fs::read_to_string(&candidate) {
                return Ok((candidate, content));
            }
        }
        Err(Error::config_not_found(CONFIG_FILE_NAMES[0]))
    }

    /// Validate field-level constraints the schema cannot express
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.world.trim().is_empty() {
            return Err("world must not be empty".to_string());
        }
        if self.autosave_dir == self.archive_dir {
            return Err("autosave_dir and archive_dir must be different directories".to_string());
        }
        if self.cleanup.enabled && self.cleanup.interval_secs == 0 {
            return Err("cleanup.interval_secs must be non-zero when cleanup is enabled".to_string());
        }
        Ok(())
    }

    /// Effective settle delay: a zero value falls back to the default
    pub fn settle_delay_secs(&self) -> u64 {
        if self.settle_delay_secs == 0 {
            DEFAULT_SETTLE_DELAY_SECS
        } else {
            self.settle_delay_secs
        }
    }

    /// Effective live save slot path
    pub fn save_slot(&self) -> Utf8PathBuf {
        self.save_slot.clone().unwrap_or_else(|| {
            Utf8PathBuf::from("saves")
                .join(&self.world)
                .join(format!("{}.save", self.world))
        })
    }
}
