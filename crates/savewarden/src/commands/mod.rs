//! CLI command implementations

pub mod list;
pub mod restore;
pub mod version;
pub mod watch;

use anyhow::Result;
use camino::Utf8Path;
use savewarden_backup::{BackupConfig, BackupManager};
use savewarden_core::WardenConfig;

/// Loads savewarden.yaml and builds a stopped manager around it.
fn load_manager(config_path: Option<&Utf8Path>) -> Result<BackupManager> {
    let config = WardenConfig::load(config_path)?;
    Ok(BackupManager::new(BackupConfig::from_warden(&config)))
}
