//! Watch command
//!
//! Runs the archival loop in the foreground until interrupted.

use anyhow::Result;
use camino::Utf8Path;
use savewarden_backup::{BackupConfig, BackupManager};
use savewarden_core::WardenConfig;

use crate::cli::WatchArgs;
use crate::output;

pub async fn run(args: WatchArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = WardenConfig::load(config_path)?;
    let mut backup_config = BackupConfig::from_warden(&config);
    if args.no_cleanup {
        backup_config.cleanup_enabled = false;
    }

    output::header(&format!("Watching autosaves for world {}", config.world));
    output::kv("Autosave dir", backup_config.autosave_dir.as_str());
    output::kv("Archive dir", backup_config.archive_dir.as_str());
    output::kv(
        "Settle delay",
        &format!("{}s", backup_config.settle_delay.as_secs()),
    );
    if backup_config.cleanup_enabled {
        output::kv(
            "Cleanup interval",
            &format!("{}s", backup_config.retention.cleanup_interval.as_secs()),
        );
    } else {
        output::kv("Cleanup", "disabled");
    }

    let mut manager = BackupManager::new(backup_config);
    manager.start()?;
    output::info("Watching for new autosaves; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    manager.shutdown();
    output::success("Watcher stopped");
    Ok(())
}
