//! Restore command
//!
//! Connects the restore UI to the savewarden-backup restore engine.

use anyhow::Result;
use camino::Utf8Path;
use dialoguer::Confirm;
use savewarden_core::Error;

use crate::cli::RestoreArgs;
use crate::output;

pub async fn run(args: RestoreArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let manager = super::load_manager(config_path)?;

    output::header("Restore Backup");

    let backups = manager.list_backups(0).await?;
    let Some(target) = backups.iter().find(|b| b.index == args.index) else {
        output::error(&format!(
            "no backup with index {} (available: 0..{})",
            args.index,
            backups.len().saturating_sub(1)
        ));
        return Err(Error::InvalidBackupIndex {
            index: args.index,
            available: backups.len(),
        }
        .into());
    };

    output::kv("Backup", target.file_name());
    output::kv("Save time", &target.human_time());
    output::kv("Restores to", manager.config().save_slot.as_str());
    output::warning("The game server must be stopped before restoring");

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Overwrite the current save with this backup?")
            .default(false)
            .interact()?;
        if !confirmed {
            output::info("Restore cancelled");
            return Ok(());
        }
    }

    manager.restore_backup(args.index).await?;
    output::success(&format!(
        "Restored backup from {} into the live save slot",
        target.human_time()
    ));

    Ok(())
}
