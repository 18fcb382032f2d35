//! List command

use anyhow::Result;
use camino::Utf8Path;

use crate::cli::ListArgs;
use crate::output;

pub async fn run(args: ListArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let manager = super::load_manager(config_path)?;

    output::header(&format!(
        "Backups for world {}",
        manager.config().world
    ));

    let spinner = output::spinner("Reading archive directory...");
    let result = manager.list_backups(args.limit).await;
    spinner.finish_and_clear();

    let backups = match result {
        Ok(backups) => backups,
        // A missing archive directory is a first-run situation, not a crash.
        Err(e) if e.is_archive_dir_missing() => {
            output::info(&e.to_string());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if backups.is_empty() {
        output::info("No backups archived yet");
        return Ok(());
    }

    for backup in &backups {
        println!(
            "  [{:>3}]  {}  {}",
            backup.index,
            backup.human_time(),
            backup.file_name()
        );
    }
    println!();
    output::info(&format!(
        "{} backup(s); restore with `savewarden restore <index>`",
        backups.len()
    ));

    Ok(())
}
