//! Crash-safe restoration of an archived save into the live slot.
//!
//! The restore sequence never leaves the live slot worse than it was before
//! the call: the current save is snapshotted to a private temp file first,
//! and a failed forward copy rolls the snapshot back. Only if the rollback
//! copy *also* fails is the operator pointed at the surviving snapshot.

use crate::store::copy_durable;
use camino::{Utf8Path, Utf8PathBuf};
use savewarden_core::{Error, Result};
use std::fs;
use std::io;
use tracing::{info, warn};

/// Copies `archive` over the live save `slot` with rollback on failure.
///
/// State machine: snapshot current slot → forward copy → commit (delete
/// snapshot) or roll back (restore snapshot). The snapshot file is only kept
/// alive past the call in the double-failure case, where its path is part of
/// the returned error.
pub fn restore_save(archive: &Utf8Path, slot: &Utf8Path) -> Result<()> {
    let snapshot = create_snapshot(slot)?;

    if let Err(restore_error) = copy_durable(archive, slot) {
        return match copy_durable(&snapshot, slot) {
            Ok(()) => {
                remove_snapshot(&snapshot);
                Err(Error::RestoreFailed {
                    source: restore_error,
                })
            }
            // The one path that must never silently lose data: report both
            // failures and where the pre-restore save survives.
            Err(rollback_error) => Err(Error::RestoreRollbackFailed {
                restore_error,
                rollback_error,
                snapshot: snapshot.to_string(),
            }),
        };
    }

    remove_snapshot(&snapshot);
    info!("restored {} into {}", archive, slot);
    Ok(())
}

/// Copies the current live save to a private temp file and returns its path.
/// The file is deliberately not scheduled for automatic deletion; its
/// lifetime is managed by the caller's commit/rollback outcome.
fn create_snapshot(slot: &Utf8Path) -> Result<Utf8PathBuf> {
    let temp = tempfile::Builder::new()
        .prefix("warden-restore-")
        .suffix(".save")
        .tempfile()?;
    let (_file, path) = temp.keep().map_err(|e| Error::Io(e.error))?;
    let snapshot = Utf8PathBuf::from_path_buf(path)
        .map_err(|p| Error::Io(io::Error::other(format!("non-UTF-8 temp path: {}", p.display()))))?;

    if let Err(e) = copy_durable(slot, &snapshot) {
        remove_snapshot(&snapshot);
        return Err(Error::Io(io::Error::new(
            e.kind(),
            format!("failed to back up current save {slot} before restore: {e}"),
        )));
    }
    Ok(snapshot)
}

fn remove_snapshot(snapshot: &Utf8Path) {
    if let Err(e) = fs::remove_file(snapshot.as_std_path()) {
        warn!("failed to remove restore snapshot {snapshot}: {e}");
    }
}
