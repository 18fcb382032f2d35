//! Ordered, indexed view of the archive directory.
//!
//! The archive directory is the sole source of truth: every listing walks it,
//! pulls the authoritative save time out of each container, and re-derives
//! positional indices. Indices are ephemeral — adding or removing any archive
//! renumbers everything newer — so callers treat them as display handles valid
//! only until the set changes, with `save_time` as the stable key.

use crate::metadata::read_save_time;
use crate::store::is_save_file;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use savewarden_core::{Error, Result};
use tracing::warn;
use walkdir::WalkDir;

/// One retained save in the archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// Absolute path of the save container
    pub path: Utf8PathBuf,

    /// Authoritative timestamp decoded from the container's metadata
    pub save_time: DateTime<Utc>,

    /// Position after sorting all archives ascending by save time (oldest = 0)
    pub index: usize,
}

impl Archive {
    /// Container filename without its directory.
    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }

    /// Save time formatted for operators.
    pub fn human_time(&self) -> String {
        self.save_time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// Lists all valid save containers in the archive directory, sorted ascending
/// by save time with positional indices assigned.
///
/// Containers with unreadable metadata are logged and excluded; only an
/// unusable directory aborts the listing. A missing directory is classified
/// as [`Error::ArchiveDirMissing`] so callers can show guidance instead of a
/// bare IO error.
pub fn list_save_files(archive_dir: &Utf8Path) -> Result<Vec<Archive>> {
    if !archive_dir.as_std_path().is_dir() {
        return Err(Error::archive_dir_missing(archive_dir.as_str()));
    }

    let mut saves = Vec::new();
    for entry in WalkDir::new(archive_dir.as_std_path())
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let entry = entry.map_err(|e| {
            Error::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("walkdir loop while reading archive directory")
            }))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_save_file(&name) {
            continue;
        }

        let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(p) => p,
            Err(p) => {
                warn!("skipping archive with non-UTF-8 path: {}", p.display());
                continue;
            }
        };

        match read_save_time(&path) {
            Ok(save_time) => saves.push(Archive {
                path,
                save_time,
                index: 0,
            }),
            Err(e) => warn!("skipping backup file: {e}"),
        }
    }

    // Ties broken by path so one snapshot always yields one ordering.
    saves.sort_by(|a, b| {
        a.save_time
            .cmp(&b.save_time)
            .then_with(|| a.path.cmp(&b.path))
    });
    for (i, save) in saves.iter_mut().enumerate() {
        save.index = i;
    }

    Ok(saves)
}
