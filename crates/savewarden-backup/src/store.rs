//! Durable file operations for the archive store.
//!
//! The archive directory is the sole source of truth for listing and
//! retention, so every copy into it is flushed to disk before it is reported
//! as archived.

use camino::Utf8Path;
use std::fs::File;
use std::io;

/// Copies `src` to `dst`, overwriting `dst`, and fsyncs the destination so a
/// crash right after ingest cannot leave a truncated archive behind.
pub fn copy_durable(src: &Utf8Path, dst: &Utf8Path) -> io::Result<()> {
    let mut source = File::open(src.as_std_path())?;
    let mut destination = File::create(dst.as_std_path())?;
    io::copy(&mut source, &mut destination)?;
    destination.sync_all()
}

/// Creates a directory and all of its parents if absent.
pub fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    std::fs::create_dir_all(path.as_std_path())
}

/// Whether a filename matches the save container convention.
///
/// The current save system writes one `<name>.save` ZIP container per save.
/// The pre-container format spread a save across `world*.xml`/`world*.bin`
/// groups; those are not indexed here.
pub fn is_save_file(filename: &str) -> bool {
    filename.ends_with(".save")
}
