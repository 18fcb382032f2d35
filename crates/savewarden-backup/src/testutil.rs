//! Shared helpers for building synthetic save containers in tests.

use crate::metadata::FILETIME_EPOCH_OFFSET;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use std::io::Write;

/// FILETIME tick count for a UTC timestamp.
pub fn ticks_for(when: DateTime<Utc>) -> i64 {
    when.timestamp() * 10_000_000 + FILETIME_EPOCH_OFFSET
}

/// Writes a minimal save container: a ZIP holding a `world_meta.xml` with the
/// given tick count plus a small payload entry so containers differ in bytes.
pub fn write_save_container(path: &Utf8Path, ticks: i64) {
    write_save_container_with_payload(path, ticks, b"world payload");
}

/// Like [`write_save_container`] but with caller-chosen payload bytes.
pub fn write_save_container_with_payload(path: &Utf8Path, ticks: i64, payload: &[u8]) {
    let file = std::fs::File::create(path.as_std_path()).unwrap();
    let mut zw = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    zw.start_file("world_meta.xml", options).unwrap();
    zw.write_all(
        format!("<WorldMeta><DateTime>{ticks}</DateTime><Name>test</Name></WorldMeta>").as_bytes(),
    )
    .unwrap();

    zw.start_file("world.bin", options).unwrap();
    zw.write_all(payload).unwrap();

    zw.finish().unwrap();
}
