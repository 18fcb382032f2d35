//! Save timestamp extraction from archived save containers.
//!
//! A save is a ZIP container with an embedded `world_meta.xml` record whose
//! `<DateTime>` element holds a Windows FILETIME tick count (100-ns intervals
//! since 1601). That embedded timestamp is authoritative: file mtimes change
//! whenever an archive is copied or transferred, the embedded value does not.

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use savewarden_core::{Error, Result};
use std::fs::File;
use std::io::Read;
use zip::ZipArchive;

/// Difference between the 1601 and 1970 epochs, in 100-ns units.
pub const FILETIME_EPOCH_OFFSET: i64 = 116_444_736_000_000_000;

/// Name of the metadata entry inside every save container.
const METADATA_ENTRY: &str = "world_meta.xml";

/// Reads the authoritative save timestamp out of a save container.
///
/// Every failure mode (unreadable container, missing metadata entry,
/// undecodable tick value) is returned as a descriptive [`Error`]; callers
/// indexing a directory treat these as skip-with-warning, never as fatal.
pub fn read_save_time(path: &Utf8Path) -> Result<DateTime<Utc>> {
    let file = File::open(path.as_std_path())?;

    let mut container = ZipArchive::new(file)
        .map_err(|e| Error::save_metadata(path.as_str(), format!("not a save container: {e}")))?;

    let mut entry = container.by_name(METADATA_ENTRY).map_err(|e| {
        Error::save_metadata(path.as_str(), format!("missing {METADATA_ENTRY}: {e}"))
    })?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Error::save_metadata(path.as_str(), format!("corrupt {METADATA_ENTRY}: {e}")))?;

    let ticks = parse_datetime_ticks(&xml).ok_or_else(|| {
        Error::save_metadata(
            path.as_str(),
            format!("no decodable <DateTime> tick value in {METADATA_ENTRY}"),
        )
    })?;

    filetime_to_utc(ticks).ok_or_else(|| {
        Error::save_metadata(path.as_str(), format!("tick value {ticks} out of range"))
    })
}

/// Scans the metadata XML for the `<DateTime>` element's tick count.
fn parse_datetime_ticks(xml: &str) -> Option<i64> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_datetime = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"DateTime" => in_datetime = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"DateTime" => in_datetime = false,
            Ok(Event::Text(t)) if in_datetime => {
                return t.unescape().ok()?.trim().parse().ok();
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Converts FILETIME ticks (100-ns since 1601) to a UTC timestamp.
fn filetime_to_utc(ticks: i64) -> Option<DateTime<Utc>> {
    let nanos = ticks.checked_sub(FILETIME_EPOCH_OFFSET)?.checked_mul(100)?;
    DateTime::from_timestamp(nanos.div_euclid(1_000_000_000), nanos.rem_euclid(1_000_000_000) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ticks_for, write_save_container};
    use camino::Utf8PathBuf;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn reads_embedded_save_time() {
        let dir = TempDir::new().unwrap();
        let save = utf8(&dir.path().join("mars-base.save"));
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        write_save_container(&save, ticks_for(when));

        assert_eq!(read_save_time(&save).unwrap(), when);
    }

    #[test]
    fn filetime_conversion_matches_known_value() {
        // 2024-01-01T00:00:00Z is 1_704_067_200 Unix seconds
        let ticks = 1_704_067_200 * 10_000_000 + FILETIME_EPOCH_OFFSET;
        let when = filetime_to_utc(ticks).unwrap();
        assert_eq!(when, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn epoch_offset_maps_to_unix_zero() {
        let when = filetime_to_utc(FILETIME_EPOCH_OFFSET).unwrap();
        assert_eq!(when.timestamp(), 0);
    }

    #[test]
    fn non_container_file_is_a_metadata_error() {
        let dir = TempDir::new().unwrap();
        let save = utf8(&dir.path().join("junk.save"));
        std::fs::write(&save, b"this is not a zip").unwrap();

        let err = read_save_time(&save).unwrap_err();
        assert!(matches!(err, Error::SaveMetadata { .. }));
        assert!(err.to_string().contains("junk.save"));
    }

    #[test]
    fn container_without_metadata_entry_is_rejected() {
        let dir = TempDir::new().unwrap();
        let save = utf8(&dir.path().join("empty.save"));

        let file = std::fs::File::create(save.as_std_path()).unwrap();
        let mut zw = zip::ZipWriter::new(file);
        zw.start_file("world.bin", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut zw, b"\x00\x01").unwrap();
        zw.finish().unwrap();

        let err = read_save_time(&save).unwrap_err();
        assert!(err.to_string().contains("world_meta.xml"));
    }

    #[test]
    fn non_numeric_datetime_is_rejected() {
        let dir = TempDir::new().unwrap();
        let save = utf8(&dir.path().join("bad.save"));

        let file = std::fs::File::create(save.as_std_path()).unwrap();
        let mut zw = zip::ZipWriter::new(file);
        zw.start_file("world_meta.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(
            &mut zw,
            b"<WorldMeta><DateTime>yesterday</DateTime></WorldMeta>",
        )
        .unwrap();
        zw.finish().unwrap();

        assert!(read_save_time(&save).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_save_time(Utf8Path::new("/nonexistent/x.save")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
