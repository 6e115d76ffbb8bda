pub mod exif;
pub mod video;

use chrono::{DateTime, Datelike, Local, NaiveDateTime};
use std::path::Path;

use crate::error::MetadataError;
use crate::media::{MediaKind, TimestampSource};

/// Metadata timestamps before this year are treated as zeroed or malformed.
pub const MIN_TRUSTED_YEAR: i32 = 2000;

/// Result of date resolution: timestamp + where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResult {
    pub date: NaiveDateTime,
    pub source: TimestampSource,
}

/// Read the embedded capture time for a file of the given kind.
pub fn read_metadata_date(path: &Path, kind: MediaKind) -> Result<Option<NaiveDateTime>, MetadataError> {
    match kind {
        MediaKind::Image => exif::read_capture_time(path),
        MediaKind::Video => video::read_creation_time(path),
    }
}

/// Filesystem modification time as local naive time.
pub fn modification_time(path: &Path) -> std::io::Result<NaiveDateTime> {
    let metadata = std::fs::metadata(path)?;
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    let utc = DateTime::from_timestamp(mtime.unix_seconds(), 0).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "modification time out of range")
    })?;
    Ok(utc.with_timezone(&Local).naive_local())
}

/// Whether a metadata timestamp passes the sanity check.
pub fn is_trusted(date: &NaiveDateTime) -> bool {
    date.year() >= MIN_TRUSTED_YEAR
}

/// Resolve the best-effort capture time of a file.
///
/// Priority:
/// 1. embedded metadata (EXIF for images, container for videos), if year >= 2000
/// 2. filesystem modification time
///
/// Metadata read errors are logged and treated as "no timestamp"; only a
/// failure to stat the file itself is returned.
pub fn resolve(path: &Path, kind: MediaKind) -> std::io::Result<DateResult> {
    match read_metadata_date(path, kind) {
        Ok(Some(date)) if is_trusted(&date) => {
            return Ok(DateResult {
                date,
                source: TimestampSource::Metadata,
            });
        }
        Ok(Some(date)) => {
            tracing::debug!("Discarding untrustworthy metadata date {} for {:?}", date, path);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Error reading metadata from {:?}: {}", path, e);
        }
    }

    Ok(DateResult {
        date: modification_time(path)?,
        source: TimestampSource::Fallback,
    })
}
