use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::MetadataError;

/// EXIF datetime layout. EXIF datetimes have no timezone info - they are local time as-is.
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Read the `DateTimeOriginal` capture time of an image.
///
/// `Ok(None)` when the file carries no EXIF block, no `DateTimeOriginal` field,
/// or a value that doesn't parse. `Err` only when the file can't be read or the
/// container is corrupt.
pub fn read_capture_time(path: &Path) -> Result<Option<NaiveDateTime>, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let exif = match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(exif::Error::Io(source)) => {
            return Err(MetadataError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => {
            return Err(MetadataError::Exif {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) else {
        return Ok(None);
    };

    // Raw ASCII rather than display_value(), which reformats datetimes.
    let raw = match &field.value {
        Value::Ascii(values) => values.first().and_then(|v| std::str::from_utf8(v).ok()),
        _ => None,
    };

    Ok(raw.and_then(parse_exif_datetime))
}

pub(crate) fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT).ok()
}
