use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::MetadataError;

/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01.
const QT_TO_UNIX_OFFSET: i64 = 2_082_844_800;

const EBML_HEADER_ID: u32 = 0x1A45_DFA3;
const MKV_SEGMENT_ID: u32 = 0x1853_8067;
const MKV_INFO_ID: u32 = 0x1549_A966;
const MKV_DATE_UTC_ID: u32 = 0x4461;

/// Read the container-level creation time of a video.
///
/// Supports ISO BMFF (`mp4`, `mov`) via `moov/mvhd` and Matroska (`mkv`) via
/// `Segment/Info/DateUTC`. Timezone information is discarded: the stored UTC
/// value is returned as a naive timestamp. Other containers yield `Ok(None)`.
pub fn read_creation_time(path: &Path) -> Result<Option<NaiveDateTime>, MetadataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let io_err = |source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    let mut reader = BufReader::new(file);

    let result = match ext.as_str() {
        "mp4" | "mov" => read_mvhd_creation_time(&mut reader, len),
        "mkv" => read_matroska_date(&mut reader, len),
        _ => return Ok(None),
    };

    result.map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => MetadataError::Container {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
        _ => io_err(e),
    })
}

#[derive(Debug, Clone, Copy)]
struct AtomRange {
    data_start: u64,
    data_end: u64,
}

fn invalid(reason: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, reason.to_string())
}

fn read_mvhd_creation_time<R: Read + Seek>(reader: &mut R, len: u64) -> std::io::Result<Option<NaiveDateTime>> {
    let Some(moov) = find_atom(reader, 0, len, *b"moov")? else {
        return Ok(None);
    };
    let Some(mvhd) = find_atom(reader, moov.data_start, moov.data_end, *b"mvhd")? else {
        return Ok(None);
    };

    reader.seek(SeekFrom::Start(mvhd.data_start))?;
    let mut ver_flags = [0u8; 4];
    reader.read_exact(&mut ver_flags)?;
    let qt_seconds = if ver_flags[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        u64::from_be_bytes(buf)
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        u32::from_be_bytes(buf) as u64
    };

    let Ok(qt_seconds) = i64::try_from(qt_seconds) else {
        return Ok(None);
    };
    Ok(DateTime::from_timestamp(qt_seconds - QT_TO_UNIX_OFFSET, 0).map(|dt| dt.naive_utc()))
}

fn find_atom<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    atom_type: [u8; 4],
) -> std::io::Result<Option<AtomRange>> {
    let mut offset = start;
    while offset + 8 <= end {
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let mut atom_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let atom_kind = [header[4], header[5], header[6], header[7]];
        let mut header_size = 8u64;

        if atom_size == 1 {
            let mut ext = [0u8; 8];
            reader.read_exact(&mut ext)?;
            atom_size = u64::from_be_bytes(ext);
            header_size = 16;
        } else if atom_size == 0 {
            // Extends to the end of the enclosing range
            atom_size = end - offset;
        }
        if atom_size < header_size {
            return Err(invalid("atom smaller than its header"));
        }
        if offset + header_size > end {
            return Err(invalid("atom header exceeds its parent"));
        }
        let atom_end = offset.saturating_add(atom_size).min(end);

        if atom_kind == atom_type {
            return Ok(Some(AtomRange {
                data_start: offset + header_size,
                data_end: atom_end,
            }));
        }
        offset = atom_end;
    }
    Ok(None)
}

/// EBML variable-length integer. Returns (value, length in bytes); for sizes the
/// marker bit is stripped, for IDs it is kept.
fn read_vint<R: Read>(reader: &mut R, keep_marker: bool) -> std::io::Result<(u64, u32)> {
    let mut first = [0u8; 1];
    reader.read_exact(&mut first)?;
    let width = first[0].leading_zeros() + 1;
    if width > 8 {
        return Err(invalid("invalid EBML vint"));
    }
    let mut value = if keep_marker {
        first[0] as u64
    } else {
        (first[0] as u64) & ((1u64 << (8 - width)) - 1)
    };
    for _ in 1..width {
        let mut b = [0u8; 1];
        reader.read_exact(&mut b)?;
        value = (value << 8) | b[0] as u64;
    }
    Ok((value, width))
}

/// An element size with every value bit set means "unknown size".
fn is_unknown_size(size: u64, width: u32) -> bool {
    size == (1u64 << (7 * width)) - 1
}

struct Element {
    id: u32,
    data_start: u64,
    data_end: u64,
}

fn next_element<R: Read + Seek>(reader: &mut R, offset: u64, end: u64) -> std::io::Result<Element> {
    reader.seek(SeekFrom::Start(offset))?;
    let (id, id_len) = read_vint(reader, true)?;
    let (size, size_len) = read_vint(reader, false)?;
    let data_start = offset + id_len as u64 + size_len as u64;
    if data_start > end {
        return Err(invalid("element header exceeds its parent"));
    }
    let data_end = if is_unknown_size(size, size_len) {
        end
    } else {
        data_start.saturating_add(size).min(end)
    };
    Ok(Element {
        id: id as u32,
        data_start,
        data_end,
    })
}

fn find_element<R: Read + Seek>(reader: &mut R, start: u64, end: u64, id: u32) -> std::io::Result<Option<Element>> {
    let mut offset = start;
    while offset < end {
        let element = next_element(reader, offset, end)?;
        if element.id == id {
            return Ok(Some(element));
        }
        if element.data_end <= offset {
            return Err(invalid("EBML element does not advance"));
        }
        offset = element.data_end;
    }
    Ok(None)
}

fn read_matroska_date<R: Read + Seek>(reader: &mut R, len: u64) -> std::io::Result<Option<NaiveDateTime>> {
    let header = next_element(reader, 0, len)?;
    if header.id != EBML_HEADER_ID {
        return Err(invalid("missing EBML header"));
    }
    let Some(segment) = find_element(reader, header.data_end, len, MKV_SEGMENT_ID)? else {
        return Ok(None);
    };
    let Some(info) = find_element(reader, segment.data_start, segment.data_end, MKV_INFO_ID)? else {
        return Ok(None);
    };
    let Some(date) = find_element(reader, info.data_start, info.data_end, MKV_DATE_UTC_ID)? else {
        return Ok(None);
    };
    if date.data_end - date.data_start != 8 {
        return Err(invalid("DateUTC is not 8 bytes"));
    }

    reader.seek(SeekFrom::Start(date.data_start))?;
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    let nanos = i64::from_be_bytes(buf);

    let Some(millennium) = NaiveDate::from_ymd_opt(2001, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return Ok(None);
    };
    Ok(millennium.checked_add_signed(TimeDelta::nanoseconds(nanos)))
}
