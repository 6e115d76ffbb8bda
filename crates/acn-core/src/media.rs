use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Extensions renamed as images (lowercase, without dot)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "webp"];

/// Extensions renamed as videos (lowercase, without dot)
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a filename by extension. Anything that is neither a known
    /// image nor video extension yields `None` and is left in place.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Where a resolved timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// Embedded capture metadata, accepted by the sanity check
    Metadata,
    /// Filesystem modification time
    Fallback,
}

/// Filename prefix encoding how trustworthy the timestamp is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `ACN_`: metadata-derived timestamp
    Primary,
    /// `ACNE_`: fallback timestamp
    Error,
}

impl Tag {
    pub const ALL: [Tag; 2] = [Tag::Primary, Tag::Error];

    pub fn for_source(source: TimestampSource) -> Self {
        match source {
            TimestampSource::Metadata => Tag::Primary,
            TimestampSource::Fallback => Tag::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Primary => "ACN_",
            Tag::Error => "ACNE_",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Tag::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media file with its derived timestamp, built per processed file.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub timestamp: NaiveDateTime,
    pub source: TimestampSource,
    pub tag: Tag,
}

impl MediaFile {
    pub fn new(path: PathBuf, kind: MediaKind, timestamp: NaiveDateTime, source: TimestampSource) -> Self {
        Self {
            path,
            kind,
            timestamp,
            source,
            tag: Tag::for_source(source),
        }
    }

    /// Original extension including the leading dot, or empty.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default()
    }
}
