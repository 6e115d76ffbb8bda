use chrono::NaiveDateTime;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::NameParseError;
use crate::media::Tag;

const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

static NORMALIZED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<tag>ACNE?_)(?P<year>\d{4})_(?P<month>\d{2})_(?P<day>\d{2})_(?P<hour>\d{2})_(?P<minute>\d{2})_(?P<second>\d{2})_(?P<author>.+?)(?:_(?P<counter>\d+))?(?P<ext>\.[^._]*)?$",
    )
    .unwrap()
});

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// `<tag><YYYY_MM_DD_HH_MM_SS>_<author>[_<counter>]<ext>`, `ext` including its dot.
pub fn build_filename(tag: Tag, ts: &NaiveDateTime, author: &str, ext: &str, counter: Option<u32>) -> String {
    match counter {
        Some(n) => format!("{}{}_{}_{}{}", tag, format_timestamp(ts), author, n, ext),
        None => format!("{}{}_{}{}", tag, format_timestamp(ts), author, ext),
    }
}

/// Reserve a filename in `dir` that no other file uses, probing the base name
/// and then `_1`, `_2`, ... in order.
///
/// The winning name is claimed with an atomic create-if-absent, leaving an
/// empty placeholder that the caller replaces with `fs::rename`. Two cooperating
/// writers can therefore never pick the same name. A foreign process replacing
/// the placeholder before the rename is still overwritten.
pub fn claim_unique_path(dir: &Path, tag: Tag, ts: &NaiveDateTime, author: &str, ext: &str) -> io::Result<PathBuf> {
    let mut counter = None;
    loop {
        let candidate = dir.join(build_filename(tag, ts, author, ext, counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                counter = Some(counter.map_or(1, |n| n + 1));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Move `src` onto a path previously returned by [`claim_unique_path`].
/// On failure the placeholder is released.
pub fn move_into_claim(src: &Path, claimed: &Path) -> io::Result<()> {
    if let Err(e) = fs::rename(src, claimed) {
        fs::remove_file(claimed).ok();
        return Err(e);
    }
    Ok(())
}

/// Fields of a filename produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub tag: Tag,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub author: String,
    pub counter: Option<u32>,
    /// Extension including its dot, or empty
    pub extension: String,
}

/// Parse a normalized filename.
///
/// A trailing `_<digits>` group before the extension is always read as a
/// collision counter, so an author whose own name ends in `_<digits>` is misread.
pub fn parse_normalized_name(name: &str) -> Result<NormalizedName, NameParseError> {
    let caps = NORMALIZED_NAME_RE
        .captures(name)
        .ok_or_else(|| NameParseError::NoMatch(name.to_string()))?;

    let number = |field: &'static str| -> Result<u32, NameParseError> {
        caps[field].parse().map_err(|_| NameParseError::InvalidNumber {
            name: name.to_string(),
            field,
        })
    };

    let tag = Tag::parse(&caps["tag"]).ok_or_else(|| NameParseError::NoMatch(name.to_string()))?;
    let counter = match caps.name("counter") {
        Some(_) => Some(number("counter")?),
        None => None,
    };

    Ok(NormalizedName {
        tag,
        year: number("year")? as i32,
        month: number("month")?,
        day: number("day")?,
        hour: number("hour")?,
        minute: number("minute")?,
        second: number("second")?,
        author: caps["author"].to_string(),
        counter,
        extension: caps.name("ext").map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 7, 4).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    #[test]
    fn test_build_filename() {
        assert_eq!(
            build_filename(Tag::Primary, &ts(), "jdoe", ".jpg", None),
            "ACN_2021_07_04_10_00_00_jdoe.jpg"
        );
        assert_eq!(
            build_filename(Tag::Error, &ts(), "jdoe", ".JPG", Some(3)),
            "ACNE_2021_07_04_10_00_00_jdoe_3.JPG"
        );
        assert_eq!(
            build_filename(Tag::Primary, &ts(), "jdoe", "", None),
            "ACN_2021_07_04_10_00_00_jdoe"
        );
    }

    #[test]
    fn test_claim_probes_counters() {
        let dir = tempdir().unwrap();
        let first = claim_unique_path(dir.path(), Tag::Primary, &ts(), "jdoe", ".jpg").unwrap();
        let second = claim_unique_path(dir.path(), Tag::Primary, &ts(), "jdoe", ".jpg").unwrap();
        let third = claim_unique_path(dir.path(), Tag::Primary, &ts(), "jdoe", ".jpg").unwrap();

        assert_eq!(first.file_name().unwrap(), "ACN_2021_07_04_10_00_00_jdoe.jpg");
        assert_eq!(second.file_name().unwrap(), "ACN_2021_07_04_10_00_00_jdoe_1.jpg");
        assert_eq!(third.file_name().unwrap(), "ACN_2021_07_04_10_00_00_jdoe_2.jpg");
        assert!(first.exists() && second.exists() && third.exists());
    }

    #[test]
    fn test_claim_skips_existing_counter_gap() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ACN_2021_07_04_10_00_00_jdoe.jpg"), b"x").unwrap();
        fs::write(dir.path().join("ACN_2021_07_04_10_00_00_jdoe_1.jpg"), b"x").unwrap();

        let claimed = claim_unique_path(dir.path(), Tag::Primary, &ts(), "jdoe", ".jpg").unwrap();
        assert_eq!(claimed.file_name().unwrap(), "ACN_2021_07_04_10_00_00_jdoe_2.jpg");
    }

    #[test]
    fn test_move_into_claim_replaces_placeholder() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("IMG_1.jpg");
        fs::write(&src, b"pixels").unwrap();
        let claimed = claim_unique_path(dir.path(), Tag::Primary, &ts(), "jdoe", ".jpg").unwrap();

        move_into_claim(&src, &claimed).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&claimed).unwrap(), b"pixels");
    }

    #[test]
    fn test_failed_move_releases_claim() {
        let dir = tempdir().unwrap();
        let claimed = claim_unique_path(dir.path(), Tag::Primary, &ts(), "jdoe", ".jpg").unwrap();

        assert!(move_into_claim(&dir.path().join("missing.jpg"), &claimed).is_err());
        assert!(!claimed.exists());
    }

    #[test]
    fn test_parse_plain_name() {
        let parsed = parse_normalized_name("ACN_2021_07_04_10_00_00_jdoe.jpg").unwrap();
        assert_eq!(parsed.tag, Tag::Primary);
        assert_eq!(parsed.year, 2021);
        assert_eq!((parsed.month, parsed.day), (7, 4));
        assert_eq!(parsed.author, "jdoe");
        assert_eq!(parsed.counter, None);
        assert_eq!(parsed.extension, ".jpg");
    }

    #[test]
    fn test_parse_counter_and_error_tag() {
        let parsed = parse_normalized_name("ACNE_1970_01_01_00_00_00_asmith_12.MOV").unwrap();
        assert_eq!(parsed.tag, Tag::Error);
        assert_eq!(parsed.year, 1970);
        assert_eq!(parsed.author, "asmith");
        assert_eq!(parsed.counter, Some(12));
        assert_eq!(parsed.extension, ".MOV");
    }

    #[test]
    fn test_parse_author_with_underscore() {
        let parsed = parse_normalized_name("ACN_2021_07_04_10_00_00_j_doe_1.jpg").unwrap();
        assert_eq!(parsed.author, "j_doe");
        assert_eq!(parsed.counter, Some(1));
    }

    #[test]
    fn test_parse_numeric_author() {
        let parsed = parse_normalized_name("ACN_2021_07_04_10_00_00_1234.jpg").unwrap();
        assert_eq!(parsed.author, "1234");
        assert_eq!(parsed.counter, None);
    }

    #[test]
    fn test_parse_rejects_other_names() {
        assert!(matches!(
            parse_normalized_name("IMG_20210704_100000.jpg"),
            Err(NameParseError::NoMatch(_))
        ));
        assert!(parse_normalized_name("ACN_2021_07_04_jdoe.jpg").is_err());
        assert!(parse_normalized_name("xACN_2021_07_04_10_00_00_jdoe.jpg").is_err());
    }

    #[test]
    fn test_build_parse_agree() {
        let name = build_filename(Tag::Error, &ts(), "asmith", ".mp4", Some(2));
        let parsed = parse_normalized_name(&name).unwrap();
        assert_eq!(parsed.tag, Tag::Error);
        assert_eq!(parsed.author, "asmith");
        assert_eq!(parsed.counter, Some(2));
        assert_eq!(parsed.extension, ".mp4");
    }
}
