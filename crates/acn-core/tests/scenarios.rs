use std::fs;
use std::io::Cursor;
use std::path::Path;

use acn_core::{FileRenameLog, MemoryRenameLog, Normalizer};
use chrono::{Local, NaiveDate, NaiveDateTime};
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use tempfile::tempdir;

fn jpeg_with_date_time_original(value: &str) -> Vec<u8> {
    let field = Field {
        tag: Tag::DateTimeOriginal,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![value.as_bytes().to_vec()]),
    };
    let mut writer = Writer::new();
    writer.push_field(&field);
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// `moov/mvhd` (version 0) carrying `dt` as its creation time.
fn mp4_with_creation_time(dt: NaiveDateTime) -> Vec<u8> {
    fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out
    }
    let qt = (dt.and_utc().timestamp() + 2_082_844_800) as u32;
    let mut mvhd = vec![0u8, 0, 0, 0];
    mvhd.extend_from_slice(&qt.to_be_bytes());
    mvhd.extend_from_slice(&qt.to_be_bytes());
    mvhd.extend_from_slice(&1000u32.to_be_bytes());
    mvhd.extend_from_slice(&0u32.to_be_bytes());

    let mut out = atom(b"ftyp", b"isom\0\0\x02\0");
    out.extend(atom(b"moov", &atom(b"mvhd", &mvhd)));
    out
}

fn set_local_mtime(path: &Path, local: NaiveDateTime) {
    let ts = local.and_local_timezone(Local).single().unwrap().timestamp();
    filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(ts, 0)).unwrap();
}

fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
}

#[test]
fn exif_photos_with_identical_dates_get_counters() {
    let root = tempdir().unwrap();
    let src = root.path().join("in");
    let dest = root.path().join("out");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dest).unwrap();
    let exif = jpeg_with_date_time_original("2021:07:04 10:00:00");
    fs::write(src.join("first.jpg"), &exif).unwrap();
    fs::write(src.join("second.jpg"), &exif).unwrap();

    let mut log = MemoryRenameLog::new();
    let mut normalizer = Normalizer::new("jdoe", &mut log);
    let first = normalizer
        .rename_file(&src, "first.jpg", acn_core::MediaKind::Image, &dest)
        .unwrap()
        .unwrap();
    let second = normalizer
        .rename_file(&src, "second.jpg", acn_core::MediaKind::Image, &dest)
        .unwrap()
        .unwrap();

    assert_eq!(first, dest.join("ACN_2021_07_04_10_00_00_jdoe.jpg"));
    assert_eq!(second, dest.join("ACN_2021_07_04_10_00_00_jdoe_1.jpg"));
}

#[test]
fn video_without_metadata_uses_mtime_and_error_tag() {
    let root = tempdir().unwrap();
    let src = root.path().join("in");
    let dest = root.path().join("out");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dest).unwrap();
    let clip = src.join("clip.mov");
    fs::write(&clip, b"").unwrap();
    set_local_mtime(&clip, ymd_hms(2019, 1, 1, 0, 0, 0));

    let mut log = MemoryRenameLog::new();
    let renamed = Normalizer::new("asmith", &mut log)
        .rename_file(&src, "clip.mov", acn_core::MediaKind::Video, &dest)
        .unwrap()
        .unwrap();

    assert_eq!(renamed, dest.join("ACNE_2019_01_01_00_00_00_asmith.mov"));
}

#[test]
fn video_with_trusted_container_date_gets_primary_tag() {
    let root = tempdir().unwrap();
    let src = root.path().join("in");
    let dest = root.path().join("out");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&dest).unwrap();
    let clip = src.join("clip.mp4");
    fs::write(&clip, mp4_with_creation_time(ymd_hms(2022, 8, 14, 18, 30, 5))).unwrap();
    set_local_mtime(&clip, ymd_hms(2024, 1, 1, 0, 0, 0));

    let mut log = MemoryRenameLog::new();
    let renamed = Normalizer::new("asmith", &mut log)
        .rename_file(&src, "clip.mp4", acn_core::MediaKind::Video, &dest)
        .unwrap()
        .unwrap();

    assert_eq!(renamed, dest.join("ACN_2022_08_14_18_30_05_asmith.mp4"));
    assert_eq!(log.entries.len(), 1);
}

#[test]
fn full_batch_then_repair_only_touches_pre_2000_names() {
    let root = tempdir().unwrap();
    let authors = root.path().join("authors");
    let archive = root.path().join("archive");
    let event = authors.join("jdoe").join("2021-07-04 - Picnic");
    fs::create_dir_all(&event).unwrap();
    fs::write(event.join("a.jpg"), jpeg_with_date_time_original("2021:07:04 10:00:00")).unwrap();
    fs::write(event.join("b.jpg"), jpeg_with_date_time_original("1985:05:05 05:05:05")).unwrap();
    set_local_mtime(&event.join("b.jpg"), ymd_hms(2018, 8, 8, 8, 8, 8));
    fs::write(event.join("readme.md"), b"keep me").unwrap();

    let log_path = root.path().join("logs").join("renaming_log");
    let mut log = FileRenameLog::new(&log_path);
    let report = Normalizer::new("jdoe", &mut log)
        .manage_author_content(&authors, &archive)
        .unwrap();
    assert_eq!(report.renamed, 2);
    assert_eq!(report.left_in_place, 1);
    assert!(event.join("readme.md").exists());

    let out = archive.join("2021-07-04 - Picnic");
    assert!(out.join("ACN_2021_07_04_10_00_00_jdoe.jpg").exists());
    // Pre-2000 EXIF is rejected up front
    assert!(out.join("ACNE_2018_08_08_08_08_08_jdoe.jpg").exists());

    // Nothing produced by the current normalizer has a pre-2000 year
    let repaired = acn_core::repair_all(&archive, &mut log).unwrap();
    assert!(repaired.is_empty());

    let content = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(" - Log file created"));
    assert!(lines[1].starts_with('['));
    assert!(lines[1].contains("Renamed \""));
}

#[test]
fn legacy_pre_2000_names_are_repaired() {
    let root = tempdir().unwrap();
    let event = root.path().join("2005-06-07 - Old camera");
    fs::create_dir_all(&event).unwrap();
    let legacy = event.join("ACN_1980_01_01_00_00_00_jdoe_2.jpg");
    fs::write(&legacy, b"x").unwrap();
    set_local_mtime(&legacy, ymd_hms(2005, 6, 7, 12, 0, 0));

    let mut log = MemoryRenameLog::new();
    let repaired = acn_core::repair_all(root.path(), &mut log).unwrap();

    assert_eq!(repaired, vec![(legacy, event.join("ACNE_2005_06_07_12_00_00_jdoe.jpg"))]);
    assert_eq!(log.entries.len(), 1);
}
