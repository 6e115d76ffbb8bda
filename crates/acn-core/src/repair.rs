//! Fix-up for files named before the pre-2000 sanity check existed.
//!
//! Such files carry a year token below 2000 in their name (typically zeroed
//! camera clocks). They are renamed in place from their modification time with
//! the `ACNE_` tag.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::date::{self, MIN_TRUSTED_YEAR};
use crate::folder::{list_event_folders, list_files};
use crate::media::Tag;
use crate::naming::{build_filename, claim_unique_path, move_into_claim, parse_normalized_name};
use crate::rename_log::{RenameLog, RenameLogEntry};

/// Repair the pre-2000 names directly inside `dir`. Returns (old, new) per renamed file.
pub fn repair_dir<L: RenameLog + ?Sized>(dir: &Path, log: &mut L) -> anyhow::Result<Vec<(PathBuf, PathBuf)>> {
    let mut renamed = Vec::new();

    for path in list_files(dir)? {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let parsed = match parse_normalized_name(filename) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Skipping {:?}: {}", path, e);
                continue;
            }
        };
        if parsed.year >= MIN_TRUSTED_YEAR {
            continue;
        }

        let mtime = date::modification_time(&path)
            .with_context(|| format!("Failed to read modification time of {:?}", path))?;

        // Already carries its mtime-derived name (possibly with a counter)
        if build_filename(Tag::Error, &mtime, &parsed.author, &parsed.extension, parsed.counter) == filename {
            continue;
        }

        let dest = claim_unique_path(dir, Tag::Error, &mtime, &parsed.author, &parsed.extension)
            .with_context(|| format!("Failed to reserve a name in {:?}", dir))?;
        move_into_claim(&path, &dest).with_context(|| format!("Failed to rename {:?} → {:?}", path, dest))?;

        tracing::info!("Repaired {} → {}", path.display(), dest.display());
        log.record(RenameLogEntry::new(&path, &dest))?;
        renamed.push((path, dest));
    }

    Ok(renamed)
}

/// Repair every event folder directly under `root`.
pub fn repair_all<L: RenameLog + ?Sized>(root: &Path, log: &mut L) -> anyhow::Result<Vec<(PathBuf, PathBuf)>> {
    let mut renamed = Vec::new();
    for (_, path) in list_event_folders(root)? {
        renamed.extend(repair_dir(&path, &mut *log)?);
    }
    Ok(renamed)
}
