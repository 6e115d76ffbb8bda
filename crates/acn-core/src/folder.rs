use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;

static EVENT_FOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} - ").unwrap());

/// Check if a folder name follows the `YYYY-MM-DD - <text>` event folder pattern.
/// Folders that don't match are never touched.
pub fn is_event_folder(name: &str) -> bool {
    EVENT_FOLDER_RE.is_match(name)
}

fn list_entries(dir: &Path, want_dir: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {:?}", dir))?
        .flatten()
        // fs::metadata follows symlinks; dangling links are dropped
        .filter(|e| {
            fs::metadata(e.path())
                .map(|m| if want_dir { m.is_dir() } else { m.is_file() })
                .unwrap_or(false)
        })
        .map(|e| e.path())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Regular files (or symlinks to them) directly inside `dir`, sorted by name.
pub fn list_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    list_entries(dir, false)
}

/// Event folders directly inside `dir`, sorted by name, as (name, path).
pub fn list_event_folders(dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    Ok(list_entries(dir, true)?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            if is_event_folder(&name) {
                Some((name, path))
            } else {
                tracing::debug!("Skipping non-event folder {:?}", path);
                None
            }
        })
        .collect())
}

pub fn is_empty_dir(dir: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}
