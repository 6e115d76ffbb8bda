use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::date;
use crate::folder::{is_empty_dir, is_event_folder, list_event_folders, list_files};
use crate::media::{MediaFile, MediaKind};
use crate::naming::{claim_unique_path, move_into_claim};
use crate::rename_log::{RenameLog, RenameLogEntry};
use crate::{ProgressCallback, ThrottledProgress};

/// Counters for one or more processed event folders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderReport {
    pub renamed: u64,
    /// Files that are neither a known image nor video
    pub left_in_place: u64,
    /// Source event folders removed because they ended up empty
    pub removed_folders: u64,
}

impl FolderReport {
    pub fn merge(&mut self, other: FolderReport) {
        self.renamed += other.renamed;
        self.left_in_place += other.left_in_place;
        self.removed_folders += other.removed_folders;
    }
}

/// Renames an author's media into the archive, recording every rename in `log`.
pub struct Normalizer<'a, L: RenameLog> {
    author: String,
    log: &'a mut L,
    progress: Option<ThrottledProgress<'a>>,
}

impl<'a, L: RenameLog> Normalizer<'a, L> {
    pub fn new(author: impl Into<String>, log: &'a mut L) -> Self {
        Self {
            author: author.into(),
            log,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: &'a ProgressCallback<'a>) -> Self {
        self.progress = Some(ThrottledProgress::new(callback));
        self
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Rename one file from `src_dir` into `dest_dir`.
    ///
    /// Returns the new path, or `None` when the source doesn't exist.
    pub fn rename_file(
        &mut self,
        src_dir: &Path,
        filename: &str,
        kind: MediaKind,
        dest_dir: &Path,
    ) -> anyhow::Result<Option<PathBuf>> {
        let src = src_dir.join(filename);
        if !src.exists() {
            tracing::warn!("File {} does not exist!", src.display());
            return Ok(None);
        }

        let resolved = date::resolve(&src, kind)
            .with_context(|| format!("Failed to read modification time of {:?}", src))?;
        let media = MediaFile::new(src, kind, resolved.date, resolved.source);

        let dest = claim_unique_path(dest_dir, media.tag, &media.timestamp, &self.author, &media.extension())
            .with_context(|| format!("Failed to reserve a name in {:?}", dest_dir))?;
        move_into_claim(&media.path, &dest)
            .with_context(|| format!("Failed to rename {:?} → {:?}", media.path, dest))?;

        tracing::info!("Renamed {} → {}", media.path.display(), dest.display());
        self.log.record(RenameLogEntry::new(&media.path, &dest))?;
        Ok(Some(dest))
    }

    /// Process every media file in `<src_parent>/<folder_name>` into
    /// `<dest_parent>/<folder_name>`. Non-media files stay where they are; the
    /// source folder is removed once it is empty.
    ///
    /// Filenames that are not valid UTF-8 can't carry an author into a new name
    /// and are counted as `left_in_place` with a warning instead of renamed.
    pub fn manage_event_folder(
        &mut self,
        folder_name: &str,
        src_parent: &Path,
        dest_parent: &Path,
    ) -> anyhow::Result<FolderReport> {
        let mut report = FolderReport::default();

        if !is_event_folder(folder_name) {
            tracing::warn!("Folder {:?} is not an event folder, leaving it untouched", folder_name);
            return Ok(report);
        }

        let src_folder = src_parent.join(folder_name);
        let dest_folder = dest_parent.join(folder_name);

        if !src_folder.exists() {
            tracing::warn!("Folder {} does not exist!", src_folder.display());
            return Ok(report);
        }

        fs::create_dir_all(&dest_folder)
            .with_context(|| format!("Failed to create directory {:?}", dest_folder))?;

        let files = list_files(&src_folder)?;
        let total = files.len() as u64;

        for (i, path) in files.iter().enumerate() {
            if let Some(progress) = &self.progress {
                progress.report("rename", i as u64, total, folder_name);
            }

            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!("Skipping non UTF-8 filename {:?}", path);
                report.left_in_place += 1;
                continue;
            };

            match MediaKind::from_filename(filename) {
                Some(kind) => {
                    if self.rename_file(&src_folder, filename, kind, &dest_folder)?.is_some() {
                        report.renamed += 1;
                    }
                }
                None => {
                    tracing::debug!("Leaving non-media file {:?} in place", path);
                    report.left_in_place += 1;
                }
            }
        }

        if is_empty_dir(&src_folder)? {
            fs::remove_dir(&src_folder)
                .with_context(|| format!("Failed to remove empty folder {:?}", src_folder))?;
            report.removed_folders += 1;
        }

        Ok(report)
    }

    /// Process every event folder of `<authors_root>/<author>` into `archive_root`.
    pub fn manage_author_content(&mut self, authors_root: &Path, archive_root: &Path) -> anyhow::Result<FolderReport> {
        let mut report = FolderReport::default();

        let author_path = authors_root.join(&self.author);
        if !author_path.exists() {
            tracing::warn!("Author folder {} does not exist!", author_path.display());
            return Ok(report);
        }

        for (name, _) in list_event_folders(&author_path)? {
            let folder_report = self.manage_event_folder(&name, &author_path, archive_root)?;
            report.merge(folder_report);
        }

        Ok(report)
    }
}

/// Remove the empty event folders of `<authors_root>/<author>`, returning what was removed.
pub fn clear_empty_folders(author: &str, authors_root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let author_path = authors_root.join(author);
    if !author_path.exists() {
        tracing::warn!("Author folder {} does not exist!", author_path.display());
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for (_, path) in list_event_folders(&author_path)? {
        if is_empty_dir(&path)? {
            tracing::info!("Folder {} is empty, deleting...", path.display());
            fs::remove_dir(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            removed.push(path);
        }
    }
    Ok(removed)
}
