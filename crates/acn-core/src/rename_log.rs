use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};

/// C `ctime()` layout, e.g. `Sun Jul  4 10:00:00 2021`
const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// One performed rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameLogEntry {
    pub at: DateTime<Local>,
    pub old: PathBuf,
    pub new: PathBuf,
}

impl RenameLogEntry {
    pub fn new(old: &Path, new: &Path) -> Self {
        Self {
            at: Local::now(),
            old: old.to_path_buf(),
            new: new.to_path_buf(),
        }
    }

    /// `[<ctime>] Renamed "<old>" to "<new>"`
    pub fn to_line(&self) -> String {
        format!(
            "[{}] Renamed \"{}\" to \"{}\"",
            self.at.format(CTIME_FORMAT),
            self.old.display(),
            self.new.display()
        )
    }
}

/// Sink for the rename audit trail, passed explicitly into the renaming operations.
pub trait RenameLog {
    fn record(&mut self, entry: RenameLogEntry) -> anyhow::Result<()>;
}

/// Append-only plain-text log file. Created with a header line on first write;
/// never truncated or rotated.
#[derive(Debug, Clone)]
pub struct FileRenameLog {
    path: PathBuf,
}

impl FileRenameLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenameLog for FileRenameLog {
    fn record(&mut self, entry: RenameLogEntry) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {:?}", parent))?;
        }

        // create_new decides atomically who writes the header
        match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(mut file) => {
                writeln!(file, "{} - Log file created", entry.at.format(CTIME_FORMAT))?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create log file {:?}", self.path));
            }
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file {:?}", self.path))?;
        writeln!(file, "{}", entry.to_line())?;
        Ok(())
    }
}

/// Keeps entries in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryRenameLog {
    pub entries: Vec<RenameLogEntry>,
}

impl MemoryRenameLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenameLog for MemoryRenameLog {
    fn record(&mut self, entry: RenameLogEntry) -> anyhow::Result<()> {
        self.entries.push(entry);
        Ok(())
    }
}
