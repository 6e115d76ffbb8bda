pub mod config;
pub mod date;
pub mod dedup;
pub mod error;
pub mod folder;
pub mod media;
pub mod naming;
pub mod normalize;
pub mod rename_log;
pub mod repair;

use std::cell::Cell;
use std::time::{Duration, Instant};

pub use config::Config;
pub use dedup::{find_duplicates, DuplicatePair, Fingerprinter, PerceptualHasher};
pub use media::{MediaFile, MediaKind, Tag, TimestampSource};
pub use normalize::{clear_empty_folders, FolderReport, Normalizer};
pub use rename_log::{FileRenameLog, MemoryRenameLog, RenameLog, RenameLogEntry};
pub use repair::{repair_all, repair_dir};

/// Type alias for progress callback: (stage, current, total, message)
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + 'a;

/// Throttled progress reporter: emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Cell<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Cell::new(Instant::now() - Duration::from_secs(1)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            if self.last_emit.get().elapsed().as_millis() < 200 {
                return;
            }
            self.last_emit.set(Instant::now());
        }
        (self.inner)(stage, current, total, message);
    }
}
