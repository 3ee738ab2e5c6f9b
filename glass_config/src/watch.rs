use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub(crate) fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Identity of the config file, captured as its modification time.
///
/// A file that cannot be stat'ed (briefly missing during an editor's
/// atomic save, for instance) reads as unchanged.
#[derive(Debug, Clone)]
pub struct ConfigWatch {
    path: PathBuf,
    seen: Option<SystemTime>,
}

impl ConfigWatch {
    /// Start watching `path`, taking its current modification time as the baseline.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let seen = modified(&path);
        Self { path, seen }
    }

    /// Start watching with a baseline captured earlier (e.g. when the file was read).
    pub fn with_baseline(path: impl Into<PathBuf>, seen: Option<SystemTime>) -> Self {
        Self {
            path: path.into(),
            seen,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file's modification time differs from the baseline.
    pub fn has_changed(&self) -> bool {
        match modified(&self.path) {
            Some(now) => Some(now) != self.seen,
            None => false,
        }
    }

    /// Like `has_changed`, but adopts the new modification time as baseline.
    pub fn take_change(&mut self) -> bool {
        match modified(&self.path) {
            Some(now) if Some(now) != self.seen => {
                self.seen = Some(now);
                true
            }
            _ => false,
        }
    }
}
