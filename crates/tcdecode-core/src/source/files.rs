use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use log::debug;

use super::{CaptureEvent, CaptureSource, SourceError};

/// Default capture file extension, matched case-insensitively.
pub const CAPTURE_EXTENSION: &str = "TC";

/// Capture files read from disk in sorted path order.
///
/// Files are only read when handed out, so a large directory does not have
/// to fit in memory at once.
#[derive(Debug, Clone, Default)]
pub struct CaptureFiles {
    pending: VecDeque<PathBuf>,
}

impl CaptureFiles {
    /// Every regular file in `dir` whose extension matches `extension`.
    pub fn from_dir(dir: &Path, extension: &str) -> Result<Self, SourceError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, extension) {
                paths.push(path);
            }
        }
        debug!("{} capture files in {}", paths.len(), dir.display());
        Ok(Self::from_paths(paths))
    }

    /// Every regular file matching a glob pattern.
    pub fn from_pattern(pattern: &str) -> Result<Self, SourceError> {
        let entries = glob(pattern).map_err(|err| SourceError::Pattern {
            pattern: pattern.to_string(),
            message: err.msg.to_string(),
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| SourceError::Io(err.into_error()))?;
            if path.is_file() {
                paths.push(path);
            }
        }
        debug!("{} capture files match '{pattern}'", paths.len());
        Ok(Self::from_paths(paths))
    }

    pub fn from_paths(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        paths.dedup();
        Self {
            pending: paths.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.pending.iter().map(PathBuf::as_path)
    }
}

impl CaptureSource for CaptureFiles {
    fn next_capture(&mut self) -> Result<Option<CaptureEvent>, SourceError> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let bytes = fs::read(&path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Some(CaptureEvent { path, bytes }))
    }
}

/// Check a path's extension, ignoring ASCII case.
///
/// # Examples
/// This helper is part of an internal module, so the example is marked as
/// text example.
/// ```text
/// use std::path::Path;
///
/// assert!(has_extension(Path::new("run1.tc"), "TC"));
/// assert!(!has_extension(Path::new("run1.csv"), "TC"));
/// ```
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
