mod files;

pub use files::{CAPTURE_EXTENSION, CaptureFiles};

use std::path::PathBuf;

use thiserror::Error;

/// Raw contents of one capture file.
#[derive(Debug, Clone)]
pub struct CaptureEvent {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Anything that yields capture files one at a time.
pub trait CaptureSource {
    fn next_capture(&mut self) -> Result<Option<CaptureEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}
