use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::decode_capture;
use crate::export::{ExportOptions, export_csv, output_path_for};
use crate::format::DecodeOptions;
use crate::source::{CaptureEvent, CaptureSource, SourceError};

/// What to do after a file fails to decode or export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next file.
    #[default]
    Continue,
    /// Stop the batch at the first failed file.
    Abort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    pub decode: DecodeOptions,
    pub export: ExportOptions,
    pub policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Exported {
        output: PathBuf,
        rows: usize,
        columns: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

/// Per-file results in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub options: BatchOptions,
    pub files: Vec<FileOutcome>,
    /// Set when `FailurePolicy::Abort` stopped the batch early.
    pub aborted: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files.len() - self.failed()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|file| file.is_failure()).count()
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Decode every capture from `source` and export each one as CSV into
/// `output_dir`.
///
/// `on_outcome` is called after each file so callers can report progress.
/// Read, decode and export failures are recorded per file and handled by
/// the failure policy; other source errors end the batch.
///
/// # Errors
/// `BatchError::Source` when the source fails for a reason not tied to a
/// single file, such as listing a directory.
pub fn run_batch<S, F>(
    mut source: S,
    output_dir: &Path,
    options: &BatchOptions,
    mut on_outcome: F,
) -> Result<BatchReport, BatchError>
where
    S: CaptureSource,
    F: FnMut(&FileOutcome),
{
    let mut report = BatchReport {
        options: *options,
        ..BatchReport::default()
    };

    loop {
        let outcome = match source.next_capture() {
            Ok(Some(event)) => process_one(event, output_dir, options),
            Ok(None) => break,
            Err(SourceError::Read { path, source: err }) => {
                warn!("{}: {err}", path.display());
                FileOutcome {
                    input: path,
                    status: FileStatus::Failed {
                        error: format!("read failed: {err}"),
                    },
                }
            }
            Err(err) => return Err(err.into()),
        };
        on_outcome(&outcome);
        let failed = outcome.is_failure();
        report.files.push(outcome);
        if failed && options.policy == FailurePolicy::Abort {
            report.aborted = true;
            break;
        }
    }

    info!(
        "batch finished: {} exported, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

fn process_one(event: CaptureEvent, output_dir: &Path, options: &BatchOptions) -> FileOutcome {
    let CaptureEvent { path, bytes } = event;
    info!("decoding {} ({} bytes)", path.display(), bytes.len());

    let status = match decode_capture(&bytes, &options.decode) {
        Ok(capture) => {
            let output = output_path_for(&path, output_dir);
            match export_csv(&output, &capture, &options.export) {
                Ok(()) => FileStatus::Exported {
                    output,
                    rows: capture.records.len(),
                    columns: capture.width(),
                },
                Err(err) => FileStatus::Failed {
                    error: format!("export to {} failed: {err}", output.display()),
                },
            }
        }
        Err(err) => FileStatus::Failed {
            error: err.to_string(),
        },
    };

    if let FileStatus::Failed { error } = &status {
        warn!("{}: {error}", path.display());
    }
    FileOutcome {
        input: path,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchOptions, FailurePolicy, FileStatus, run_batch};
    use crate::source::{CaptureEvent, CaptureSource, SourceError};
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct MemorySource {
        events: VecDeque<Result<CaptureEvent, SourceError>>,
    }

    impl MemorySource {
        fn new(files: &[(&str, Vec<u8>)]) -> Self {
            Self {
                events: files
                    .iter()
                    .map(|(name, bytes)| {
                        Ok(CaptureEvent {
                            path: PathBuf::from(name),
                            bytes: bytes.clone(),
                        })
                    })
                    .collect(),
            }
        }
    }

    impl CaptureSource for MemorySource {
        fn next_capture(&mut self) -> Result<Option<CaptureEvent>, SourceError> {
            self.events.pop_front().transpose()
        }
    }

    // Parameter table holding one header with a bad leading field.
    fn broken_capture() -> Vec<u8> {
        let mut bytes = vec![0x00, 0x00, 0x10, 0x00, 0x02, 0x00];
        bytes.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn continues_past_failed_file() {
        let temp = TempDir::new().expect("tempdir");
        let source = MemorySource::new(&[
            ("in/bad.TC", broken_capture()),
            ("in/empty.TC", Vec::new()),
        ]);
        let mut seen = Vec::new();
        let report = run_batch(source, temp.path(), &BatchOptions::default(), |outcome| {
            seen.push(outcome.input.clone())
        })
        .unwrap();

        assert_eq!(seen.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        assert!(!report.aborted);
        match &report.files[1].status {
            FileStatus::Exported { output, rows, .. } => {
                assert_eq!(*rows, 0);
                assert!(output.ends_with("empty.csv"));
                assert!(output.exists());
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let temp = TempDir::new().expect("tempdir");
        let source = MemorySource::new(&[
            ("in/bad.TC", broken_capture()),
            ("in/empty.TC", Vec::new()),
        ]);
        let options = BatchOptions {
            policy: FailurePolicy::Abort,
            ..BatchOptions::default()
        };
        let report = run_batch(source, temp.path(), &options, |_| {}).unwrap();
        assert_eq!(report.files.len(), 1);
        assert!(report.aborted);
    }

    #[test]
    fn report_serializes_status_inline() {
        let temp = TempDir::new().expect("tempdir");
        let source = MemorySource::new(&[("in/bad.TC", broken_capture())]);
        let report = run_batch(source, temp.path(), &BatchOptions::default(), |_| {}).unwrap();
        let value = serde_json::to_value(&report).expect("report json");
        let file = &value["files"][0];
        assert_eq!(file["status"], "failed");
        assert!(
            file["error"]
                .as_str()
                .unwrap()
                .contains("leading field must be 0")
        );
    }

    #[test]
    fn unreadable_file_is_recorded_and_batch_continues() {
        let temp = TempDir::new().expect("tempdir");
        let source = MemorySource {
            events: VecDeque::from(vec![
                Err(SourceError::Read {
                    path: PathBuf::from("in/locked.TC"),
                    source: std::io::Error::other("permission denied"),
                }),
                Ok(CaptureEvent {
                    path: PathBuf::from("in/empty.TC"),
                    bytes: Vec::new(),
                }),
            ]),
        };
        let report = run_batch(source, temp.path(), &BatchOptions::default(), |_| {}).unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].input, PathBuf::from("in/locked.TC"));
        match &report.files[0].status {
            FileStatus::Failed { error } => assert!(error.contains("permission denied")),
            other => panic!("unexpected status: {other:?}"),
        }
        assert!(!report.files[1].is_failure());
        assert!(temp.path().join("empty.csv").exists());
    }

    #[test]
    fn unreadable_file_aborts_under_abort_policy() {
        let temp = TempDir::new().expect("tempdir");
        let source = MemorySource {
            events: VecDeque::from(vec![
                Err(SourceError::Read {
                    path: PathBuf::from("in/locked.TC"),
                    source: std::io::Error::other("permission denied"),
                }),
                Ok(CaptureEvent {
                    path: PathBuf::from("in/empty.TC"),
                    bytes: Vec::new(),
                }),
            ]),
        };
        let options = BatchOptions {
            policy: FailurePolicy::Abort,
            ..BatchOptions::default()
        };
        let report = run_batch(source, temp.path(), &options, |_| {}).unwrap();
        assert_eq!(report.files.len(), 1);
        assert!(report.aborted);
    }

    #[test]
    fn source_error_ends_batch() {
        let temp = TempDir::new().expect("tempdir");
        let source = MemorySource {
            events: VecDeque::from(vec![Err(SourceError::Io(std::io::Error::other("gone")))]),
        };
        let err = run_batch(source, temp.path(), &BatchOptions::default(), |_| {}).unwrap_err();
        assert!(err.to_string().contains("gone"));
    }
}
