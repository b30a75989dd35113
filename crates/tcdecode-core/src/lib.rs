//! tcdecode core library for `.TC` capture files.
//!
//! A capture file holds three marker-delimited sections: a variable/unit
//! index, a measurement matrix and a parameter (string) table. Decoding runs
//! as a strictly linear pipeline over an in-memory buffer:
//! sections -> parameter table -> variable/unit index -> column labels ->
//! measurement matrix. Every stage is a pure function in `format`; all file
//! access lives in `source` (discovery and loading) and `export` (CSV).
//!
//! Invariants:
//! - Decoding the same bytes twice yields identical labels and records.
//! - Indices read from the file are 1-based, with `0` meaning "no value";
//!   only [`ParameterTable`] translates them.
//! - A stage failure aborts the decode of that file; no partial output.
//!
//! Two situations are lenient by default: a missing marker leaves its
//! section empty, and an undersized tail in the measurement matrix is
//! dropped. [`DecodeOptions`] turns either into an error.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use tcdecode_core::{DecodeOptions, decode_capture_file};
//!
//! let capture = decode_capture_file(Path::new("input/run1.TC"), &DecodeOptions::default())?;
//! println!("{} columns, {} rows", capture.width(), capture.records.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod batch;
mod capture;
mod export;
pub mod format;
mod source;
mod summary;

pub use batch::{
    BatchError, BatchOptions, BatchReport, FailurePolicy, FileOutcome, FileStatus, run_batch,
};
pub use capture::{
    CaptureError, CaptureInspection, DecodedCapture, SectionSummary, decode_capture,
    decode_capture_file, inspect_capture,
};
pub use export::{
    EXPORT_EXTENSION, ExportError, ExportOptions, ROW_NUMBER_HEADER, export_csv,
    output_path_for, write_csv,
};
pub use format::error::{DecodeError, SectionKind};
pub use format::reader::SectionHeader;
pub use format::{DecodeOptions, MeasurementRecord, ParameterTable, VariableUnitIndex};
pub use source::{CAPTURE_EXTENSION, CaptureEvent, CaptureFiles, CaptureSource, SourceError};
pub use summary::{
    ColumnSummary, RowRange, Summary, SummaryError, summarize_csv, summarize_csv_file,
};
