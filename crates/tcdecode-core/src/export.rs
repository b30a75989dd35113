use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DecodedCapture;

/// Header of the leading row-number column.
pub const ROW_NUMBER_HEADER: &str = "Measurement #";
/// Extension of exported files.
pub const EXPORT_EXTENSION: &str = "csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write a header row and one numbered row per record.
///
/// # Examples
/// ```
/// use tcdecode_core::{DecodedCapture, ExportOptions, write_csv};
///
/// let capture = DecodedCapture {
///     labels: vec!["Temp (degC)".to_string()],
///     records: vec![vec!["21.5".to_string()], vec![String::new()]],
/// };
/// let mut out = Vec::new();
/// write_csv(&mut out, &capture, &ExportOptions::default())?;
/// let text = String::from_utf8(out).unwrap();
/// assert_eq!(text, "Measurement #,Temp (degC)\n1,21.5\n2,\n");
/// # Ok::<(), tcdecode_core::ExportError>(())
/// ```
pub fn write_csv<W: Write>(
    writer: W,
    capture: &DecodedCapture,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let mut wtr = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    wtr.write_record(
        std::iter::once(ROW_NUMBER_HEADER).chain(capture.labels.iter().map(String::as_str)),
    )?;
    for (idx, record) in capture.records.iter().enumerate() {
        let number = (idx + 1).to_string();
        wtr.write_record(
            std::iter::once(number.as_str()).chain(record.iter().map(String::as_str)),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a capture to `path`, creating parent directories as needed.
pub fn export_csv(
    path: &Path,
    capture: &DecodedCapture,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_csv(file, capture, options)
}

/// Map `dir/name.TC` to `output_dir/name.csv`.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use tcdecode_core::output_path_for;
///
/// let out = output_path_for(Path::new("input/run1.TC"), Path::new("output"));
/// assert_eq!(out, Path::new("output/run1.csv"));
/// ```
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    // Only the capture extension is replaced; dots inside the stem are kept.
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".");
    name.push(EXPORT_EXTENSION);
    output_dir.join(name)
}
