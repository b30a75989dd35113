use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::error::{DecodeError, SectionKind};
use crate::format::reader::SectionHeader;
use crate::format::{
    DecodeOptions, Section, build_column_labels, decode_measurement_matrix,
    decode_parameter_table, decode_variable_unit_index, locate_sections,
};

/// Labels and records of one decoded capture, as handed to the exporter.
///
/// # Examples
/// ```
/// use tcdecode_core::DecodedCapture;
///
/// let capture = DecodedCapture {
///     labels: vec!["Temp (degC)".to_string()],
///     records: vec![vec!["21.5".to_string()]],
/// };
/// assert_eq!(capture.width(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedCapture {
    pub labels: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl DecodedCapture {
    pub fn width(&self) -> usize {
        self.labels.len()
    }
}

/// Placement and header of one section, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub kind: SectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_offset: Option<usize>,
    pub start: usize,
    pub len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<SectionHeader>,
}

impl SectionSummary {
    fn new(section: &Section<'_>, header: Option<SectionHeader>) -> Self {
        Self {
            kind: section.kind,
            marker_offset: section.marker,
            start: section.start,
            len: section.len(),
            header,
        }
    }
}

/// Decoded capture plus the section layout it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureInspection {
    pub capture_bytes: usize,
    pub options: DecodeOptions,
    pub sections: Vec<SectionSummary>,
    pub missing_sections: Vec<SectionKind>,
    pub parameter_count: usize,
    pub discarded_trailing_bytes: usize,
    pub capture: DecodedCapture,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Decode a capture buffer into labels and records.
///
/// # Examples
/// ```
/// use tcdecode_core::{DecodeOptions, decode_capture};
///
/// // No markers: every section is empty and nothing is decoded.
/// let capture = decode_capture(&[0x01, 0x02], &DecodeOptions::default())?;
/// assert!(capture.labels.is_empty());
/// assert!(capture.records.is_empty());
/// # Ok::<(), tcdecode_core::DecodeError>(())
/// ```
///
/// # Errors
/// The first `DecodeError` raised by any stage; no partial output is
/// returned.
pub fn decode_capture(
    capture: &[u8],
    options: &DecodeOptions,
) -> Result<DecodedCapture, DecodeError> {
    inspect_capture(capture, options).map(|inspection| inspection.capture)
}

/// Run the full pipeline and keep the section layout alongside the result.
pub fn inspect_capture(
    capture: &[u8],
    options: &DecodeOptions,
) -> Result<CaptureInspection, DecodeError> {
    debug!("decoding capture of {} bytes", capture.len());
    let sections = locate_sections(capture, options)?;

    let (table_header, table) = decode_parameter_table(&sections.parameter_table)?;
    let (index_header, index) = decode_variable_unit_index(&sections.variable_unit_index)?;
    let labels = build_column_labels(&table, &index)?;
    let (matrix_header, matrix) =
        decode_measurement_matrix(&sections.measurement_matrix, &table, labels.len(), options)?;

    Ok(CaptureInspection {
        capture_bytes: capture.len(),
        options: *options,
        sections: vec![
            SectionSummary::new(&sections.variable_unit_index, index_header),
            SectionSummary::new(&sections.measurement_matrix, matrix_header),
            SectionSummary::new(&sections.parameter_table, table_header),
        ],
        missing_sections: sections.missing(),
        parameter_count: table.len(),
        discarded_trailing_bytes: matrix.discarded_bytes,
        capture: DecodedCapture {
            labels,
            records: matrix.records,
        },
    })
}

/// Read a capture file and decode it.
pub fn decode_capture_file(
    path: &Path,
    options: &DecodeOptions,
) -> Result<DecodedCapture, CaptureError> {
    let bytes = std::fs::read(path)?;
    Ok(decode_capture(&bytes, options)?)
}
