use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three delimited regions of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    VariableUnitIndex,
    MeasurementMatrix,
    ParameterTable,
}

impl SectionKind {
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::VariableUnitIndex => "variable/unit index",
            SectionKind::MeasurementMatrix => "measurement matrix",
            SectionKind::ParameterTable => "parameter table",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned while decoding a capture buffer.
///
/// Offsets are absolute positions in the capture buffer, so a failure can be
/// located with a hex viewer.
///
/// # Examples
/// ```
/// use tcdecode_core::{DecodeError, SectionKind};
///
/// let err = DecodeError::OddLength {
///     section: SectionKind::VariableUnitIndex,
///     len: 3,
/// };
/// assert!(err.to_string().contains("odd number of entries"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{section} marker not found")]
    MarkerNotFound { section: SectionKind },
    #[error("format error in {section} at offset {offset}: {detail}")]
    Format {
        section: SectionKind,
        offset: usize,
        detail: String,
    },
    #[error(
        "consistency error in {section} at offset {offset}: value {value:#06x} repeated as {repeat:#06x}"
    )]
    Consistency {
        section: SectionKind,
        offset: usize,
        value: u16,
        repeat: u16,
    },
    #[error("encoding error in {section} at offset {offset}: non-ASCII byte {byte:#04x}")]
    Encoding {
        section: SectionKind,
        offset: usize,
        byte: u8,
    },
    #[error(
        "index out of range in {section} at offset {offset}: {index} is outside 1..={table_len}"
    )]
    IndexOutOfRange {
        section: SectionKind,
        offset: usize,
        index: u32,
        table_len: usize,
    },
    #[error("{section} has an odd number of entries: {len}")]
    OddLength { section: SectionKind, len: usize },
    #[error(
        "truncated record in {section} at offset {offset}: {remaining} bytes left, record needs {stride}"
    )]
    TruncatedRecord {
        section: SectionKind,
        offset: usize,
        remaining: usize,
        stride: usize,
    },
}

impl DecodeError {
    pub(crate) fn format(section: SectionKind, offset: usize, detail: impl Into<String>) -> Self {
        DecodeError::Format {
            section,
            offset,
            detail: detail.into(),
        }
    }

    /// Section the failing stage was decoding.
    pub fn section(&self) -> SectionKind {
        match self {
            DecodeError::MarkerNotFound { section }
            | DecodeError::Format { section, .. }
            | DecodeError::Consistency { section, .. }
            | DecodeError::Encoding { section, .. }
            | DecodeError::IndexOutOfRange { section, .. }
            | DecodeError::OddLength { section, .. }
            | DecodeError::TruncatedRecord { section, .. } => *section,
        }
    }
}
