//! Capture file format decoding.
//!
//! The format is split in layers, one concern each:
//! - `layout`: markers, header field ranges and fixed sizes (source of truth)
//! - `reader`: bounds-checked cursor and the shared section header
//! - `sections`: marker search and the ordered section schema
//! - `parameters`, `variables`, `labels`, `matrix`: one decoding stage each
//! - `error`: typed errors naming the stage and the capture offset
//!
//! Stages are pure functions over borrowed bytes and never perform I/O.

use serde::{Deserialize, Serialize};

pub mod error;
pub mod layout;
pub mod reader;

mod labels;
mod matrix;
mod parameters;
mod sections;
mod variables;

pub use labels::build_column_labels;
pub use matrix::{MeasurementMatrix, MeasurementRecord, decode_measurement_matrix};
pub use parameters::{ParameterTable, decode_parameter_table};
pub use sections::{Section, Sections, locate_sections};
pub use variables::{IndexEntry, VariableUnitIndex, decode_variable_unit_index};

/// Decoder switches. Both default to the lenient behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Fail with `TruncatedRecord` instead of dropping an undersized tail in
    /// the measurement matrix.
    #[serde(default)]
    pub strict_trailing: bool,
    /// Fail with `MarkerNotFound` instead of treating a missing section as
    /// empty.
    #[serde(default)]
    pub require_all_sections: bool,
}
