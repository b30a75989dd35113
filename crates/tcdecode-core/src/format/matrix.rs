use log::{debug, warn};

use super::DecodeOptions;
use super::error::{DecodeError, SectionKind};
use super::layout;
use super::parameters::ParameterTable;
use super::reader::{SectionHeader, SectionReader};
use super::sections::Section;

/// One row of the measurement matrix; absent values are empty strings.
pub type MeasurementRecord = Vec<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementMatrix {
    pub records: Vec<MeasurementRecord>,
    /// Undersized tail dropped after the last full record.
    pub discarded_bytes: usize,
}

/// Decode the measurement matrix section into records of `width` cells.
///
/// The header's declared field is the record stride and must equal
/// `width * 4`. Each cell is a little-endian `u32` resolved through the
/// parameter table.
///
/// # Errors
/// `Format` for header violations, `IndexOutOfRange` for cells past the
/// table, and `TruncatedRecord` for a short tail when `strict_trailing` is
/// set. With zero columns any body bytes are a `Format` error in strict
/// mode.
pub fn decode_measurement_matrix(
    section: &Section<'_>,
    table: &ParameterTable,
    width: usize,
    options: &DecodeOptions,
) -> Result<(Option<SectionHeader>, MeasurementMatrix), DecodeError> {
    let kind = SectionKind::MeasurementMatrix;
    let mut reader = SectionReader::new(section);
    if reader.is_empty() {
        debug!("{kind} is empty");
        return Ok((None, MeasurementMatrix::default()));
    }

    let header = reader.read_header()?;
    header.require_leading_zero(kind)?;
    let stride = width * layout::CELL_LEN;
    if header.declared as usize != stride {
        return Err(DecodeError::format(
            kind,
            header.declared_offset(),
            format!(
                "header declares a record stride of {} bytes, {width} columns need {stride}",
                header.declared
            ),
        ));
    }

    let mut records = Vec::new();
    if stride > 0 {
        records.reserve(reader.remaining() / stride);
        while reader.remaining() >= stride {
            let mut record = Vec::with_capacity(width);
            for _ in 0..width {
                let offset = reader.offset();
                let raw = reader.read_u32_le()?;
                let cell = table.resolve_cell(raw, kind, offset)?;
                record.push(cell.unwrap_or_default().to_string());
            }
            records.push(record);
        }
    }

    let discarded_bytes = reader.remaining();
    if discarded_bytes > 0 {
        if options.strict_trailing && stride == 0 {
            return Err(DecodeError::format(
                kind,
                reader.offset(),
                format!("{discarded_bytes} body bytes present but there are no columns"),
            ));
        }
        if options.strict_trailing {
            return Err(DecodeError::TruncatedRecord {
                section: kind,
                offset: reader.offset(),
                remaining: discarded_bytes,
                stride,
            });
        }
        warn!(
            "{kind}: discarding {discarded_bytes} trailing bytes at offset {}",
            reader.offset()
        );
    }

    debug!("{kind}: {} records of {width} columns", records.len());
    Ok((
        Some(header),
        MeasurementMatrix {
            records,
            discarded_bytes,
        },
    ))
}
