use log::debug;
use serde::Serialize;

use super::error::{DecodeError, SectionKind};
use super::layout;
use super::reader::{SectionHeader, SectionReader};
use super::sections::Section;

/// Decoded string table of a capture.
///
/// Names are stored 0-based, but every index found in the file is 1-based
/// with `0` meaning "no value". All translation between the two happens in
/// [`ParameterTable::lookup`] and [`ParameterTable::resolve_cell`].
///
/// # Examples
/// ```
/// use tcdecode_core::{ParameterTable, SectionKind};
///
/// let table = ParameterTable::new(vec!["Alpha".to_string()]);
/// assert_eq!(table.get(1), Some("Alpha"));
/// assert_eq!(table.get(0), None);
/// let cell = table
///     .resolve_cell(0, SectionKind::MeasurementMatrix, 0)
///     .unwrap();
/// assert_eq!(cell, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterTable {
    names: Vec<String>,
}

impl ParameterTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name at a 1-based index.
    pub fn get(&self, index: u32) -> Option<&str> {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        self.names.get(slot).map(String::as_str)
    }

    /// Name at a 1-based index that must be present.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `index` is outside `1..=len`; `offset` is the
    /// capture position the index was read from.
    pub fn lookup(
        &self,
        index: u32,
        section: SectionKind,
        offset: usize,
    ) -> Result<&str, DecodeError> {
        self.get(index).ok_or(DecodeError::IndexOutOfRange {
            section,
            offset,
            index,
            table_len: self.names.len(),
        })
    }

    /// Resolve a raw cell value: `0` is absent, anything else a 1-based index.
    pub fn resolve_cell(
        &self,
        raw: u32,
        section: SectionKind,
        offset: usize,
    ) -> Result<Option<&str>, DecodeError> {
        if raw == layout::ABSENT_CELL {
            return Ok(None);
        }
        self.lookup(raw, section, offset).map(Some)
    }
}

/// Decode the parameter table section.
///
/// Each entry is a length byte `L` covering the whole entry, followed by a
/// zero byte, the ASCII name, a zero byte and one trailing byte.
///
/// # Errors
/// `Format` for header or entry framing violations and when the declared
/// name count disagrees with the decoded count; `Encoding` for non-ASCII
/// name bytes.
pub fn decode_parameter_table(
    section: &Section<'_>,
) -> Result<(Option<SectionHeader>, ParameterTable), DecodeError> {
    let kind = SectionKind::ParameterTable;
    let mut reader = SectionReader::new(section);
    if reader.is_empty() {
        debug!("{kind} is empty");
        return Ok((None, ParameterTable::default()));
    }

    let header = reader.read_header()?;
    header.require_leading_zero(kind)?;

    let mut names = Vec::new();
    while !reader.is_empty() {
        names.push(read_entry(&mut reader)?);
    }

    if names.len() != header.declared as usize {
        return Err(DecodeError::format(
            kind,
            header.declared_offset(),
            format!(
                "header declares {} names, decoded {}",
                header.declared,
                names.len()
            ),
        ));
    }

    debug!(
        "{kind}: {} names from {} bytes at offset {}",
        names.len(),
        section.len(),
        section.start
    );
    Ok((Some(header), ParameterTable::new(names)))
}

fn read_entry(reader: &mut SectionReader<'_>) -> Result<String, DecodeError> {
    let kind = reader.kind();
    let entry_offset = reader.offset();
    let len = reader.read_u8()? as usize;
    if len < layout::ENTRY_MIN_LEN {
        return Err(DecodeError::format(
            kind,
            entry_offset,
            format!(
                "entry length {len} is below the minimum of {}",
                layout::ENTRY_MIN_LEN
            ),
        ));
    }
    if reader.remaining() < len - 1 {
        return Err(DecodeError::format(
            kind,
            entry_offset,
            format!(
                "entry of {len} bytes runs past the end of the section ({} left)",
                reader.remaining() + 1
            ),
        ));
    }

    let payload_offset = reader.offset();
    let payload = reader.read_slice(len - 1)?;
    if payload[0] != layout::ENTRY_PAD {
        return Err(DecodeError::format(
            kind,
            payload_offset,
            format!("entry must start with 0x00, found {:#04x}", payload[0]),
        ));
    }
    let closing = payload.len() - 2;
    if payload[closing] != layout::ENTRY_PAD {
        return Err(DecodeError::format(
            kind,
            payload_offset + closing,
            format!(
                "entry name must end with 0x00, found {:#04x}",
                payload[closing]
            ),
        ));
    }

    let name = &payload[1..closing];
    if let Some(pos) = name.iter().position(|b| !b.is_ascii()) {
        return Err(DecodeError::Encoding {
            section: kind,
            offset: payload_offset + 1 + pos,
            byte: name[pos],
        });
    }
    Ok(name.iter().map(|&b| char::from(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::{ParameterTable, decode_parameter_table};
    use crate::format::error::{DecodeError, SectionKind};
    use crate::format::sections::Section;

    fn section(bytes: &[u8]) -> Section<'_> {
        Section {
            kind: SectionKind::ParameterTable,
            marker: Some(0),
            start: 6,
            bytes,
        }
    }

    fn entry(name: &str) -> Vec<u8> {
        let mut bytes = vec![(name.len() + 4) as u8, 0x00];
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&[0x00, 0x01]);
        bytes
    }

    fn table_bytes(declared: u32, names: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        bytes.extend_from_slice(&declared.to_le_bytes());
        for name in names {
            bytes.extend(entry(name));
        }
        bytes
    }

    #[test]
    fn decodes_names_in_order() {
        let bytes = table_bytes(2, &["AB", "C"]);
        let (header, table) = decode_parameter_table(&section(&bytes)).unwrap();
        assert_eq!(table.names(), ["AB", "C"]);
        let header = header.unwrap();
        assert_eq!(header.opaque, 0xdead_beef);
        assert_eq!(header.declared, 2);
    }

    #[test]
    fn empty_name_is_allowed() {
        let bytes = table_bytes(1, &[""]);
        let (_, table) = decode_parameter_table(&section(&bytes)).unwrap();
        assert_eq!(table.names(), [""]);
    }

    #[test]
    fn empty_section_is_empty_table() {
        let (header, table) = decode_parameter_table(&section(&[])).unwrap();
        assert!(header.is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn declared_count_mismatch_is_format_error() {
        let bytes = table_bytes(3, &["AB", "C"]);
        let err = decode_parameter_table(&section(&bytes)).unwrap_err();
        assert!(matches!(err, DecodeError::Format { offset: 14, .. }));
        assert!(err.to_string().contains("declares 3 names, decoded 2"));
    }

    #[test]
    fn nonzero_leading_field_is_format_error() {
        let mut bytes = table_bytes(1, &["A"]);
        bytes[0] = 1;
        let err = decode_parameter_table(&section(&bytes)).unwrap_err();
        assert!(matches!(err, DecodeError::Format { offset: 6, .. }));
    }

    #[test]
    fn missing_leading_pad_is_format_error() {
        let mut bytes = table_bytes(1, &["AB"]);
        bytes[13] = 0x41;
        let err = decode_parameter_table(&section(&bytes)).unwrap_err();
        assert!(err.to_string().contains("must start with 0x00"));
    }

    #[test]
    fn missing_closing_pad_is_format_error() {
        let mut bytes = table_bytes(1, &["AB"]);
        bytes[16] = 0x20;
        let err = decode_parameter_table(&section(&bytes)).unwrap_err();
        assert!(matches!(err, DecodeError::Format { offset: 22, .. }));
    }

    #[test]
    fn non_ascii_name_is_encoding_error() {
        let mut bytes = table_bytes(1, &["AB"]);
        bytes[15] = 0xE9;
        let err = decode_parameter_table(&section(&bytes)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Encoding {
                section: SectionKind::ParameterTable,
                offset: 21,
                byte: 0xE9,
            }
        );
    }

    #[test]
    fn truncated_entry_is_format_error() {
        let mut bytes = table_bytes(1, &["ABC"]);
        bytes.truncate(bytes.len() - 2);
        let err = decode_parameter_table(&section(&bytes)).unwrap_err();
        assert!(err.to_string().contains("runs past the end"));
    }

    #[test]
    fn undersized_entry_length_is_format_error() {
        let mut bytes = table_bytes(0, &[]);
        bytes.extend_from_slice(&[0x00]);
        let err = decode_parameter_table(&section(&bytes)).unwrap_err();
        assert!(err.to_string().contains("below the minimum"));
    }

    #[test]
    fn lookup_translates_one_based_indices() {
        let table = ParameterTable::new(vec!["a".into(), "b".into()]);
        assert_eq!(
            table.lookup(2, SectionKind::MeasurementMatrix, 0).unwrap(),
            "b"
        );
        let err = table
            .lookup(3, SectionKind::MeasurementMatrix, 40)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::IndexOutOfRange {
                section: SectionKind::MeasurementMatrix,
                offset: 40,
                index: 3,
                table_len: 2,
            }
        );
        assert!(table.lookup(0, SectionKind::MeasurementMatrix, 0).is_err());
    }
}
