use log::{debug, trace};
use serde::Serialize;

use super::error::{DecodeError, SectionKind};
use super::layout;
use super::reader::{SectionHeader, SectionReader};
use super::sections::Section;

/// One decoded table index and the capture offset it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub value: u16,
    pub offset: usize,
}

/// Decoded variable/unit index list.
///
/// The first half holds 1-based variable-name indices, the second half the
/// matching unit-name indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableUnitIndex {
    entries: Vec<IndexEntry>,
}

impl VariableUnitIndex {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn values(&self) -> Vec<u16> {
        self.entries.iter().map(|entry| entry.value).collect()
    }

    /// Split into `(variables, units)` halves.
    ///
    /// # Errors
    /// `OddLength` when the list cannot be paired.
    pub fn split(&self) -> Result<(&[IndexEntry], &[IndexEntry]), DecodeError> {
        if self.entries.len() % 2 != 0 {
            return Err(DecodeError::OddLength {
                section: SectionKind::VariableUnitIndex,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.split_at(self.entries.len() / 2))
    }
}

/// Decode the variable/unit index section.
///
/// The body is a run of 4-byte chunks whose upper 16 bits repeat the lower
/// 16 bits. A zero value terminates the list; running out of bytes ends it
/// as well. The header's declared length is not used to bound the loop.
///
/// # Errors
/// `Format` when the header is truncated, `Consistency` when a chunk's two
/// halves differ.
pub fn decode_variable_unit_index(
    section: &Section<'_>,
) -> Result<(Option<SectionHeader>, VariableUnitIndex), DecodeError> {
    let kind = SectionKind::VariableUnitIndex;
    let mut reader = SectionReader::new(section);
    if reader.is_empty() {
        debug!("{kind} is empty");
        return Ok((None, VariableUnitIndex::default()));
    }

    let header = reader.read_header()?;
    let mut entries = Vec::new();
    let mut terminated = false;
    while reader.remaining() >= layout::INDEX_CHUNK_LEN {
        let offset = reader.offset();
        let value = reader.read_u16_le()?;
        let repeat = reader.read_u16_le()?;
        if value != repeat {
            return Err(DecodeError::Consistency {
                section: kind,
                offset,
                value,
                repeat,
            });
        }
        if value == layout::INDEX_TERMINATOR {
            terminated = true;
            break;
        }
        entries.push(IndexEntry { value, offset });
    }

    if !terminated {
        trace!(
            "{kind} ended without terminator ({} stray bytes)",
            reader.remaining()
        );
    }
    debug!(
        "{kind}: {} indices, header declares {} bytes",
        entries.len(),
        header.declared
    );
    Ok((Some(header), VariableUnitIndex::new(entries)))
}
