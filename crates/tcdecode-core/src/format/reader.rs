use serde::{Deserialize, Serialize};

use super::error::{DecodeError, SectionKind};
use super::layout;
use super::sections::Section;

/// Common 12-byte header carried by every section.
///
/// `opaque` is read but never validated; its meaning is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHeader {
    pub leading: u32,
    pub opaque: u32,
    pub declared: u32,
    /// Absolute offset of the header in the capture buffer.
    pub offset: usize,
}

impl SectionHeader {
    pub fn declared_offset(&self) -> usize {
        self.offset + layout::HEADER_DECLARED_RANGE.start
    }

    pub fn require_leading_zero(&self, section: SectionKind) -> Result<(), DecodeError> {
        if self.leading != layout::HEADER_LEADING_VALUE {
            return Err(DecodeError::format(
                section,
                self.offset + layout::HEADER_LEADING_RANGE.start,
                format!("header leading field must be 0, found {}", self.leading),
            ));
        }
        Ok(())
    }
}

/// Forward-only cursor over one section.
///
/// Every read reports failures with the absolute capture offset so stage
/// parsers never index bytes directly.
pub struct SectionReader<'a> {
    kind: SectionKind,
    bytes: &'a [u8],
    base: usize,
    pos: usize,
}

impl<'a> SectionReader<'a> {
    pub fn new(section: &Section<'a>) -> Self {
        Self {
            kind: section.kind,
            bytes: section.bytes,
            base: section.start,
            pos: 0,
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::format(
                self.kind,
                self.offset(),
                format!("need {needed} bytes, {} left", self.remaining()),
            ));
        }
        Ok(())
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.require_len(len)?;
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let bytes = self.read_slice(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_header(&mut self) -> Result<SectionHeader, DecodeError> {
        let offset = self.offset();
        if self.remaining() < layout::HEADER_LEN {
            return Err(DecodeError::format(
                self.kind,
                offset,
                format!(
                    "header needs {} bytes, section has {}",
                    layout::HEADER_LEN,
                    self.remaining()
                ),
            ));
        }
        let leading = self.read_u32_le()?;
        let opaque = self.read_u32_le()?;
        let declared = self.read_u32_le()?;
        Ok(SectionHeader {
            leading,
            opaque,
            declared,
            offset,
        })
    }
}
