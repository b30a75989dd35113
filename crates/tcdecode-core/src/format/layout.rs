pub const MARKER_LEN: usize = 6;
pub const MARKER_PARAMETER_TABLE: &[u8; MARKER_LEN] = &[0x00, 0x00, 0x10, 0x00, 0x02, 0x00];
pub const MARKER_MEASUREMENT_MATRIX: &[u8; MARKER_LEN] = &[0x00, 0x00, 0x10, 0x00, 0x04, 0x00];
pub const MARKER_VARIABLE_UNIT_INDEX: &[u8; MARKER_LEN] = &[0x00, 0x00, 0x10, 0x00, 0x05, 0x00];

pub const HEADER_LEN: usize = 12;
pub const HEADER_LEADING_RANGE: std::ops::Range<usize> = 0..4;
pub const HEADER_OPAQUE_RANGE: std::ops::Range<usize> = 4..8;
pub const HEADER_DECLARED_RANGE: std::ops::Range<usize> = 8..12;
pub const HEADER_LEADING_VALUE: u32 = 0;

// Length byte, leading zero, and the two trailing bytes.
pub const ENTRY_MIN_LEN: usize = 4;
pub const ENTRY_PAD: u8 = 0x00;

pub const INDEX_CHUNK_LEN: usize = 4;
pub const INDEX_TERMINATOR: u16 = 0;

pub const CELL_LEN: usize = 4;
pub const ABSENT_CELL: u32 = 0;
