use log::{debug, warn};

use super::DecodeOptions;
use super::error::{DecodeError, SectionKind};
use super::layout;

/// Contiguous byte range of one section, borrowed from the capture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    /// Offset of the section's own marker, when it was found.
    pub marker: Option<usize>,
    /// Absolute offset of the first data byte.
    pub start: usize,
    pub bytes: &'a [u8],
}

impl<'a> Section<'a> {
    fn empty(kind: SectionKind, marker: Option<usize>, start: usize) -> Self {
        Self {
            kind,
            marker,
            start,
            bytes: &[],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.bytes.len()
    }
}

/// The three sections of one capture, in file order.
#[derive(Debug, Clone, Copy)]
pub struct Sections<'a> {
    pub variable_unit_index: Section<'a>,
    pub measurement_matrix: Section<'a>,
    pub parameter_table: Section<'a>,
}

impl<'a> Sections<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &Section<'a>> {
        [
            &self.variable_unit_index,
            &self.measurement_matrix,
            &self.parameter_table,
        ]
        .into_iter()
    }

    pub fn missing(&self) -> Vec<SectionKind> {
        self.iter()
            .filter(|section| section.marker.is_none())
            .map(|section| section.kind)
            .collect()
    }
}

/// Marker of each section, listed in the order the sections must appear.
const SCHEMA: [(SectionKind, &[u8; layout::MARKER_LEN]); 3] = [
    (
        SectionKind::VariableUnitIndex,
        layout::MARKER_VARIABLE_UNIT_INDEX,
    ),
    (
        SectionKind::MeasurementMatrix,
        layout::MARKER_MEASUREMENT_MATRIX,
    ),
    (SectionKind::ParameterTable, layout::MARKER_PARAMETER_TABLE),
];

/// Split a capture buffer into its three sections.
///
/// Each section runs from just past its marker to the start of the next
/// marker in schema order; the parameter table runs to end of buffer. A
/// missing marker leaves its section empty, as well as the section it would
/// have terminated, unless `require_all_sections` is set.
///
/// # Errors
/// `MarkerNotFound` when a marker is missing in strict mode, `Format` when
/// markers are out of order or overlap.
pub fn locate_sections<'a>(
    capture: &'a [u8],
    options: &DecodeOptions,
) -> Result<Sections<'a>, DecodeError> {
    let mut positions = [None; 3];
    for (slot, (kind, marker)) in positions.iter_mut().zip(SCHEMA.iter()) {
        *slot = find_marker(capture, marker);
        match *slot {
            Some(offset) => debug!("{kind} marker at offset {offset}"),
            None if options.require_all_sections => {
                return Err(DecodeError::MarkerNotFound { section: *kind });
            }
            None => warn!("{kind} marker not found; section left empty"),
        }
    }

    check_marker_order(&positions)?;

    let [varunit, measure, param] = positions;
    let parameter_table = match param {
        Some(marker) => {
            let start = marker + layout::MARKER_LEN;
            Section {
                kind: SectionKind::ParameterTable,
                marker: Some(marker),
                start,
                bytes: &capture[start..],
            }
        }
        None => Section::empty(SectionKind::ParameterTable, None, capture.len()),
    };
    let measurement_matrix = bounded(capture, SectionKind::MeasurementMatrix, measure, param)?;
    let variable_unit_index = bounded(capture, SectionKind::VariableUnitIndex, varunit, measure)?;

    Ok(Sections {
        variable_unit_index,
        measurement_matrix,
        parameter_table,
    })
}

fn find_marker(capture: &[u8], marker: &[u8; layout::MARKER_LEN]) -> Option<usize> {
    capture
        .windows(layout::MARKER_LEN)
        .position(|window| window == marker)
}

fn check_marker_order(positions: &[Option<usize>; 3]) -> Result<(), DecodeError> {
    let mut previous: Option<(SectionKind, usize)> = None;
    for ((kind, _), position) in SCHEMA.iter().zip(positions.iter()) {
        let Some(offset) = *position else {
            continue;
        };
        if let Some((prev_kind, prev_offset)) = previous {
            if offset < prev_offset {
                return Err(DecodeError::format(
                    *kind,
                    offset,
                    format!("{kind} marker precedes {prev_kind} marker at offset {prev_offset}"),
                ));
            }
        }
        previous = Some((*kind, offset));
    }
    Ok(())
}

fn bounded<'a>(
    capture: &'a [u8],
    kind: SectionKind,
    marker: Option<usize>,
    next_marker: Option<usize>,
) -> Result<Section<'a>, DecodeError> {
    match (marker, next_marker) {
        (Some(marker), Some(end)) => {
            let start = marker + layout::MARKER_LEN;
            if start > end {
                return Err(DecodeError::format(
                    kind,
                    marker,
                    format!("{kind} marker overlaps the next marker at offset {end}"),
                ));
            }
            Ok(Section {
                kind,
                marker: Some(marker),
                start,
                bytes: &capture[start..end],
            })
        }
        (Some(marker), None) => {
            warn!("{kind} has no terminating marker; section left empty");
            Ok(Section::empty(kind, Some(marker), marker + layout::MARKER_LEN))
        }
        (None, _) => Ok(Section::empty(kind, None, capture.len())),
    }
}
