use std::fs;
use std::path::{Path, PathBuf};

use tcdecode_core::format::layout;

const PREAMBLE: &[u8] = b"TCAP\x01\x00\x00\x00";
const OPAQUE: u32 = 0x5a5a_0001;

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    write_capture(
        root.join("basic").join("input.TC"),
        CaptureSpec {
            names: vec![
                "Temp", "Pressure", "degC", "bar", "21.5", "1.013", "22.0", "0.998",
            ],
            pairs: vec![(1, 3), (2, 4)],
            rows: vec![vec![5, 6], vec![7, 0], vec![0, 8]],
            trailing: vec![0x07, 0x00, 0x00],
            sections: Sections::All,
        },
    )?;
    write_capture(
        root.join("no_variables").join("input.TC"),
        CaptureSpec {
            names: vec!["unused"],
            pairs: Vec::new(),
            rows: Vec::new(),
            trailing: Vec::new(),
            sections: Sections::WithoutVariableUnitIndex,
        },
    )?;
    Ok(())
}

enum Sections {
    All,
    WithoutVariableUnitIndex,
}

struct CaptureSpec {
    names: Vec<&'static str>,
    /// 1-based (variable, unit) name indices.
    pairs: Vec<(u16, u16)>,
    /// 1-based name indices per cell, `0` for no value.
    rows: Vec<Vec<u32>>,
    trailing: Vec<u8>,
    sections: Sections,
}

fn write_capture(path: PathBuf, spec: CaptureSpec) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }

    let mut bytes = PREAMBLE.to_vec();
    if matches!(spec.sections, Sections::All) {
        bytes.extend_from_slice(layout::MARKER_VARIABLE_UNIT_INDEX);
        bytes.extend(build_variable_unit_index(&spec.pairs));
    }
    bytes.extend_from_slice(layout::MARKER_MEASUREMENT_MATRIX);
    bytes.extend(build_measurement_matrix(
        spec.pairs.len(),
        &spec.rows,
        &spec.trailing,
    ));
    bytes.extend_from_slice(layout::MARKER_PARAMETER_TABLE);
    bytes.extend(build_parameter_table(&spec.names));

    write_file(&path, &bytes)
}

fn header(declared: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(layout::HEADER_LEN);
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&OPAQUE.to_le_bytes());
    bytes.extend_from_slice(&declared.to_le_bytes());
    bytes
}

fn build_variable_unit_index(pairs: &[(u16, u16)]) -> Vec<u8> {
    let values: Vec<u16> = pairs
        .iter()
        .map(|(variable, _)| *variable)
        .chain(pairs.iter().map(|(_, unit)| *unit))
        .collect();
    let mut body = Vec::new();
    for value in values.into_iter().chain(std::iter::once(0)) {
        body.extend_from_slice(&value.to_le_bytes());
        body.extend_from_slice(&value.to_le_bytes());
    }
    // Zero padding after the terminator.
    body.extend_from_slice(&[0u8; 4]);

    let mut bytes = header(body.len() as u32);
    bytes.extend(body);
    bytes
}

fn build_measurement_matrix(width: usize, rows: &[Vec<u32>], trailing: &[u8]) -> Vec<u8> {
    let mut bytes = header((width * layout::CELL_LEN) as u32);
    for row in rows {
        for cell in row {
            bytes.extend_from_slice(&cell.to_le_bytes());
        }
    }
    bytes.extend_from_slice(trailing);
    bytes
}

fn build_parameter_table(names: &[&str]) -> Vec<u8> {
    let mut bytes = header(names.len() as u32);
    for name in names {
        bytes.push((name.len() + 4) as u8);
        bytes.push(0x00);
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0x00);
        bytes.push(0x01);
    }
    bytes
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), String> {
    fs::write(path, bytes).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}
