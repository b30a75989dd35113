use log::debug;

use super::error::{DecodeError, SectionKind};
use super::parameters::ParameterTable;
use super::variables::VariableUnitIndex;

/// Resolve the variable/unit index into `"<variable> (<unit>)"` labels.
///
/// The number of labels fixes the width of every measurement record.
///
/// # Errors
/// `OddLength` when the index cannot be paired, `IndexOutOfRange` when an
/// index falls outside the table.
pub fn build_column_labels(
    table: &ParameterTable,
    index: &VariableUnitIndex,
) -> Result<Vec<String>, DecodeError> {
    let kind = SectionKind::VariableUnitIndex;
    let (variables, units) = index.split()?;
    let labels = variables
        .iter()
        .zip(units)
        .map(|(variable, unit)| {
            let name = table.lookup(u32::from(variable.value), kind, variable.offset)?;
            let unit = table.lookup(u32::from(unit.value), kind, unit.offset)?;
            Ok(format!("{name} ({unit})"))
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;
    debug!("{} column labels", labels.len());
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::build_column_labels;
    use crate::format::error::{DecodeError, SectionKind};
    use crate::format::parameters::ParameterTable;
    use crate::format::variables::{IndexEntry, VariableUnitIndex};

    fn table() -> ParameterTable {
        ParameterTable::new(vec![
            "Temp".into(),
            "Pressure".into(),
            "degC".into(),
            "bar".into(),
        ])
    }

    fn index(values: &[u16]) -> VariableUnitIndex {
        VariableUnitIndex::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| IndexEntry {
                    value,
                    offset: 100 + i * 4,
                })
                .collect(),
        )
    }

    #[test]
    fn pairs_variables_with_units() {
        let labels = build_column_labels(&table(), &index(&[1, 2, 3, 4])).unwrap();
        assert_eq!(labels, vec!["Temp (degC)", "Pressure (bar)"]);
    }

    #[test]
    fn empty_index_yields_no_columns() {
        let labels = build_column_labels(&table(), &index(&[])).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn out_of_range_unit_reports_offset() {
        let err = build_column_labels(&table(), &index(&[1, 5])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::IndexOutOfRange {
                section: SectionKind::VariableUnitIndex,
                offset: 104,
                index: 5,
                table_len: 4,
            }
        );
    }

    #[test]
    fn odd_index_is_rejected() {
        let err = build_column_labels(&table(), &index(&[1, 2, 3])).unwrap_err();
        assert!(matches!(err, DecodeError::OddLength { len: 3, .. }));
    }
}
