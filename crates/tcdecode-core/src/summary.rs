use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;
use thiserror::Error;

use crate::export::ROW_NUMBER_HEADER;

/// Inclusive 0-based row range; `end` defaults to the last row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowRange {
    pub start: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Non-empty values that contributed to the statistics.
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Whether the column changed at all within the range.
    pub varies: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows_total: usize,
    pub rows_selected: usize,
    pub range: RowRange,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid row range: start {start} is after end {end}")]
    InvalidRange { start: usize, end: usize },
}

/// Per-column statistics over numeric columns of an exported CSV.
///
/// A column is numeric when every non-empty value in the selected rows
/// parses as a float; empty cells are skipped. The row-number column is
/// left out.
///
/// # Examples
/// ```
/// use tcdecode_core::{RowRange, summarize_csv};
///
/// let csv = "Measurement #,Temp (degC),Mode (-)\n1,20,idle\n2,22,run\n";
/// let summary = summarize_csv(csv.as_bytes(), RowRange::default())?;
/// assert_eq!(summary.columns.len(), 1);
/// assert_eq!(summary.columns[0].mean, 21.0);
/// # Ok::<(), tcdecode_core::SummaryError>(())
/// ```
///
/// # Errors
/// `InvalidRange` when `start > end`; CSV errors for malformed input.
pub fn summarize_csv<R: Read>(reader: R, range: RowRange) -> Result<Summary, SummaryError> {
    if let Some(end) = range.end {
        if range.start > end {
            return Err(SummaryError::InvalidRange {
                start: range.start,
                end,
            });
        }
    }

    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let skip = usize::from(headers.get(0) == Some(ROW_NUMBER_HEADER));

    let mut columns: Vec<ColumnAccumulator> = headers
        .iter()
        .skip(skip)
        .map(ColumnAccumulator::new)
        .collect();

    let mut rows_total = 0;
    let mut rows_selected = 0;
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        rows_total += 1;
        if idx < range.start || range.end.is_some_and(|end| idx > end) {
            continue;
        }
        rows_selected += 1;
        for (column, value) in columns.iter_mut().zip(record.iter().skip(skip)) {
            column.push(value);
        }
    }

    Ok(Summary {
        rows_total,
        rows_selected,
        range,
        columns: columns
            .into_iter()
            .filter_map(ColumnAccumulator::finish)
            .collect(),
    })
}

pub fn summarize_csv_file(path: &Path, range: RowRange) -> Result<Summary, SummaryError> {
    let file = File::open(path)?;
    summarize_csv(file, range)
}

struct ColumnAccumulator {
    name: String,
    numeric: bool,
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl ColumnAccumulator {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            numeric: true,
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, raw: &str) {
        if !self.numeric {
            return;
        }
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match raw.parse::<f64>() {
            Ok(value) => {
                self.count += 1;
                self.sum += value;
                self.min = self.min.min(value);
                self.max = self.max.max(value);
            }
            Err(_) => self.numeric = false,
        }
    }

    fn finish(self) -> Option<ColumnSummary> {
        if !self.numeric || self.count == 0 {
            return None;
        }
        Some(ColumnSummary {
            name: self.name,
            count: self.count,
            mean: self.sum / self.count as f64,
            min: self.min,
            max: self.max,
            varies: self.min != self.max,
        })
    }
}
