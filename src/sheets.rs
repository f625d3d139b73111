//! In-memory view of the source workbook: loosely-typed rows keyed by the
//! header text of each sheet's first row.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    Bool(bool),
}

impl CellValue {
    pub fn date(date: NaiveDate) -> Self {
        CellValue::Date(date.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    /// Numeric view of the cell. Booleans count as 1/0; text and dates are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(_) | CellValue::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Date(d) => {
                if d.time().num_seconds_from_midnight() == 0 {
                    write!(f, "{}", d.date())
                } else {
                    write!(f, "{}", d)
                }
            }
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::date(value)
    }
}

/// A column held a value that could not be summed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("non-numeric value '{value}' in column '{column}' of sheet '{sheet}' (row {row})")]
pub struct NonNumericCell {
    pub sheet: String,
    pub column: String,
    /// 1-based data row, not counting the header.
    pub row: usize,
    pub value: String,
}

/// One data row. A column that is blank in this row is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    values: BTreeMap<String, CellValue>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.set(column, value);
        }
        row
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    pub fn has(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_number)
    }

    /// Text rendering of whatever the cell holds.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).map(|v| v.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSheet {
    pub name: String,
    /// Header text in sheet order.
    pub columns: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceSheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a sheet from rows, deriving the column list from first appearance.
    pub fn from_rows(name: impl Into<String>, rows: Vec<SourceRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.values.keys() {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn push_row(&mut self, row: SourceRow) {
        self.rows.push(row);
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Numeric value of one cell; `Ok(None)` when the cell is blank or the
    /// row does not exist.
    pub fn cell_number(
        &self,
        row_idx: usize,
        column: &str,
    ) -> std::result::Result<Option<f64>, NonNumericCell> {
        let Some(value) = self.rows.get(row_idx).and_then(|row| row.get(column)) else {
            return Ok(None);
        };
        value.as_number().map(Some).ok_or_else(|| NonNumericCell {
            sheet: self.name.clone(),
            column: column.to_string(),
            row: row_idx + 1,
            value: value.to_string(),
        })
    }

    /// Numeric value of one cell, 0 when blank. A present but non-numeric
    /// value is logged before it is defaulted.
    pub fn number_or_zero(&self, row_idx: usize, column: &str) -> f64 {
        match self.cell_number(row_idx, column) {
            Ok(value) => value.unwrap_or(0.0),
            Err(cell) => {
                warn!("{}; using 0", cell);
                0.0
            }
        }
    }

    /// Sum of a column, skipping blanks. Fails on the first non-numeric cell.
    pub fn sum_column(&self, column: &str) -> std::result::Result<f64, NonNumericCell> {
        let mut total = 0.0;
        for idx in 0..self.rows.len() {
            total += self.cell_number(idx, column)?.unwrap_or(0.0);
        }
        Ok(total)
    }

    /// Latest-by-append-order policy: the physically last row holding a value
    /// in `column` is treated as the most recent one.
    ///
    /// This relies on the sheet being maintained append-only in chronological
    /// order. Sorting or reordering the source rows silently changes which
    /// value is "latest".
    pub fn latest_by_append_order(&self, column: &str) -> Option<(usize, &SourceRow)> {
        self.rows
            .iter()
            .enumerate()
            .rev()
            .find(|(_, row)| row.has(column))
    }
}

/// All sheets read from one source workbook, in workbook order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceWorkbook {
    sheets: Vec<SourceSheet>,
}

impl SourceWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sheets(sheets: Vec<SourceSheet>) -> Self {
        let mut workbook = Self::new();
        for sheet in sheets {
            workbook.insert(sheet);
        }
        workbook
    }

    /// Adds a sheet, replacing any existing sheet with the same name.
    pub fn insert(&mut self, sheet: SourceSheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// Looks up a sheet by name. A missing sheet is `None`, never an error.
    pub fn load(&self, sheet_name: &str) -> Option<&SourceSheet> {
        self.sheets.iter().find(|s| s.name == sheet_name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    pub fn sheets(&self) -> &[SourceSheet] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSheet {
    pub name: String,
    pub reason: String,
}

/// What happened while reading the source workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// (sheet name, data row count)
    pub loaded: Vec<(String, usize)>,
    pub skipped: Vec<SkippedSheet>,
}
