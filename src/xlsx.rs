//! Excel I/O: calamine for reading the source workbook, rust_xlsxwriter for
//! writing the streamlined one.

use crate::builder::{CellStyle, OutputSheet, OutputValue, OutputWorkbook};
use crate::error::{Result, StreamlinerError};
use crate::sheets::{CellValue, LoadReport, SkippedSheet, SourceRow, SourceSheet, SourceWorkbook};
use crate::utils::{datetime_to_excel_serial, excel_serial_to_datetime};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, log, warn, Level};
use rust_xlsxwriter::{Color, Format, Formula, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "yyyy-mm-dd";

/// Reads every sheet of an Excel workbook (xlsx, xls, xlsb, ods).
///
/// Failing to open the file is fatal. A sheet that fails to decode is
/// recorded in the report and left out of the workbook.
pub fn read_workbook(path: &Path) -> Result<(SourceWorkbook, LoadReport)> {
    read_workbook_logged(path, Level::Info)
}

/// Same as [`read_workbook`], logging each loaded sheet at `level`.
pub fn read_workbook_logged(path: &Path, level: Level) -> Result<(SourceWorkbook, LoadReport)> {
    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| StreamlinerError::SourceOpen {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(StreamlinerError::SourceOpen {
            path: path.to_path_buf(),
            details: "workbook contains no sheets".to_string(),
        });
    }

    Ok(load_sheets(
        &sheet_names,
        |name| workbook.worksheet_range(name),
        level,
    ))
}

/// Decodes each named sheet through `fetch`. A failed sheet is warned about
/// and skipped; the rest still load.
fn load_sheets<F, E>(
    sheet_names: &[String],
    mut fetch: F,
    level: Level,
) -> (SourceWorkbook, LoadReport)
where
    F: FnMut(&str) -> std::result::Result<Range<Data>, E>,
    E: Display,
{
    let mut source = SourceWorkbook::new();
    let mut report = LoadReport::default();

    for sheet_name in sheet_names {
        match fetch(sheet_name) {
            Ok(range) => {
                let sheet = sheet_from_range(sheet_name, &range);
                log!(level, "Loaded '{}' ({} rows)", sheet_name, sheet.len());
                report.loaded.push((sheet_name.clone(), sheet.len()));
                source.insert(sheet);
            }
            Err(e) => {
                warn!("Error loading '{}': {}", sheet_name, e);
                report.skipped.push(SkippedSheet {
                    name: sheet_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (source, report)
}

/// First row of the used range is the header row; every later row is data.
fn sheet_from_range(name: &str, range: &Range<Data>) -> SourceSheet {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return SourceSheet::new(name, Vec::new());
    };

    let columns = header_names(header_row);
    let mut sheet = SourceSheet::new(name, columns.clone());

    for data_row in rows {
        let mut row = SourceRow::new();
        for (column, cell) in columns.iter().zip(data_row.iter()) {
            if let Some(value) = cell_value(cell) {
                row.set(column.as_str(), value);
            }
        }
        sheet.push_row(row);
    }

    sheet
}

/// Header text per column. Blank headers become "Unnamed: N" and repeated
/// headers get a ".1", ".2" suffix so every column stays addressable.
fn header_names(header_row: &[Data]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell_value(cell) {
                Some(value) => value.to_string(),
                None => format!("Unnamed: {}", idx),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(CellValue::Text(s.clone()))
            }
        }
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // Error cells (#N/A, #DIV/0!) read as blanks.
        Data::Error(_) => None,
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64()).map(CellValue::Date),
        Data::DateTimeIso(s) => Some(
            parse_iso_datetime(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::Date),
        ),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Column width bounds for auto-fitting, in characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutofitBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for AutofitBounds {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: 30.0,
        }
    }
}

/// Writes the workbook and atomically moves it into place.
///
/// The file is serialized in memory, written next to the destination under a
/// temporary name, then renamed, so a failure never leaves a partial file at
/// `path`.
pub fn write_workbook(workbook: &OutputWorkbook, path: &Path, bounds: AutofitBounds) -> Result<()> {
    let mut xlsx = XlsxWorkbook::new();

    for sheet in &workbook.sheets {
        add_tab(&mut xlsx, sheet, bounds).map_err(|e| {
            destination_error(path, format!("tab '{}': {}", sheet.name, e))
        })?;
        debug!("Wrote tab '{}'", sheet.name);
    }

    let buffer = xlsx
        .save_to_buffer()
        .map_err(|e| destination_error(path, e.to_string()))?;

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, &buffer).map_err(|e| destination_error(path, e.to_string()))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(destination_error(path, e.to_string()));
    }

    Ok(())
}

fn destination_error(path: &Path, details: String) -> StreamlinerError {
    StreamlinerError::DestinationWrite {
        path: path.to_path_buf(),
        details,
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.xlsx".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

fn add_tab(
    xlsx: &mut XlsxWorkbook,
    sheet: &OutputSheet,
    bounds: AutofitBounds,
) -> std::result::Result<(), XlsxError> {
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(&sheet.name)?;
    write_sheet(sheet, worksheet)?;
    for (col, width) in autofit_widths(sheet, bounds) {
        worksheet.set_column_width(col, width)?;
    }
    Ok(())
}

fn write_sheet(
    sheet: &OutputSheet,
    worksheet: &mut Worksheet,
) -> std::result::Result<(), XlsxError> {
    // merge_range() blanks every cell in the range; the origin cell is
    // written again below with its real value and style.
    let merge_format = Format::new();
    for merge in &sheet.merges {
        worksheet.merge_range(
            merge.first_row,
            merge.first_col,
            merge.last_row,
            merge.last_col,
            "",
            &merge_format,
        )?;
    }

    for cell in sheet.cells() {
        let format = build_format(cell.style);
        match &cell.value {
            OutputValue::Text(s) => {
                worksheet.write_string_with_format(cell.row, cell.col, s, &format)?;
            }
            OutputValue::Number(n) => {
                worksheet.write_number_with_format(cell.row, cell.col, *n, &format)?;
            }
            OutputValue::Date(d) => {
                let format = format.set_num_format(DATE_FORMAT);
                worksheet.write_number_with_format(
                    cell.row,
                    cell.col,
                    datetime_to_excel_serial(*d),
                    &format,
                )?;
            }
            OutputValue::Formula { formula, cached } => {
                let formula = Formula::new(formula).set_result(cached.to_string());
                worksheet.write_formula_with_format(cell.row, cell.col, formula, &format)?;
            }
        }
    }

    Ok(())
}

fn build_format(style: CellStyle) -> Format {
    match style {
        CellStyle::Plain => Format::new(),
        CellStyle::Bold => Format::new().set_bold(),
        CellStyle::Title => Format::new()
            .set_font_name("Arial")
            .set_font_size(20)
            .set_bold(),
        CellStyle::Subtitle => Format::new()
            .set_font_name("Arial")
            .set_font_size(12)
            .set_italic(),
        CellStyle::SectionHeader { fill } => Format::new()
            .set_font_name("Arial")
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(fill)),
        CellStyle::ColumnHeader { fill } => Format::new()
            .set_bold()
            .set_background_color(Color::RGB(fill)),
    }
}

/// Width per used column: longest rendered value + 2, clamped to `bounds`.
pub fn autofit_widths(sheet: &OutputSheet, bounds: AutofitBounds) -> BTreeMap<u16, f64> {
    let mut longest: BTreeMap<u16, usize> = BTreeMap::new();
    for cell in sheet.cells() {
        let len = match &cell.value {
            OutputValue::Formula { cached, .. } => cached.to_string().chars().count(),
            other => other.display().chars().count(),
        };
        let entry = longest.entry(cell.col).or_insert(0);
        *entry = (*entry).max(len);
    }

    longest
        .into_iter()
        .filter(|(_, len)| *len > 0)
        .map(|(col, len)| {
            let width = (len as f64 + 2.0).min(bounds.max).max(bounds.min);
            (col, width)
        })
        .collect()
}
