//! Workbook profiling: sheet dimensions and headers, used to log the source
//! structure before a run and to check the streamlined output after it.

use crate::error::Result;
use crate::sheets::SourceWorkbook;
use crate::xlsx::read_workbook_logged;
use log::{debug, log, Level};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetProfile {
    pub name: String,
    /// Data rows, excluding the header row.
    pub rows: usize,
    pub columns: usize,
    pub headers: Vec<String>,
    pub non_empty_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookProfile {
    pub sheets: Vec<SheetProfile>,
}

/// Outcome of comparing a profile's tabs against the expected tab list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCheck {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    pub in_order: bool,
}

impl TabCheck {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.in_order
    }
}

impl WorkbookProfile {
    pub fn from_workbook(workbook: &SourceWorkbook) -> Self {
        let sheets = workbook
            .sheets()
            .iter()
            .map(|sheet| SheetProfile {
                name: sheet.name.clone(),
                rows: sheet.len(),
                columns: sheet.columns.len(),
                headers: sheet.columns.clone(),
                non_empty_rows: sheet.rows.iter().filter(|row| !row.is_empty()).count(),
            })
            .collect();
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetProfile> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn verify_tabs(&self, expected: &[&str]) -> TabCheck {
        let actual = self.sheet_names();
        let missing = expected
            .iter()
            .filter(|name| !actual.contains(*name))
            .map(|name| name.to_string())
            .collect();
        let unexpected = actual
            .iter()
            .filter(|name| !expected.contains(*name))
            .map(|name| name.to_string())
            .collect();
        TabCheck {
            missing,
            unexpected,
            in_order: actual == expected,
        }
    }

    /// Logs one line per sheet at `level`; headers always go to debug.
    pub fn log_summary(&self, level: Level) {
        for sheet in &self.sheets {
            log!(
                level,
                "  {}: {} rows x {} columns",
                sheet.name,
                sheet.rows,
                sheet.columns
            );
            debug!("    headers: {}", sheet.headers.join(", "));
        }
    }
}

/// Reads the workbook at `path` and profiles every sheet that loads.
pub fn profile_workbook(path: &Path) -> Result<WorkbookProfile> {
    let (workbook, report) = read_workbook_logged(path, Level::Debug)?;
    for skipped in &report.skipped {
        debug!("Profile skipped '{}': {}", skipped.name, skipped.reason);
    }
    Ok(WorkbookProfile::from_workbook(&workbook))
}
