//! Assembles the seven output tabs as plain cell grids. Styling is carried
//! as `CellStyle` tags; turning them into fonts and fills is the writer's job.

use crate::aggregation::{grand_total, CategoryTotal, MonthlySummary};
use crate::categories::StandardCategory;
use crate::consolidation::{AccountSummaryLine, ConsolidatedAccountRow, ConsolidatedDebtRow};
use crate::metrics::KeyMetrics;
use crate::sheets::CellValue;
use crate::transactions::Transaction;
use crate::utils::{format_currency, format_long_date, format_percent, format_ratio_as_percent};
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DASHBOARD: &str = "Dashboard";
pub const TRANSACTION_LOG: &str = "Transaction Log";
pub const MONTHLY_SUMMARY: &str = "Monthly Summary";
pub const ACCOUNT_BALANCES: &str = "Account Balances";
pub const DEBT_TRACKING: &str = "Debt Tracking";
pub const BUDGET_PLANNING: &str = "Budget Planning";
pub const CATEGORY_ANALYSIS: &str = "Category Analysis";

/// Output tabs in workbook order.
pub const TAB_NAMES: [&str; 7] = [
    DASHBOARD,
    TRANSACTION_LOG,
    MONTHLY_SUMMARY,
    ACCOUNT_BALANCES,
    DEBT_TRACKING,
    BUDGET_PLANNING,
    CATEGORY_ANALYSIS,
];

pub const TRANSACTION_LOG_HEADERS: [&str; 7] = [
    "Date",
    "Company",
    "Original Category",
    "Standardized Category",
    "Type",
    "Amount",
    "Split Amount",
];

pub const MONTHLY_SUMMARY_HEADERS: [&str; 7] = [
    "Month",
    "Net Income",
    "Personal Expenses",
    "Shared Expenses (50%)",
    "Total Expenses",
    "Net Savings",
    "Savings Rate",
];

pub const ACCOUNT_BALANCES_HEADERS: [&str; 7] = [
    "Account Name",
    "Account Type",
    "Current Balance",
    "Previous Balance",
    "Change Amount",
    "Change %",
    "Last Updated",
];

pub const DEBT_TRACKING_HEADERS: [&str; 7] = [
    "Debt Type",
    "Current Balance",
    "Monthly Payment",
    "Interest Rate",
    "Payoff Date (Est.)",
    "Total Interest",
    "Last Updated",
];

pub const BUDGET_PLANNING_HEADERS: [&str; 8] = [
    "Category",
    "Budgeted Amount",
    "Actual Spent (Current Month)",
    "Variance",
    "Variance %",
    "YTD Budgeted",
    "YTD Actual",
    "YTD Variance",
];

pub const CATEGORY_ANALYSIS_HEADERS: [&str; 6] = [
    "Category",
    "Total Spent",
    "% of Total Spending",
    "Avg Monthly",
    "Trend (Last 3 Months)",
    "Notes",
];

const DASHBOARD_SUMMARY_HEADERS: [&str; 3] = ["Account Type", "Balance", "3-Month Change"];

const SECTION_FILL: u32 = 0x366092;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputValue {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    /// A live formula plus the result a reader should see before recalculation.
    Formula { formula: String, cached: f64 },
}

impl OutputValue {
    /// Rendered text, used for width fitting and assertions.
    pub fn display(&self) -> String {
        match self {
            OutputValue::Text(s) => s.clone(),
            OutputValue::Number(n) => format!("{}", n),
            OutputValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            OutputValue::Formula { formula, .. } => formula.clone(),
        }
    }
}

impl From<&CellValue> for OutputValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Number(n) => OutputValue::Number(*n),
            CellValue::Date(d) => OutputValue::Date(*d),
            other => OutputValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for OutputValue {
    fn from(value: &str) -> Self {
        OutputValue::Text(value.to_string())
    }
}

impl From<String> for OutputValue {
    fn from(value: String) -> Self {
        OutputValue::Text(value)
    }
}

impl From<f64> for OutputValue {
    fn from(value: f64) -> Self {
        OutputValue::Number(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStyle {
    Plain,
    Bold,
    Title,
    Subtitle,
    /// Full-width banner with a solid fill and white text.
    SectionHeader { fill: u32 },
    /// Bold column header with a light fill.
    ColumnHeader { fill: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputCell {
    pub row: u32,
    pub col: u16,
    pub value: OutputValue,
    pub style: CellStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSheet {
    pub name: String,
    cells: BTreeMap<(u32, u16), OutputCell>,
    pub merges: Vec<MergedRange>,
}

impl OutputSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    /// Writes a cell at a 0-based position, replacing whatever was there.
    pub fn write(&mut self, row: u32, col: u16, value: impl Into<OutputValue>, style: CellStyle) {
        self.cells.insert(
            (row, col),
            OutputCell {
                row,
                col,
                value: value.into(),
                style,
            },
        );
    }

    pub fn merge(&mut self, first_row: u32, first_col: u16, last_row: u32, last_col: u16) {
        self.merges.push(MergedRange {
            first_row,
            first_col,
            last_row,
            last_col,
        });
    }

    pub fn write_headers(&mut self, row: u32, headers: &[&str], style: CellStyle) {
        for (col, header) in headers.iter().enumerate() {
            self.write(row, col as u16, *header, style);
        }
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &OutputCell> {
        self.cells.values()
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&OutputCell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&OutputValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    /// Rendered values of one row, blank cells as empty strings, up to the
    /// row's last written column.
    pub fn row_display(&self, row: u32) -> Vec<String> {
        let Some(last_col) = self
            .cells
            .range((row, 0)..=(row, u16::MAX))
            .map(|(&(_, col), _)| col)
            .last()
        else {
            return Vec::new();
        };
        (0..=last_col)
            .map(|col| self.value(row, col).map(OutputValue::display).unwrap_or_default())
            .collect()
    }

    /// Number of rows up to and including the last written row.
    pub fn used_rows(&self) -> u32 {
        self.cells.keys().last().map(|&(row, _)| row + 1).unwrap_or(0)
    }

    /// Rows below the first (header or title) row.
    pub fn data_rows(&self) -> u32 {
        self.used_rows().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputWorkbook {
    pub sheets: Vec<OutputSheet>,
}

impl OutputWorkbook {
    pub fn sheet(&self, name: &str) -> Option<&OutputSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Everything the builder lays out, computed ahead of time.
#[derive(Debug, Clone, Copy)]
pub struct BuilderInputs<'a> {
    pub metrics: &'a KeyMetrics,
    pub account_summary: Option<&'a [AccountSummaryLine]>,
    pub transactions: &'a [Transaction],
    pub monthly: &'a [MonthlySummary],
    pub accounts: &'a [ConsolidatedAccountRow],
    pub debts: &'a [ConsolidatedDebtRow],
    pub category_totals: &'a [CategoryTotal],
}

pub struct WorkbookBuilder<'a> {
    title: &'a str,
    generated_on: NaiveDate,
}

impl<'a> WorkbookBuilder<'a> {
    pub fn new(title: &'a str, generated_on: NaiveDate) -> Self {
        Self {
            title,
            generated_on,
        }
    }

    pub fn build(&self, inputs: &BuilderInputs<'_>) -> OutputWorkbook {
        let sheets = vec![
            self.dashboard(inputs.metrics, inputs.account_summary),
            transaction_log(inputs.transactions),
            monthly_summary(inputs.monthly),
            account_balances(inputs.accounts),
            debt_tracking(inputs.debts),
            budget_planning(),
            category_analysis(inputs.category_totals),
        ];

        for sheet in &sheets {
            info!("Built tab: {} ({} data rows)", sheet.name, sheet.data_rows());
        }

        OutputWorkbook { sheets }
    }

    fn dashboard(
        &self,
        metrics: &KeyMetrics,
        account_summary: Option<&[AccountSummaryLine]>,
    ) -> OutputSheet {
        let mut ws = OutputSheet::new(DASHBOARD);
        let section = CellStyle::SectionHeader { fill: SECTION_FILL };

        ws.write(0, 0, self.title, CellStyle::Title);
        ws.merge(0, 0, 0, 5);
        ws.write(
            1,
            0,
            format!("Generated: {}", format_long_date(self.generated_on)),
            CellStyle::Subtitle,
        );

        ws.write(3, 0, "KEY FINANCIAL METRICS", section);
        ws.merge(3, 0, 3, 5);

        let mut row = 5;
        for (label, value) in metrics.display_rows() {
            ws.write(row, 0, label, CellStyle::Bold);
            ws.write(row, 1, value, CellStyle::Plain);
            row += 1;
        }

        ws.write(row + 1, 0, "ACCOUNT SUMMARY", section);
        ws.merge(row + 1, 0, row + 1, 5);

        let start = row + 3;
        match account_summary {
            None => ws.write(start, 0, "No account data available", CellStyle::Plain),
            Some(lines) => {
                ws.write_headers(start, &DASHBOARD_SUMMARY_HEADERS, CellStyle::Bold);
                for (offset, line) in lines.iter().enumerate() {
                    let r = start + 1 + offset as u32;
                    ws.write(r, 0, line.account_type.as_str(), CellStyle::Plain);
                    ws.write(r, 1, format_currency(line.balance), CellStyle::Plain);
                    if let Some(change) = line.change_ratio {
                        ws.write(r, 2, format_ratio_as_percent(change, 1), CellStyle::Plain);
                    }
                }
            }
        }

        ws
    }
}

fn transaction_log(transactions: &[Transaction]) -> OutputSheet {
    let mut ws = OutputSheet::new(TRANSACTION_LOG);
    ws.write_headers(
        0,
        &TRANSACTION_LOG_HEADERS,
        CellStyle::ColumnHeader { fill: 0xD9E2F3 },
    );

    for (idx, t) in transactions.iter().enumerate() {
        let r = idx as u32 + 1;
        ws.write(r, 0, &t.date, CellStyle::Plain);
        ws.write(r, 1, t.company.clone().unwrap_or_default(), CellStyle::Plain);
        ws.write(
            r,
            2,
            t.original_category.clone().unwrap_or_default(),
            CellStyle::Plain,
        );
        ws.write(r, 3, t.standardized_category.label(), CellStyle::Plain);
        ws.write(r, 4, t.kind.label(), CellStyle::Plain);
        ws.write(r, 5, t.full_amount, CellStyle::Plain);
        ws.write(r, 6, t.split_amount, CellStyle::Plain);
    }

    ws
}

fn monthly_summary(months: &[MonthlySummary]) -> OutputSheet {
    let mut ws = OutputSheet::new(MONTHLY_SUMMARY);
    ws.write_headers(
        0,
        &MONTHLY_SUMMARY_HEADERS,
        CellStyle::ColumnHeader { fill: 0xE2EFDA },
    );

    for (idx, m) in months.iter().enumerate() {
        let r = idx as u32 + 1;
        ws.write(r, 0, &m.month_start, CellStyle::Plain);
        ws.write(r, 1, m.net_income, CellStyle::Plain);
        ws.write(r, 2, m.personal_expenses, CellStyle::Plain);
        ws.write(r, 3, m.shared_expenses_half, CellStyle::Plain);
        ws.write(r, 4, m.total_expenses, CellStyle::Plain);
        ws.write(r, 5, m.net_savings, CellStyle::Plain);
        ws.write(r, 6, format_percent(m.savings_rate_pct, 1), CellStyle::Plain);
    }

    ws
}

fn account_balances(accounts: &[ConsolidatedAccountRow]) -> OutputSheet {
    let mut ws = OutputSheet::new(ACCOUNT_BALANCES);
    ws.write_headers(
        0,
        &ACCOUNT_BALANCES_HEADERS,
        CellStyle::ColumnHeader { fill: 0xFFF2CC },
    );

    for (idx, a) in accounts.iter().enumerate() {
        let r = idx as u32 + 1;
        ws.write(r, 0, a.account_name.as_str(), CellStyle::Plain);
        ws.write(r, 1, a.account_type.as_str(), CellStyle::Plain);
        ws.write(r, 2, a.current_balance, CellStyle::Plain);
        if let Some(previous) = a.previous_balance {
            ws.write(r, 3, previous, CellStyle::Plain);
        }
        if let Some(change) = a.change_amount {
            ws.write(r, 4, change, CellStyle::Plain);
        }
        if let Some(ratio) = a.change_ratio {
            ws.write(r, 5, format_ratio_as_percent(ratio, 2), CellStyle::Plain);
        }
        if let Some(updated) = &a.last_updated {
            ws.write(r, 6, updated, CellStyle::Plain);
        }
    }

    ws
}

fn debt_tracking(debts: &[ConsolidatedDebtRow]) -> OutputSheet {
    let mut ws = OutputSheet::new(DEBT_TRACKING);
    ws.write_headers(
        0,
        &DEBT_TRACKING_HEADERS,
        CellStyle::ColumnHeader { fill: 0xFCE4D6 },
    );

    for (idx, d) in debts.iter().enumerate() {
        let r = idx as u32 + 1;
        ws.write(r, 0, d.debt_type.as_str(), CellStyle::Plain);
        ws.write(r, 1, d.current_balance, CellStyle::Plain);
        if let Some(payment) = d.monthly_payment {
            ws.write(r, 2, payment, CellStyle::Plain);
        }
        if let Some(rate) = d.interest_rate {
            ws.write(r, 3, format_ratio_as_percent(rate, 2), CellStyle::Plain);
        }
        if let Some(payoff) = &d.payoff_date {
            ws.write(r, 4, payoff, CellStyle::Plain);
        }
        if let Some(interest) = d.total_interest {
            ws.write(r, 5, interest, CellStyle::Plain);
        }
        if let Some(updated) = &d.last_updated {
            ws.write(r, 6, updated, CellStyle::Plain);
        }
    }

    ws
}

/// Budget template: one zeroed row per mapped category with live variance
/// formulas, a blank row, then a totals row.
fn budget_planning() -> OutputSheet {
    let mut ws = OutputSheet::new(BUDGET_PLANNING);
    ws.write_headers(
        0,
        &BUDGET_PLANNING_HEADERS,
        CellStyle::ColumnHeader { fill: 0xDDEBF7 },
    );

    let budgeted = 0.0;
    let actual = 0.0;
    let mut r = 1;
    for category in StandardCategory::MAPPED {
        // Formulas use 1-based Excel row numbers.
        let n = r + 1;
        ws.write(r, 0, category.label(), CellStyle::Plain);
        ws.write(r, 1, budgeted, CellStyle::Plain);
        ws.write(r, 2, actual, CellStyle::Plain);
        ws.write(
            r,
            3,
            OutputValue::Formula {
                formula: format!("=B{n}-C{n}"),
                cached: budgeted - actual,
            },
            CellStyle::Plain,
        );
        ws.write(
            r,
            4,
            OutputValue::Formula {
                formula: format!("=IF(B{n}=0,0,(C{n}-B{n})/B{n}*100)"),
                cached: variance_pct(budgeted, actual),
            },
            CellStyle::Plain,
        );
        r += 1;
    }

    let last_data_row = r;
    let total_row = r + 1;
    ws.write(total_row, 0, "TOTAL", CellStyle::Bold);
    for (col, letter) in [(1u16, 'B'), (2, 'C'), (3, 'D')] {
        ws.write(
            total_row,
            col,
            OutputValue::Formula {
                formula: format!("=SUM({letter}2:{letter}{last_data_row})"),
                cached: 0.0,
            },
            CellStyle::Plain,
        );
    }

    ws
}

/// (actual - budgeted) / budgeted * 100, or 0 when nothing was budgeted.
pub fn variance_pct(budgeted: f64, actual: f64) -> f64 {
    if budgeted == 0.0 {
        0.0
    } else {
        (actual - budgeted) / budgeted * 100.0
    }
}

fn category_analysis(totals: &[CategoryTotal]) -> OutputSheet {
    let mut ws = OutputSheet::new(CATEGORY_ANALYSIS);
    ws.write_headers(
        0,
        &CATEGORY_ANALYSIS_HEADERS,
        CellStyle::ColumnHeader { fill: 0xE2E2E2 },
    );

    let total = grand_total(totals);
    let mut r = 1;
    for t in totals {
        let share = if total != 0.0 {
            format_percent(t.pct_of_total, 1)
        } else {
            "0%".to_string()
        };
        ws.write(r, 0, t.category.label(), CellStyle::Plain);
        ws.write(r, 1, t.total_amount, CellStyle::Plain);
        ws.write(r, 2, share, CellStyle::Plain);
        ws.write(r, 3, t.avg_monthly, CellStyle::Plain);
        r += 1;
    }

    ws.write(r, 0, "TOTAL", CellStyle::Bold);
    ws.write(r, 1, total, CellStyle::Plain);
    ws.write(r, 2, "100.0%", CellStyle::Plain);

    ws
}
