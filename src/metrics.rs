//! Headline figures for the Dashboard tab.
//!
//! Every metric is computed independently and carries its own outcome, so a
//! malformed column degrades that one figure instead of the whole dashboard.

use crate::schema::SourceLayout;
use crate::sheets::{NonNumericCell, SourceSheet, SourceWorkbook};
use crate::utils::format_currency;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INCOMPLETE_NOTE_LABEL: &str = "Note";
pub const INCOMPLETE_NOTE: &str = "Some metrics may be incomplete due to data structure";

const AMOUNT_COLUMN: &str = "Amount";
const BALANCE_COLUMN: &str = "Balance";
const NET_PAY_COLUMN: &str = "Net Pay";
const PRICE_COLUMN: &str = "price";
const SHARED_EXPENSE_SHARE: f64 = 0.5;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricError {
    #[error("{metric}: non-numeric value '{value}' in '{column}' of '{sheet}' (row {row})")]
    NonNumeric {
        metric: String,
        sheet: String,
        column: String,
        row: usize,
        value: String,
    },
}

impl MetricError {
    fn non_numeric(metric: &str, cell: NonNumericCell) -> Self {
        MetricError::NonNumeric {
            metric: metric.to_string(),
            sheet: cell.sheet,
            column: cell.column,
            row: cell.row,
            value: cell.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricOutcome {
    Value(f64),
    /// The inputs for this metric are not in the workbook.
    Unavailable,
    Failed(MetricError),
}

impl MetricOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricOutcome::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MetricError> {
        match self {
            MetricOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub total_assets: MetricOutcome,
    pub total_debt: MetricOutcome,
    pub net_worth: MetricOutcome,
    pub latest_net_pay: MetricOutcome,
    pub total_tracked_expenses: MetricOutcome,
}

impl KeyMetrics {
    pub fn compute(workbook: &SourceWorkbook, layout: &SourceLayout) -> Self {
        let total_assets = column_total(
            "Total Assets",
            workbook.load(&layout.account_balances),
            AMOUNT_COLUMN,
        );
        let total_debt = column_total(
            "Total Debt",
            workbook.load(&layout.debt_summary),
            BALANCE_COLUMN,
        );
        let net_worth = net_worth(&total_assets, &total_debt);
        let latest_net_pay = latest_net_pay(workbook.load(&layout.income));
        let total_tracked_expenses = tracked_expenses(
            workbook.load(&layout.personal_expenses),
            workbook.load(&layout.shared_expenses),
        );

        let metrics = Self {
            total_assets,
            total_debt,
            net_worth,
            latest_net_pay,
            total_tracked_expenses,
        };

        for failure in metrics.failures() {
            warn!("Metric unavailable: {}", failure);
        }
        debug!("Computed key metrics: {:?}", metrics);

        metrics
    }

    fn labelled(&self) -> [(&'static str, &MetricOutcome); 5] {
        [
            ("Total Assets", &self.total_assets),
            ("Total Debt", &self.total_debt),
            ("Net Worth", &self.net_worth),
            ("Latest Monthly Net Pay", &self.latest_net_pay),
            ("Total Tracked Expenses", &self.total_tracked_expenses),
        ]
    }

    pub fn failures(&self) -> Vec<&MetricError> {
        self.labelled()
            .into_iter()
            .filter_map(|(_, outcome)| outcome.error())
            .collect()
    }

    /// Dashboard rows in fixed order: one per available metric, then a single
    /// note row if any metric failed.
    pub fn display_rows(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = self
            .labelled()
            .into_iter()
            .filter_map(|(label, outcome)| {
                outcome
                    .value()
                    .map(|v| (label.to_string(), format_currency(v)))
            })
            .collect();

        if !self.failures().is_empty() {
            rows.push((
                INCOMPLETE_NOTE_LABEL.to_string(),
                INCOMPLETE_NOTE.to_string(),
            ));
        }

        rows
    }
}

fn column_total(metric: &str, sheet: Option<&SourceSheet>, column: &str) -> MetricOutcome {
    match sheet {
        Some(sheet) if sheet.has_column(column) => match sheet.sum_column(column) {
            Ok(total) => MetricOutcome::Value(total),
            Err(cell) => MetricOutcome::Failed(MetricError::non_numeric(metric, cell)),
        },
        _ => MetricOutcome::Unavailable,
    }
}

/// Only reported when both totals exist and assets are positive.
fn net_worth(total_assets: &MetricOutcome, total_debt: &MetricOutcome) -> MetricOutcome {
    match (total_assets.value(), total_debt.value()) {
        (Some(assets), Some(debt)) if assets > 0.0 => MetricOutcome::Value(assets - debt),
        _ => MetricOutcome::Unavailable,
    }
}

fn latest_net_pay(income: Option<&SourceSheet>) -> MetricOutcome {
    let Some(sheet) = income else {
        return MetricOutcome::Unavailable;
    };

    match sheet.latest_by_append_order(NET_PAY_COLUMN) {
        None => MetricOutcome::Unavailable,
        Some((idx, row)) => match row.number(NET_PAY_COLUMN) {
            Some(pay) => MetricOutcome::Value(pay),
            None => MetricOutcome::Failed(MetricError::NonNumeric {
                metric: "Latest Monthly Net Pay".to_string(),
                sheet: sheet.name.clone(),
                column: NET_PAY_COLUMN.to_string(),
                row: idx + 1,
                value: row.text(NET_PAY_COLUMN).unwrap_or_default(),
            }),
        },
    }
}

/// Personal prices in full plus half of shared prices. Reported when at
/// least one of the two expense sheets exists; a missing sheet or price
/// column contributes zero.
fn tracked_expenses(
    personal: Option<&SourceSheet>,
    shared: Option<&SourceSheet>,
) -> MetricOutcome {
    if personal.is_none() && shared.is_none() {
        return MetricOutcome::Unavailable;
    }

    let price_total = |sheet: Option<&SourceSheet>| -> Result<f64, NonNumericCell> {
        match sheet {
            Some(sheet) if sheet.has_column(PRICE_COLUMN) => sheet.sum_column(PRICE_COLUMN),
            _ => Ok(0.0),
        }
    };

    let totals = price_total(personal).and_then(|personal_total| {
        price_total(shared).map(|shared_total| personal_total + shared_total * SHARED_EXPENSE_SHARE)
    });

    match totals {
        Ok(total) => MetricOutcome::Value(total),
        Err(cell) => MetricOutcome::Failed(MetricError::non_numeric("Total Tracked Expenses", cell)),
    }
}
