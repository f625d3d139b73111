//! Flattens the per-asset and per-debt sheets into the Account Balances and
//! Debt Tracking tables.

use crate::schema::SourceLayout;
use crate::sheets::{CellValue, SourceSheet, SourceWorkbook};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const ASSET_NAME_COLUMN: &str = "Name";
const ASSET_TYPE_COLUMN: &str = "Type";
const ASSET_BALANCE_COLUMN: &str = "Balance";
const UNKNOWN_ASSET_TYPE: &str = "Unknown";

const ASSET_CATEGORY_COLUMN: &str = "Asset Category";
const AMOUNT_COLUMN: &str = "Amount";
const THREE_MONTH_CHANGE_COLUMN: &str = "3-Month Change";

const DEBT_TYPE_COLUMN: &str = "Debt Type";
const DEBT_BALANCE_COLUMN: &str = "Balance";
const MONTHLY_PAYMENT_COLUMN: &str = "Monthly Payment";
const INTEREST_RATE_COLUMN: &str = "Interest Rate";

const DETAIL_BALANCE_COLUMN: &str = "current debt amount";
const DETAIL_PAYMENT_COLUMN: &str = "payment";
const DETAIL_DATE_COLUMN: &str = "date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountSource {
    PersonalAsset,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedAccountRow {
    pub account_name: String,
    pub account_type: String,
    pub current_balance: f64,
    pub previous_balance: Option<f64>,
    pub change_amount: Option<f64>,
    /// Fractional change, 0.05 = 5%.
    pub change_ratio: Option<f64>,
    pub last_updated: Option<CellValue>,
    pub source: AccountSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DebtSource {
    Summary,
    /// Latest row of the named per-debt sheet.
    Detail(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedDebtRow {
    pub debt_type: String,
    pub current_balance: f64,
    pub monthly_payment: Option<f64>,
    /// Fractional annual rate, 0.065 = 6.5%.
    pub interest_rate: Option<f64>,
    pub payoff_date: Option<CellValue>,
    pub total_interest: Option<f64>,
    pub last_updated: Option<CellValue>,
    pub source: DebtSource,
}

/// One line of the Dashboard's account summary block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummaryLine {
    pub account_type: String,
    pub balance: f64,
    pub change_ratio: Option<f64>,
}

/// Personal asset rows as-is, then the account-balance summary rows
/// relabelled "<category> (Summary)". Rows without their key field are skipped.
pub fn consolidate_accounts(
    workbook: &SourceWorkbook,
    layout: &SourceLayout,
) -> Vec<ConsolidatedAccountRow> {
    let mut rows = Vec::new();

    if let Some(assets) = workbook.load(&layout.personal_assets) {
        for (idx, row) in assets.rows.iter().enumerate() {
            let Some(name) = row.text(ASSET_NAME_COLUMN) else {
                continue;
            };
            rows.push(ConsolidatedAccountRow {
                account_name: name,
                account_type: row
                    .text(ASSET_TYPE_COLUMN)
                    .unwrap_or_else(|| UNKNOWN_ASSET_TYPE.to_string()),
                current_balance: assets.number_or_zero(idx, ASSET_BALANCE_COLUMN),
                previous_balance: None,
                change_amount: None,
                change_ratio: None,
                last_updated: None,
                source: AccountSource::PersonalAsset,
            });
        }
    }

    if let Some(summary) = workbook.load(&layout.account_balances) {
        for (idx, row) in summary.rows.iter().enumerate() {
            let Some(category) = row.text(ASSET_CATEGORY_COLUMN) else {
                continue;
            };
            rows.push(ConsolidatedAccountRow {
                account_name: format!("{} (Summary)", category),
                account_type: category,
                current_balance: summary.number_or_zero(idx, AMOUNT_COLUMN),
                previous_balance: None,
                change_amount: None,
                change_ratio: row.number(THREE_MONTH_CHANGE_COLUMN),
                last_updated: None,
                source: AccountSource::Summary,
            });
        }
    }

    debug!("Consolidated {} account rows", rows.len());
    rows
}

/// Debt summary rows, then at most one row per detail sheet, in the layout's
/// fixed order. The detail row is the sheet's latest balance by append order.
pub fn consolidate_debts(workbook: &SourceWorkbook, layout: &SourceLayout) -> Vec<ConsolidatedDebtRow> {
    let mut rows = Vec::new();

    if let Some(summary) = workbook.load(&layout.debt_summary) {
        for (idx, row) in summary.rows.iter().enumerate() {
            let Some(debt_type) = row.text(DEBT_TYPE_COLUMN) else {
                continue;
            };
            rows.push(ConsolidatedDebtRow {
                debt_type,
                current_balance: summary.number_or_zero(idx, DEBT_BALANCE_COLUMN),
                monthly_payment: Some(summary.number_or_zero(idx, MONTHLY_PAYMENT_COLUMN)),
                interest_rate: row.number(INTEREST_RATE_COLUMN),
                payoff_date: None,
                total_interest: None,
                last_updated: None,
                source: DebtSource::Summary,
            });
        }
    }

    for sheet_name in &layout.debt_details {
        let Some(detail) = workbook.load(sheet_name) else {
            continue;
        };
        if let Some(row) = latest_detail_row(detail) {
            rows.push(row);
        }
    }

    debug!("Consolidated {} debt rows", rows.len());
    rows
}

fn latest_detail_row(detail: &SourceSheet) -> Option<ConsolidatedDebtRow> {
    if !detail.has_column(DETAIL_BALANCE_COLUMN) {
        warn!(
            "Debt sheet '{}' has no '{}' column; skipping",
            detail.name, DETAIL_BALANCE_COLUMN
        );
        return None;
    }

    let (idx, row) = detail.latest_by_append_order(DETAIL_BALANCE_COLUMN)?;
    let Some(balance) = row.number(DETAIL_BALANCE_COLUMN) else {
        warn!(
            "Debt sheet '{}' row {}: latest balance is not a number; skipping",
            detail.name,
            idx + 1
        );
        return None;
    };

    Some(ConsolidatedDebtRow {
        debt_type: format!("{} (Detailed)", detail.name),
        current_balance: balance,
        monthly_payment: row.number(DETAIL_PAYMENT_COLUMN),
        interest_rate: None,
        payoff_date: None,
        total_interest: None,
        last_updated: row.get(DETAIL_DATE_COLUMN).cloned(),
        source: DebtSource::Detail(detail.name.clone()),
    })
}

/// Account-balance rows that have both a category and an amount. `None`
/// when the sheet itself is missing.
pub fn account_summary(
    workbook: &SourceWorkbook,
    layout: &SourceLayout,
) -> Option<Vec<AccountSummaryLine>> {
    let sheet = workbook.load(&layout.account_balances)?;
    Some(
        sheet
            .rows
            .iter()
            .filter_map(|row| {
                Some(AccountSummaryLine {
                    account_type: row.text(ASSET_CATEGORY_COLUMN)?,
                    balance: row.number(AMOUNT_COLUMN)?,
                    change_ratio: row.number(THREE_MONTH_CHANGE_COLUMN),
                })
            })
            .collect(),
    )
}
