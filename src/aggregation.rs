use crate::categories::StandardCategory;
use crate::sheets::{CellValue, SourceSheet};
use crate::transactions::{Transaction, TransactionKind};
use serde::{Deserialize, Serialize};

const START_DATE_COLUMN: &str = "Start Date";
const NET_PAY_COLUMN: &str = "Net Pay";
const PERSONAL_EXPENSES_COLUMN: &str = "Personal Expenses";
const SHARED_EXPENSES_COLUMN: &str = "50% Shared Expenses";

/// Category averages divide by a full year regardless of how many months
/// the data actually spans.
pub const AVERAGE_MONTHS_DIVISOR: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month_start: CellValue,
    pub net_income: f64,
    pub personal_expenses: f64,
    pub shared_expenses_half: f64,
    pub total_expenses: f64,
    pub net_savings: f64,
    pub savings_rate_pct: f64,
}

/// One summary per income/expense row that has a start date, in source order.
pub fn monthly_summaries(income_vs_expenses: Option<&SourceSheet>) -> Vec<MonthlySummary> {
    let Some(sheet) = income_vs_expenses else {
        return Vec::new();
    };

    sheet
        .rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let month_start = row.get(START_DATE_COLUMN)?.clone();
            let net_income = sheet.number_or_zero(idx, NET_PAY_COLUMN);
            let personal_expenses = sheet.number_or_zero(idx, PERSONAL_EXPENSES_COLUMN);
            let shared_expenses_half = sheet.number_or_zero(idx, SHARED_EXPENSES_COLUMN);

            let total_expenses = personal_expenses + shared_expenses_half;
            let net_savings = net_income - total_expenses;
            let savings_rate_pct = if net_income > 0.0 {
                net_savings / net_income * 100.0
            } else {
                0.0
            };

            Some(MonthlySummary {
                month_start,
                net_income,
                personal_expenses,
                shared_expenses_half,
                total_expenses,
                net_savings,
                savings_rate_pct,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: StandardCategory,
    pub total_amount: f64,
    pub pct_of_total: f64,
    pub avg_monthly: f64,
}

/// Attributed amount of a transaction: the full price for personal
/// spending, the split half for shared spending.
fn attributed_amount(transaction: &Transaction) -> f64 {
    match transaction.kind {
        TransactionKind::Personal => transaction.full_amount,
        TransactionKind::Shared => transaction.split_amount,
    }
}

/// Totals per standardized category, largest first. Ties keep the order in
/// which the categories were first seen.
pub fn category_totals(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut sums: Vec<(StandardCategory, f64)> = Vec::new();
    for transaction in transactions {
        let amount = attributed_amount(transaction);
        match sums
            .iter_mut()
            .find(|(category, _)| *category == transaction.standardized_category)
        {
            Some((_, total)) => *total += amount,
            None => sums.push((transaction.standardized_category, amount)),
        }
    }

    let grand_total: f64 = sums.iter().map(|(_, total)| total).sum();
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));

    sums.into_iter()
        .map(|(category, total_amount)| CategoryTotal {
            category,
            total_amount,
            pct_of_total: if grand_total != 0.0 {
                total_amount / grand_total * 100.0
            } else {
                0.0
            },
            avg_monthly: total_amount / AVERAGE_MONTHS_DIVISOR,
        })
        .collect()
}

pub fn grand_total(totals: &[CategoryTotal]) -> f64 {
    totals.iter().map(|t| t.total_amount).sum()
}
