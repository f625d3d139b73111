use crate::categories::{normalize, StandardCategory, UnmappedTally};
use crate::sheets::{CellValue, SourceSheet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const DATE_COLUMN: &str = "date";
const COMPANY_COLUMN: &str = "company";
const CATEGORY_COLUMN: &str = "category";
const PRICE_COLUMN: &str = "price";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Paid and attributed in full.
    Personal,
    /// Split evenly with a partner; half is attributed.
    Shared,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Personal => "Personal",
            TransactionKind::Shared => "Shared (50%)",
        }
    }

    /// Fraction of the full amount attributed to the tracked person.
    pub fn share(&self) -> f64 {
        match self {
            TransactionKind::Personal => 1.0,
            TransactionKind::Shared => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: CellValue,
    pub company: Option<String>,
    pub original_category: Option<String>,
    pub standardized_category: StandardCategory,
    pub kind: TransactionKind,
    pub full_amount: f64,
    pub split_amount: f64,
}

impl Transaction {
    fn from_row(sheet: &SourceSheet, idx: usize, kind: TransactionKind) -> Option<Self> {
        let row = sheet.rows.get(idx)?;
        let date = row.get(DATE_COLUMN)?.clone();
        let original_category = row.text(CATEGORY_COLUMN);
        let standardized_category = normalize(original_category.as_deref());
        let full_amount = sheet.number_or_zero(idx, PRICE_COLUMN);

        Some(Self {
            date,
            company: row.text(COMPANY_COLUMN),
            original_category,
            standardized_category,
            kind,
            full_amount,
            split_amount: full_amount * kind.share(),
        })
    }
}

/// The unified transaction log plus what was dropped or unmapped on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedTransactions {
    /// Personal rows first, then shared rows, each in source order.
    pub transactions: Vec<Transaction>,
    pub skipped_without_date: usize,
    pub unmapped: UnmappedTally,
}

impl MergedTransactions {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

pub fn merge(personal: Option<&SourceSheet>, shared: Option<&SourceSheet>) -> MergedTransactions {
    let mut merged = MergedTransactions::default();

    for (sheet, kind) in [
        (personal, TransactionKind::Personal),
        (shared, TransactionKind::Shared),
    ] {
        let Some(sheet) = sheet else {
            continue;
        };

        for idx in 0..sheet.rows.len() {
            match Transaction::from_row(sheet, idx, kind) {
                Some(transaction) => {
                    if transaction.standardized_category.is_other() {
                        merged.unmapped.record(transaction.original_category.as_deref());
                    }
                    merged.transactions.push(transaction);
                }
                None => merged.skipped_without_date += 1,
            }
        }

        debug!(
            "Merged '{}' as {} transactions",
            sheet.name,
            kind.label()
        );
    }

    if merged.skipped_without_date > 0 {
        warn!(
            "Skipped {} expense rows without a date",
            merged.skipped_without_date
        );
    }

    merged
}
