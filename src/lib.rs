//! # Dashboard Streamliner
//!
//! Rewrites a sprawling personal-finance workbook into seven standardized
//! sheets: a dashboard, a unified transaction log, monthly rollups,
//! consolidated account and debt views, a budget template, and a category
//! breakdown.
//!
//! ## Core Concepts
//!
//! - **Source workbook**: loosely structured sheets read into rows keyed by
//!   column name; any sheet may be missing and any row may lack any field
//! - **Standardized categories**: free-text expense categories mapped onto a
//!   fixed set of 15 names, with everything else reported as "Other"
//! - **Personal vs shared spending**: personal expenses count in full, shared
//!   expenses count at 50%
//! - **Latest by append order**: income and debt-detail sheets are assumed to
//!   be appended chronologically, so the last populated row is the current one
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashboard_streamliner::*;
//! use chrono::Local;
//!
//! let streamliner = DashboardStreamliner::new(StreamlinerConfig::default())?;
//! let report = streamliner.run(
//!     "Finances.xlsx".as_ref(),
//!     "Finances_Streamlined.xlsx".as_ref(),
//!     Local::now().date_naive(),
//! )?;
//! for line in report.summary_lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod aggregation;
pub mod builder;
pub mod categories;
pub mod consolidation;
pub mod error;
pub mod inspect;
pub mod metrics;
pub mod schema;
pub mod sheets;
pub mod transactions;
pub mod utils;
pub mod xlsx;

pub use aggregation::{category_totals, monthly_summaries, CategoryTotal, MonthlySummary};
pub use builder::{
    BuilderInputs, CellStyle, OutputSheet, OutputValue, OutputWorkbook, WorkbookBuilder, TAB_NAMES,
};
pub use categories::{normalize, StandardCategory, UnmappedTally};
pub use consolidation::{
    account_summary, consolidate_accounts, consolidate_debts, AccountSummaryLine,
    ConsolidatedAccountRow, ConsolidatedDebtRow,
};
pub use error::{Result, StreamlinerError};
pub use inspect::{profile_workbook, TabCheck, WorkbookProfile};
pub use metrics::{KeyMetrics, MetricError, MetricOutcome};
pub use schema::*;
pub use sheets::{CellValue, LoadReport, SourceRow, SourceSheet, SourceWorkbook};
pub use transactions::{merge, MergedTransactions, Transaction, TransactionKind};
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info, Level};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything computed from the source workbook, before any layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamlineResults {
    pub metrics: KeyMetrics,
    pub account_summary: Option<Vec<AccountSummaryLine>>,
    pub merged: MergedTransactions,
    pub monthly: Vec<MonthlySummary>,
    pub accounts: Vec<ConsolidatedAccountRow>,
    pub debts: Vec<ConsolidatedDebtRow>,
    pub category_totals: Vec<CategoryTotal>,
}

/// What a completed run did, for the closing summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub load: LoadReport,
    pub tabs: Vec<String>,
    pub transactions: usize,
    pub skipped_without_date: usize,
    pub unmapped: UnmappedTally,
    pub metric_failures: usize,
}

impl RunReport {
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Streamlined workbook saved: {}",
            self.destination.display()
        )];

        lines.push(format!("Source sheets loaded: {}", self.load.loaded.len()));
        for (name, rows) in &self.load.loaded {
            lines.push(format!("  - {} ({} rows)", name, rows));
        }
        if !self.load.skipped.is_empty() {
            lines.push(format!("Source sheets skipped: {}", self.load.skipped.len()));
            for skipped in &self.load.skipped {
                lines.push(format!("  - {}: {}", skipped.name, skipped.reason));
            }
        }

        lines.push(format!("Tabs created: {}", self.tabs.len()));
        for tab in &self.tabs {
            lines.push(format!("  - {}", tab));
        }

        lines.push(format!(
            "Transactions merged: {} ({} without a date skipped)",
            self.transactions, self.skipped_without_date
        ));
        if self.metric_failures > 0 {
            lines.push(format!(
                "Metrics that could not be computed: {}",
                self.metric_failures
            ));
        }
        if !self.unmapped.is_empty() {
            lines.push(format!(
                "Unmapped categories reported as Other: {}",
                self.unmapped.total()
            ));
            for (raw, count) in &self.unmapped.counts {
                lines.push(format!("  - {}: {}", raw, count));
            }
        }

        lines.push(format!(
            "Standardized categories ({}):",
            StandardCategory::MAPPED.len()
        ));
        for (idx, category) in StandardCategory::MAPPED.iter().enumerate() {
            lines.push(format!("  {:>2}. {}", idx + 1, category));
        }

        lines
    }
}

pub struct DashboardStreamliner {
    config: StreamlinerConfig,
}

impl DashboardStreamliner {
    pub fn new(config: StreamlinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StreamlinerConfig {
        &self.config
    }

    /// The pure transform: no I/O, deterministic for a given workbook.
    pub fn streamline(&self, workbook: &SourceWorkbook) -> StreamlineResults {
        let layout = &self.config.layout;

        let metrics = KeyMetrics::compute(workbook, layout);
        let merged = merge(
            workbook.load(&layout.personal_expenses),
            workbook.load(&layout.shared_expenses),
        );
        let monthly = monthly_summaries(workbook.load(&layout.income_vs_expenses));
        let category_totals = category_totals(&merged.transactions);
        let accounts = consolidate_accounts(workbook, layout);
        let debts = consolidate_debts(workbook, layout);

        debug!(
            "Streamlined {} transactions, {} months, {} categories, {} accounts, {} debts",
            merged.len(),
            monthly.len(),
            category_totals.len(),
            accounts.len(),
            debts.len()
        );

        StreamlineResults {
            metrics,
            account_summary: account_summary(workbook, layout),
            merged,
            monthly,
            accounts,
            debts,
            category_totals,
        }
    }

    pub fn build_output(&self, results: &StreamlineResults, generated_on: NaiveDate) -> OutputWorkbook {
        let inputs = BuilderInputs {
            metrics: &results.metrics,
            account_summary: results.account_summary.as_deref(),
            transactions: &results.merged.transactions,
            monthly: &results.monthly,
            accounts: &results.accounts,
            debts: &results.debts,
            category_totals: &results.category_totals,
        };
        WorkbookBuilder::new(&self.config.title, generated_on).build(&inputs)
    }

    /// Reads `source`, streamlines it, and atomically writes `destination`.
    pub fn run(&self, source: &Path, destination: &Path, generated_on: NaiveDate) -> Result<RunReport> {
        info!("Loading source workbook: {}", source.display());
        let (workbook, load) = xlsx::read_workbook(source)?;
        WorkbookProfile::from_workbook(&workbook).log_summary(Level::Debug);

        let results = self.streamline(&workbook);
        let output = self.build_output(&results, generated_on);

        xlsx::write_workbook(&output, destination, self.config.autofit_bounds())?;
        info!("Saved streamlined workbook: {}", destination.display());

        Ok(RunReport {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            load,
            tabs: output.sheet_names().iter().map(|s| s.to_string()).collect(),
            transactions: results.merged.len(),
            skipped_without_date: results.merged.skipped_without_date,
            unmapped: results.merged.unmapped.clone(),
            metric_failures: results.metrics.failures().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::from(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn sample_workbook() -> SourceWorkbook {
        SourceWorkbook::from_sheets(vec![
            SourceSheet::from_rows(
                "Account Balances",
                vec![SourceRow::from_pairs([
                    ("Asset Category", CellValue::from("Cash")),
                    ("Amount", CellValue::from(5000.0)),
                ])],
            ),
            SourceSheet::from_rows(
                "Personal Expenses Detail",
                vec![SourceRow::from_pairs([
                    ("date", date(2024, 1, 5)),
                    ("category", CellValue::from("Golf")),
                    ("price", CellValue::from(80.0)),
                ])],
            ),
            SourceSheet::from_rows(
                "Shared Expenses Detail",
                vec![SourceRow::from_pairs([
                    ("date", date(2024, 1, 1)),
                    ("category", CellValue::from("Rent or Mortgage")),
                    ("price", CellValue::from(2000.0)),
                ])],
            ),
        ])
    }

    #[test]
    fn test_streamline_end_to_end_in_memory() {
        let streamliner = DashboardStreamliner::new(StreamlinerConfig::default()).unwrap();
        let results = streamliner.streamline(&sample_workbook());

        assert_eq!(results.merged.len(), 2);
        assert_eq!(results.category_totals[0].category, StandardCategory::Housing);
        assert_eq!(results.category_totals[0].total_amount, 1000.0);
        assert_eq!(results.metrics.total_tracked_expenses.value(), Some(1080.0));
        assert!(results.debts.is_empty());

        let output =
            streamliner.build_output(&results, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(output.sheet_names(), TAB_NAMES.to_vec());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = StreamlinerConfig::default();
        config.layout.debt_summary = String::new();
        assert!(matches!(
            DashboardStreamliner::new(config),
            Err(StreamlinerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_summary_lines_list_categories() {
        let mut unmapped = UnmappedTally::default();
        unmapped.record(Some("Crypto"));
        let report = RunReport {
            source: PathBuf::from("in.xlsx"),
            destination: PathBuf::from("out.xlsx"),
            load: LoadReport {
                loaded: vec![("Income".to_string(), 12)],
                skipped: Vec::new(),
            },
            tabs: TAB_NAMES.iter().map(|t| t.to_string()).collect(),
            transactions: 3,
            skipped_without_date: 1,
            unmapped,
            metric_failures: 0,
        };

        let lines = report.summary_lines();
        assert_eq!(lines[0], "Streamlined workbook saved: out.xlsx");
        assert!(lines.contains(&"  - Income (12 rows)".to_string()));
        assert!(lines.contains(&"Tabs created: 7".to_string()));
        assert!(lines.contains(&"  - crypto: 1".to_string()));
        assert!(lines.contains(&"Standardized categories (15):".to_string()));
        assert!(lines.contains(&"   1. Administrative".to_string()));
        assert!(lines.contains(&"  15. Travel".to_string()));
    }
}
