use crate::error::{Result, StreamlinerError};
use crate::xlsx::AutofitBounds;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Names of the source sheets the streamliner reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct SourceLayout {
    #[schemars(description = "Summary of balances per asset category (columns: Asset Category, Amount, 3-Month Change)")]
    pub account_balances: String,

    #[schemars(description = "Summary of debts (columns: Debt Type, Balance, Monthly Payment, Interest Rate)")]
    pub debt_summary: String,

    #[schemars(description = "Pay history, one row per pay period, appended in chronological order (column: Net Pay)")]
    pub income: String,

    #[schemars(description = "Per-month income and expenses (columns: Start Date, Net Pay, Personal Expenses, 50% Shared Expenses)")]
    pub income_vs_expenses: String,

    #[schemars(description = "Itemized personal expenses attributed in full (columns: date, company, category, price)")]
    pub personal_expenses: String,

    #[schemars(description = "Itemized shared expenses split 50/50 (columns: date, company, category, price)")]
    pub shared_expenses: String,

    #[schemars(description = "Individually held assets (columns: Name, Type, Balance)")]
    pub personal_assets: String,

    #[schemars(
        description = "Per-debt history sheets, appended chronologically (columns: date, current debt amount, payment). Consolidated in this order."
    )]
    pub debt_details: Vec<String>,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            account_balances: "Account Balances".to_string(),
            debt_summary: "Debt Summary".to_string(),
            income: "Income".to_string(),
            income_vs_expenses: "Income vs Expenses".to_string(),
            personal_expenses: "Personal Expenses Detail".to_string(),
            shared_expenses: "Shared Expenses Detail".to_string(),
            personal_assets: "Katherine Assets".to_string(),
            debt_details: vec![
                "Car".to_string(),
                "Credit Line".to_string(),
                "Home Energy".to_string(),
                "Mortgage".to_string(),
            ],
        }
    }
}

impl SourceLayout {
    fn named_sheets(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("account_balances", self.account_balances.as_str()),
            ("debt_summary", self.debt_summary.as_str()),
            ("income", self.income.as_str()),
            ("income_vs_expenses", self.income_vs_expenses.as_str()),
            ("personal_expenses", self.personal_expenses.as_str()),
            ("shared_expenses", self.shared_expenses.as_str()),
            ("personal_assets", self.personal_assets.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct StreamlinerConfig {
    #[schemars(description = "Where each kind of data lives in the source workbook")]
    pub layout: SourceLayout,

    #[schemars(description = "Title written across the top of the Dashboard tab")]
    pub title: String,

    #[schemars(description = "Upper bound for auto-fitted column widths, in characters")]
    pub autofit_max_width: f64,

    #[schemars(description = "Lower bound for auto-fitted column widths, in characters")]
    pub autofit_min_width: f64,
}

impl Default for StreamlinerConfig {
    fn default() -> Self {
        Self {
            layout: SourceLayout::default(),
            title: "Financial Dashboard - Executive Summary".to_string(),
            autofit_max_width: 30.0,
            autofit_min_width: 10.0,
        }
    }
}

impl StreamlinerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn autofit_bounds(&self) -> AutofitBounds {
        AutofitBounds {
            min: self.autofit_min_width,
            max: self.autofit_max_width,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StreamlinerConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, sheet) in self.layout.named_sheets() {
            if sheet.trim().is_empty() {
                return Err(StreamlinerError::InvalidConfig(format!(
                    "layout.{} must name a sheet",
                    field
                )));
            }
        }

        if let Some(idx) = self
            .layout
            .debt_details
            .iter()
            .position(|name| name.trim().is_empty())
        {
            return Err(StreamlinerError::InvalidConfig(format!(
                "layout.debt_details[{}] must name a sheet",
                idx
            )));
        }

        if self.autofit_min_width <= 0.0 || self.autofit_min_width > self.autofit_max_width {
            return Err(StreamlinerError::InvalidConfig(format!(
                "autofit widths must satisfy 0 < min ({}) <= max ({})",
                self.autofit_min_width, self.autofit_max_width
            )));
        }

        Ok(())
    }
}
