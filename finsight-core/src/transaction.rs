//! Normalized transaction as returned by the statement-ingestion service

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sign of a movement as reported by the service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money in
    Credit,
    /// Money out
    Debit,
}

/// A transaction owned by the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(rename = "transaction_id")]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub account: String,
    /// Booking date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Signed amount; credits positive, debits negative
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub description: String,
    pub direction: Direction,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub is_fee: bool,
    #[serde(default)]
    pub is_tax: bool,
    /// Matched internal transfer; excluded from income/expense figures
    #[serde(default)]
    pub neutralized: bool,
}

impl Transaction {
    /// Create a transaction with the remaining fields defaulted
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        amount: f64,
        direction: Direction,
        category: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            source: String::new(),
            account: String::new(),
            date,
            amount,
            currency: "ARS".to_string(),
            description: description.into(),
            direction,
            merchant: None,
            category: category.map(str::to_string),
            subcategory: None,
            balance: None,
            is_transfer: false,
            is_fee: false,
            is_tax: false,
            neutralized: false,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.direction == Direction::Debit
    }

    pub fn is_income(&self) -> bool {
        self.direction == Direction::Credit
    }

    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }

    /// Counted in dashboard figures
    pub fn counts_toward_flow(&self) -> bool {
        !self.neutralized
    }

    pub fn category_or_default(&self) -> &str {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Uncategorized")
    }
}
