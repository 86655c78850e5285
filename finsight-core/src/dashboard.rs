//! Dashboard Composer: summary figures and chart-ready series.
//!
//! The composer never draws anything. It turns a data source (the built-in
//! mock data or the user's transactions) into the series the chart renderers
//! consume.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::transaction::Transaction;

/// Income vs expenses for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPoint {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

impl FlowPoint {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

/// Total spend for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_savings: f64,
    /// Percent change of the latest month's net vs the month before
    pub change_vs_last_month: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub flow: Vec<FlowPoint>,
    pub categories: Vec<CategorySlice>,
}

#[derive(Debug, Clone, Copy)]
pub enum DashboardSource<'a> {
    Mock,
    Transactions(&'a [Transaction]),
}

const MOCK_FLOW: [(&str, f64, f64); 4] = [
    ("Oct", 4500.0, 3200.0),
    ("Nov", 5200.0, 4100.0),
    ("Dec", 4800.0, 3800.0),
    ("Jan", 6100.0, 4200.0),
];

const MOCK_CATEGORIES: [(&str, f64); 4] = [
    ("Housing", 2500.0),
    ("Food", 800.0),
    ("Transport", 400.0),
    ("Services", 1200.0),
];

impl Dashboard {
    pub fn compose(source: DashboardSource<'_>) -> Self {
        match source {
            DashboardSource::Mock => Self::mock(),
            DashboardSource::Transactions(txns) => Self::from_transactions(txns),
        }
    }

    /// Placeholder figures shown before any statement has been processed.
    pub fn mock() -> Self {
        Self {
            summary: Summary {
                total_income: 12_450.00,
                total_expenses: 8_120.30,
                net_savings: 4_329.70,
                change_vs_last_month: Some(34.8),
            },
            flow: MOCK_FLOW
                .iter()
                .map(|(month, income, expense)| FlowPoint {
                    month: month.to_string(),
                    income: *income,
                    expense: *expense,
                })
                .collect(),
            categories: MOCK_CATEGORIES
                .iter()
                .map(|(name, value)| CategorySlice {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    /// Aggregate the user's transactions. Neutralized transfers are skipped.
    pub fn from_transactions(txns: &[Transaction]) -> Self {
        let mut months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
        let mut by_category: HashMap<&str, f64> = HashMap::new();
        let mut total_income = 0.0;
        let mut total_expenses = 0.0;

        for tx in txns.iter().filter(|t| t.counts_toward_flow()) {
            let entry = months.entry((tx.date.year(), tx.date.month())).or_insert((0.0, 0.0));
            if tx.is_income() {
                entry.0 += tx.abs_amount();
                total_income += tx.abs_amount();
            } else {
                entry.1 += tx.abs_amount();
                total_expenses += tx.abs_amount();
                *by_category.entry(tx.category_or_default()).or_insert(0.0) += tx.abs_amount();
            }
        }

        let spans_years = match (months.keys().next(), months.keys().next_back()) {
            (Some(first), Some(last)) => first.0 != last.0,
            _ => false,
        };
        let change_vs_last_month = month_over_month(&months);

        let flow: Vec<FlowPoint> = months
            .into_iter()
            .map(|((year, month), (income, expense))| FlowPoint {
                month: month_label(year, month, spans_years),
                income,
                expense,
            })
            .collect();

        let mut categories: Vec<CategorySlice> = by_category
            .into_iter()
            .map(|(name, value)| CategorySlice {
                name: name.to_string(),
                value,
            })
            .collect();
        categories.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            summary: Summary {
                total_income,
                total_expenses,
                net_savings: total_income - total_expenses,
                change_vs_last_month,
            },
            flow,
            categories,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flow.is_empty() && self.categories.is_empty()
    }
}

/// `Jan`, or `Jan 25` when the series covers more than one year.
fn month_label(year: i32, month: u32, with_year: bool) -> String {
    let fmt = if with_year { "%b %y" } else { "%b" };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format(fmt).to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

/// Net change of the latest month against the calendar month before it.
/// `None` when that month has no data.
fn month_over_month(months: &BTreeMap<(i32, u32), (f64, f64)>) -> Option<f64> {
    let mut recent = months.iter().rev();
    let (last_key, (last_in, last_out)) = recent.next()?;
    let (prev_key, (prev_in, prev_out)) = recent.next()?;
    if next_month(*prev_key) != *last_key {
        return None;
    }
    let base = prev_in - prev_out;
    if base == 0.0 {
        return None;
    }
    let pct = ((last_in - last_out) - base) / base.abs() * 100.0;
    Some((pct * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Direction;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_mock_dashboard() {
        let dash = Dashboard::compose(DashboardSource::Mock);
        assert_eq!(dash.flow.len(), 4);
        assert_eq!(dash.flow[0].month, "Oct");
        assert_eq!(dash.flow[3].income, 6100.0);
        assert_eq!(dash.categories[0].name, "Housing");
        assert_eq!(dash.summary.net_savings, 4_329.70);
        assert_eq!(dash.summary.change_vs_last_month, Some(34.8));
    }

    #[test]
    fn test_aggregates_by_month_and_category() {
        let txns = vec![
            Transaction::new("1", d(2024, 12, 3), "salary", 1000.0, Direction::Credit, None),
            Transaction::new("2", d(2024, 12, 9), "rent", -400.0, Direction::Debit, Some("Housing")),
            Transaction::new("3", d(2025, 1, 3), "salary", 1200.0, Direction::Credit, None),
            Transaction::new("4", d(2025, 1, 5), "market", -150.0, Direction::Debit, Some("Food")),
            Transaction::new("5", d(2025, 1, 20), "rent", -400.0, Direction::Debit, Some("Housing")),
            Transaction::new("6", d(2025, 1, 22), "kiosk", -50.0, Direction::Debit, None),
        ];
        let dash = Dashboard::compose(DashboardSource::Transactions(&txns));

        assert_eq!(dash.flow.len(), 2);
        assert_eq!(dash.flow[0].month, "Dec 24");
        assert_eq!(dash.flow[0].income, 1000.0);
        assert_eq!(dash.flow[0].expense, 400.0);
        assert_eq!(dash.flow[1].month, "Jan 25");
        assert_eq!(dash.flow[1].expense, 600.0);

        let names: Vec<&str> = dash.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Housing", "Food", "Uncategorized"]);
        assert_eq!(dash.categories[0].value, 800.0);

        assert_eq!(dash.summary.total_income, 2200.0);
        assert_eq!(dash.summary.total_expenses, 1000.0);
        assert_eq!(dash.summary.net_savings, 1200.0);
        // net 600 -> 600
        assert_eq!(dash.summary.change_vs_last_month, Some(0.0));
    }

    #[test]
    fn test_neutralized_transfers_ignored() {
        let mut out = Transaction::new("1", d(2025, 2, 1), "to savings", -300.0, Direction::Debit, None);
        let mut back = Transaction::new("2", d(2025, 2, 2), "from checking", 300.0, Direction::Credit, None);
        out.neutralized = true;
        back.neutralized = true;
        let dash = Dashboard::from_transactions(&[out, back]);
        assert!(dash.is_empty());
        assert_eq!(dash.summary.net_savings, 0.0);
    }

    #[test]
    fn test_change_needs_two_months_and_nonzero_base() {
        let one = vec![Transaction::new("1", d(2025, 3, 1), "pay", 100.0, Direction::Credit, None)];
        assert_eq!(Dashboard::from_transactions(&one).summary.change_vs_last_month, None);

        let zero_base = vec![
            Transaction::new("1", d(2025, 3, 1), "pay", 100.0, Direction::Credit, None),
            Transaction::new("2", d(2025, 3, 2), "spend", -100.0, Direction::Debit, None),
            Transaction::new("3", d(2025, 4, 1), "pay", 100.0, Direction::Credit, None),
        ];
        assert_eq!(Dashboard::from_transactions(&zero_base).summary.change_vs_last_month, None);

        let growth = vec![
            Transaction::new("1", d(2025, 3, 1), "pay", 200.0, Direction::Credit, None),
            Transaction::new("2", d(2025, 4, 1), "pay", 300.0, Direction::Credit, None),
        ];
        assert_eq!(Dashboard::from_transactions(&growth).summary.change_vs_last_month, Some(50.0));
    }

    #[test]
    fn test_labels_single_year_omit_year() {
        let txns = vec![
            Transaction::new("1", d(2025, 3, 1), "pay", 200.0, Direction::Credit, None),
            Transaction::new("2", d(2025, 4, 1), "pay", 300.0, Direction::Credit, None),
        ];
        let labels: Vec<String> = Dashboard::from_transactions(&txns).flow.into_iter().map(|p| p.month).collect();
        assert_eq!(labels, vec!["Mar", "Apr"]);
    }

    #[test]
    fn test_same_month_a_year_apart() {
        let txns = vec![
            Transaction::new("1", d(2024, 1, 10), "pay", 1000.0, Direction::Credit, None),
            Transaction::new("2", d(2025, 1, 10), "pay", 3000.0, Direction::Credit, None),
        ];
        let dash = Dashboard::from_transactions(&txns);
        let labels: Vec<&str> = dash.flow.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(labels, vec!["Jan 24", "Jan 25"]);
        assert_eq!(dash.summary.change_vs_last_month, None);
    }

    #[test]
    fn test_change_skips_gap_months() {
        let gap = vec![
            Transaction::new("1", d(2025, 2, 1), "pay", 200.0, Direction::Credit, None),
            Transaction::new("2", d(2025, 4, 1), "pay", 300.0, Direction::Credit, None),
        ];
        assert_eq!(Dashboard::from_transactions(&gap).summary.change_vs_last_month, None);

        // adjacent across the year boundary still compares
        let year_end = vec![
            Transaction::new("1", d(2024, 12, 1), "pay", 200.0, Direction::Credit, None),
            Transaction::new("2", d(2025, 1, 1), "pay", 300.0, Direction::Credit, None),
        ];
        assert_eq!(Dashboard::from_transactions(&year_end).summary.change_vs_last_month, Some(50.0));
    }
}
