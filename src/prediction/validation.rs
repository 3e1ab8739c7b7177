//! Transaction data checks ahead of a forecast
//!
//! A forecast needs at least a week of history spread over at least seven
//! transactions. Thinner data still passes with warnings.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, BudgetResult};
use crate::models::Money;

pub const MIN_TRANSACTIONS: usize = 7;
pub const MIN_SPAN_DAYS: i64 = 7;
pub const RECOMMENDED_TRANSACTIONS: usize = 30;
pub const RECOMMENDED_SPAN_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    Income,
    Expense,
}

/// One historical transaction fed to the forecaster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionTransaction {
    pub date: NaiveDate,
    /// Always positive; direction comes from `flow`
    pub amount: Money,
    pub flow: FlowType,
    pub category: Option<String>,
}

#[derive(Deserialize)]
struct CsvRow {
    date: NaiveDate,
    amount: f64,
    #[serde(rename = "type")]
    flow: FlowType,
    #[serde(default)]
    category: Option<String>,
}

/// Read `date,amount,type,category` rows from a CSV file with a header
pub fn load_transactions_csv(path: &Path) -> BudgetResult<Vec<PredictionTransaction>> {
    let file = std::fs::File::open(path)
        .map_err(|e| BudgetError::Import(format!("Failed to open {}: {}", path.display(), e)))?;
    parse_transactions_csv(file)
}

pub fn parse_transactions_csv<R: Read>(input: R) -> BudgetResult<Vec<PredictionTransaction>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut transactions = Vec::new();

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        // header is line 1
        let line = index + 2;
        if row.amount <= 0.0 {
            return Err(BudgetError::Import(format!(
                "Line {}: amount must be positive, got {}",
                line, row.amount
            )));
        }
        transactions.push(PredictionTransaction {
            date: row.date,
            amount: Money::from_f64(row.amount),
            flow: row.flow,
            category: row.category.filter(|c| !c.is_empty()),
        });
    }

    Ok(transactions)
}

fn span_days(transactions: &[PredictionTransaction]) -> i64 {
    let first = transactions.iter().map(|t| t.date).min();
    let last = transactions.iter().map(|t| t.date).max();
    match (first, last) {
        (Some(first), Some(last)) => (last - first).num_days(),
        _ => 0,
    }
}

fn categories(transactions: &[PredictionTransaction]) -> BTreeSet<String> {
    transactions.iter().filter_map(|t| t.category.clone()).collect()
}

/// Data quality summary for a forecast request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub transaction_count: usize,
    pub date_range_days: i64,
    pub categories_count: usize,
    pub income_transactions: usize,
    pub expense_transactions: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

pub fn validate(transactions: &[PredictionTransaction]) -> ValidationReport {
    let transaction_count = transactions.len();
    let date_range_days = span_days(transactions);
    let income_transactions = transactions.iter().filter(|t| t.flow == FlowType::Income).count();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if transaction_count < MIN_TRANSACTIONS {
        errors.push(format!(
            "At least {} transactions are required, found {}",
            MIN_TRANSACTIONS, transaction_count
        ));
    } else if transaction_count < RECOMMENDED_TRANSACTIONS {
        warnings.push("Low transaction count may reduce prediction accuracy".to_string());
    }

    if date_range_days < MIN_SPAN_DAYS {
        errors.push(format!(
            "Transactions must span at least {} days, found {}",
            MIN_SPAN_DAYS, date_range_days
        ));
    } else if date_range_days < RECOMMENDED_SPAN_DAYS {
        warnings.push("Short date range may affect seasonal pattern detection".to_string());
    }

    if income_transactions == 0 {
        warnings.push("No income transactions found".to_string());
    }

    ValidationReport {
        valid: errors.is_empty(),
        transaction_count,
        date_range_days,
        categories_count: categories(transactions).len(),
        income_transactions,
        expense_transactions: transaction_count - income_transactions,
        warnings,
        errors,
    }
}

/// Monthly averages derived from transaction history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialProfile {
    pub avg_monthly_income: Money,
    pub avg_monthly_expenses: Money,
    /// Fraction of income kept, 0 when there is no income
    pub savings_rate: f64,
    pub spending_categories: Vec<String>,
    pub transaction_count: usize,
}

impl FinancialProfile {
    pub fn from_transactions(transactions: &[PredictionTransaction]) -> Self {
        let total = |flow: FlowType| -> Money {
            transactions.iter().filter(|t| t.flow == flow).map(|t| t.amount).sum()
        };
        let months = (span_days(transactions) as f64 / 30.0).max(1.0);

        let income = total(FlowType::Income).as_units() / months;
        let expenses = total(FlowType::Expense).as_units() / months;
        let savings_rate = if income > 0.0 {
            (income - expenses) / income
        } else {
            0.0
        };

        Self {
            avg_monthly_income: Money::from_f64(income),
            avg_monthly_expenses: Money::from_f64(expenses),
            savings_rate,
            spending_categories: categories(transactions).into_iter().collect(),
            transaction_count: transactions.len(),
        }
    }
}
