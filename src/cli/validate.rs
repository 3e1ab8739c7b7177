//! Prediction data validation command

use std::path::Path;

use crate::error::BudgetResult;
use crate::prediction::{load_transactions_csv, validate, FinancialProfile};

/// Validate a transaction CSV; returns whether it is usable for a forecast
pub fn handle_validate_command(file: &Path, show_profile: bool, json: bool) -> BudgetResult<bool> {
    let transactions = load_transactions_csv(file)?;
    let report = validate(&transactions);

    if json {
        let profile = show_profile.then(|| FinancialProfile::from_transactions(&transactions));
        let output = serde_json::json!({ "report": report, "profile": profile });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(report.valid);
    }

    println!("Transactions:  {}", report.transaction_count);
    println!("Date range:    {} days", report.date_range_days);
    println!("Categories:    {}", report.categories_count);
    println!("Income:        {}", report.income_transactions);
    println!("Expenses:      {}", report.expense_transactions);

    for error in &report.errors {
        println!("Error:   {}", error);
    }
    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    println!("{}", if report.valid { "Data is valid for prediction." } else { "Data is NOT valid for prediction." });

    if show_profile && !transactions.is_empty() {
        let profile = FinancialProfile::from_transactions(&transactions);
        println!();
        println!("Average monthly income:   {}", profile.avg_monthly_income);
        println!("Average monthly expenses: {}", profile.avg_monthly_expenses);
        println!("Savings rate:             {:.1}%", profile.savings_rate * 100.0);
        println!("Categories:               {}", profile.spending_categories.join(", "));
    }

    Ok(report.valid)
}
