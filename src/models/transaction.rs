//! Transaction model
//!
//! Amounts are signed: negative for outflows, positive for inflows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{TransactionId, UserId};
use super::money::Money;

/// A transaction row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: Money,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    pub fn new(user_id: UserId, amount: Money, category: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: TransactionId::new(),
            user_id,
            amount,
            category: category.into(),
            date,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if this is an outflow
    pub fn is_outflow(&self) -> bool {
        self.amount.is_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outflow() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let txn = Transaction::new(UserId::new(), Money::from_units(-45), "Dining", date);
        assert!(txn.is_outflow());
        assert_eq!(txn.amount.abs(), Money::from_units(45));
    }
}
