//! Budget model
//!
//! A spending limit for a category over a period. The backend keeps `spent`
//! current via triggers; this crate only reads it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, UserId};
use super::money::Money;

/// Length of a budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Quarterly => write!(f, "quarterly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

/// A budget row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    /// Display name, usually the category budgeted
    pub name: String,
    /// Limit for the period
    pub amount: Money,
    /// Spent so far in the period
    pub spent: Money,
    #[serde(default)]
    pub period: BudgetPeriod,
}

impl Budget {
    /// Create a budget with nothing spent
    pub fn new(user_id: UserId, name: impl Into<String>, amount: Money, period: BudgetPeriod) -> Self {
        Self {
            id: BudgetId::new(),
            user_id,
            name: name.into(),
            amount,
            spent: Money::zero(),
            period,
        }
    }

    /// Builder-style setter for the spent amount
    pub fn with_spent(mut self, spent: Money) -> Self {
        self.spent = spent;
        self
    }

    /// `spent / amount * 100`, or 0 for a budget without a limit
    pub fn spent_percentage(&self) -> f64 {
        self.spent.percent_of(self.amount)
    }

    /// Percentage a previous spent value represented against this budget's limit
    pub fn percentage_for(&self, spent: Money) -> f64 {
        spent.percent_of(self.amount)
    }

    /// Amount left before the limit is reached (negative when overspent)
    pub fn remaining(&self) -> Money {
        self.amount - self.spent
    }
}
