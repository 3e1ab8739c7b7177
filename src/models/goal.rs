//! Savings goal model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{GoalId, UserId};
use super::money::Money;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A savings goal row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Money,
    pub current_amount: Money,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

impl Goal {
    /// Create a goal with nothing saved yet
    pub fn new(user_id: UserId, name: impl Into<String>, target_amount: Money) -> Self {
        Self {
            id: GoalId::new(),
            user_id,
            name: name.into(),
            target_amount,
            current_amount: Money::zero(),
            target_date: None,
        }
    }

    pub fn with_current(mut self, current: Money) -> Self {
        self.current_amount = current;
        self
    }

    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    /// `current / target * 100`, or 0 for a goal without a target
    pub fn progress_percentage(&self) -> f64 {
        self.current_amount.percent_of(self.target_amount)
    }

    /// Percentage a previous saved amount represented against this goal's target
    pub fn percentage_for(&self, amount: Money) -> f64 {
        amount.percent_of(self.target_amount)
    }

    /// Whole days until the target date, rounded up
    ///
    /// The deadline is midnight UTC at the start of `target_date`. Returns
    /// `None` for goals without a target date; past deadlines are negative or 0.
    pub fn days_until_deadline(&self, now: DateTime<Utc>) -> Option<i64> {
        let deadline = self.target_date?.and_hms_opt(0, 0, 0)?.and_utc();
        let seconds = (deadline - now).num_milliseconds() as f64 / 1000.0;
        Some((seconds / SECONDS_PER_DAY).ceil() as i64)
    }
}
