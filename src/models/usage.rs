//! Prediction usage quota records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// Stored quota counter for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: UserId,
    pub usage_count: u32,
    pub max_usage: u32,
    pub reset_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// End of a quota window; saturates instead of overflowing
fn window_end(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    Duration::try_days(window_days)
        .and_then(|window| now.checked_add_signed(window))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl UsageRecord {
    pub fn new(user_id: UserId, max_usage: u32, window_days: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            usage_count: 0,
            max_usage,
            reset_date: window_end(now, window_days),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn needs_reset(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_date
    }

    /// Zero the counter and start a new window at `now`
    pub fn reset(&mut self, window_days: i64, now: DateTime<Utc>) {
        self.usage_count = 0;
        self.reset_date = window_end(now, window_days);
        self.updated_at = now;
    }
}

/// Quota view returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStatus {
    pub user_id: UserId,
    pub current_usage: u32,
    pub max_usage: u32,
    pub reset_date: DateTime<Utc>,
    pub exceeded: bool,
    pub remaining: u32,
}

impl UsageStatus {
    pub fn new(user_id: UserId, current_usage: u32, max_usage: u32, reset_date: DateTime<Utc>) -> Self {
        Self {
            user_id,
            current_usage,
            max_usage,
            reset_date,
            exceeded: current_usage >= max_usage,
            remaining: max_usage.saturating_sub(current_usage),
        }
    }
}

/// Aggregate quota figures across all users
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageStatistics {
    pub total_users: usize,
    pub average_usage: f64,
    pub users_at_limit: usize,
    pub users_over_limit: usize,
    pub users_needing_reset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derives_exceeded_and_remaining() {
        let now = Utc::now();
        let status = UsageStatus::new(UserId::new(), 5, 5, now);
        assert!(status.exceeded);
        assert_eq!(status.remaining, 0);

        let status = UsageStatus::new(UserId::new(), 2, 5, now);
        assert!(!status.exceeded);
        assert_eq!(status.remaining, 3);
    }

    #[test]
    fn test_reset_moves_window() {
        let start = Utc::now();
        let mut record = UsageRecord::new(UserId::new(), 5, 30, start);
        record.usage_count = 4;

        let later = start + Duration::days(31);
        assert!(record.needs_reset(later));
        record.reset(30, later);
        assert_eq!(record.usage_count, 0);
        assert_eq!(record.reset_date, later + Duration::days(30));
        assert!(!record.needs_reset(later));
    }

    #[test]
    fn test_huge_window_saturates() {
        let now = Utc::now();
        let record = UsageRecord::new(UserId::new(), 5, i64::MAX, now);
        assert_eq!(record.reset_date, DateTime::<Utc>::MAX_UTC);
        assert!(!record.needs_reset(now));
    }
}
