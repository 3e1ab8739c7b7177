//! Prediction usage quota
//!
//! Each user may run a fixed number of predictions per window. The window
//! restarts lazily: the first status check after the reset date zeroes the
//! counter and moves the reset date forward.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::settings::UsageSettings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{UsageRecord, UsageStatistics, UsageStatus, UserId};
use crate::storage::UsageRepository;

pub struct UsageTracker<'a> {
    repo: &'a UsageRepository,
    max_usage: u32,
    window_days: i64,
}

impl<'a> UsageTracker<'a> {
    pub fn new(repo: &'a UsageRepository, settings: &UsageSettings) -> Self {
        Self {
            repo,
            max_usage: settings.max_predictions,
            window_days: settings.reset_window_days,
        }
    }

    pub fn max_usage(&self) -> u32 {
        self.max_usage
    }

    pub fn status(&self, user_id: UserId) -> BudgetResult<UsageStatus> {
        self.status_at(user_id, Utc::now())
    }

    /// Current quota for `user_id`, creating or rolling over the record as needed
    pub fn status_at(&self, user_id: UserId, now: DateTime<Utc>) -> BudgetResult<UsageStatus> {
        let record = match self.repo.get(user_id)? {
            None => {
                let record = UsageRecord::new(user_id, self.max_usage, self.window_days, now);
                self.repo.upsert(record.clone())?;
                self.repo.save()?;
                info!(user = %user_id, "initialized prediction usage tracking");
                record
            }
            Some(mut record) if record.needs_reset(now) => {
                record.reset(self.window_days, now);
                self.repo.upsert(record.clone())?;
                self.repo.save()?;
                info!(user = %user_id, reset_date = %record.reset_date, "prediction usage window restarted");
                record
            }
            Some(record) => record,
        };

        Ok(UsageStatus::new(
            user_id,
            record.usage_count,
            self.max_usage,
            record.reset_date,
        ))
    }

    pub fn increment(&self, user_id: UserId, by: u32) -> BudgetResult<UsageStatus> {
        self.increment_at(user_id, by, Utc::now())
    }

    /// Add `by` predictions to the counter
    ///
    /// An increment that would go past the limit is refused and the unchanged
    /// status is returned.
    pub fn increment_at(&self, user_id: UserId, by: u32, now: DateTime<Utc>) -> BudgetResult<UsageStatus> {
        let current = self.status_at(user_id, now)?;
        let next = current.current_usage.saturating_add(by);
        if next > self.max_usage {
            warn!(user = %user_id, current = current.current_usage, by, max = self.max_usage, "usage increment would exceed limit");
            return Ok(current);
        }

        let mut record = self
            .repo
            .get(user_id)?
            .ok_or_else(|| BudgetError::Storage(format!("usage record for {} disappeared", user_id)))?;
        record.usage_count = next;
        record.updated_at = now;
        self.repo.upsert(record.clone())?;
        self.repo.save()?;

        Ok(UsageStatus::new(user_id, next, self.max_usage, record.reset_date))
    }

    /// Whether `user_id` may run another prediction
    ///
    /// Storage failures allow the prediction.
    pub fn can_predict(&self, user_id: UserId) -> bool {
        match self.status(user_id) {
            Ok(status) => !status.exceeded,
            Err(err) => {
                warn!(user = %user_id, error = %err, "usage check failed, allowing prediction");
                true
            }
        }
    }

    /// Fail with `UsageLimit` when the quota is used up
    pub fn ensure_can_predict(&self, user_id: UserId) -> BudgetResult<UsageStatus> {
        let status = self.status(user_id)?;
        if status.exceeded {
            return Err(BudgetError::UsageLimit {
                current: status.current_usage,
                max: status.max_usage,
            });
        }
        Ok(status)
    }

    pub fn reset(&self, user_id: UserId) -> BudgetResult<UsageStatus> {
        self.reset_at(user_id, Utc::now())
    }

    /// Zero the counter and start a new window
    pub fn reset_at(&self, user_id: UserId, now: DateTime<Utc>) -> BudgetResult<UsageStatus> {
        let mut record = self
            .repo
            .get(user_id)?
            .unwrap_or_else(|| UsageRecord::new(user_id, self.max_usage, self.window_days, now));
        record.reset(self.window_days, now);
        self.repo.upsert(record)?;
        self.repo.save()?;
        info!(user = %user_id, "prediction usage reset");
        self.status_at(user_id, now)
    }

    /// Restart every window whose reset date has passed; returns how many
    pub fn reset_expired_at(&self, now: DateTime<Utc>) -> BudgetResult<usize> {
        let mut count = 0;
        for mut record in self.repo.get_all()? {
            if record.needs_reset(now) {
                record.reset(self.window_days, now);
                self.repo.upsert(record)?;
                count += 1;
            }
        }
        if count > 0 {
            self.repo.save()?;
        }
        info!(count, "reset expired prediction usage windows");
        Ok(count)
    }

    pub fn statistics_at(&self, now: DateTime<Utc>) -> BudgetResult<UsageStatistics> {
        let records = self.repo.get_all()?;
        if records.is_empty() {
            return Ok(UsageStatistics::default());
        }

        let total: u32 = records.iter().map(|r| r.usage_count).sum();
        let average = total as f64 / records.len() as f64;

        Ok(UsageStatistics {
            total_users: records.len(),
            average_usage: (average * 100.0).round() / 100.0,
            users_at_limit: records.iter().filter(|r| r.usage_count >= r.max_usage).count(),
            users_over_limit: records.iter().filter(|r| r.usage_count > r.max_usage).count(),
            users_needing_reset: records.iter().filter(|r| r.needs_reset(now)).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn repo(dir: &TempDir) -> UsageRepository {
        let repo = UsageRepository::new(dir.path().join("prediction_usage.json"));
        repo.load().unwrap();
        repo
    }

    #[test]
    fn test_first_status_creates_record() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let tracker = UsageTracker::new(&repo, &UsageSettings::default());
        let now = Utc::now();

        let status = tracker.status_at(UserId::new(), now).unwrap();
        assert_eq!(status.current_usage, 0);
        assert_eq!(status.remaining, 5);
        assert_eq!(status.reset_date, now + Duration::days(30));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_increment_refuses_past_limit() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let tracker = UsageTracker::new(&repo, &UsageSettings::default());
        let user = UserId::new();
        let now = Utc::now();

        assert_eq!(tracker.increment_at(user, 4, now).unwrap().current_usage, 4);
        let refused = tracker.increment_at(user, 2, now).unwrap();
        assert_eq!(refused.current_usage, 4);
        assert!(!refused.exceeded);

        let full = tracker.increment_at(user, 1, now).unwrap();
        assert!(full.exceeded);
        assert_eq!(full.remaining, 0);
        assert!(matches!(
            tracker.ensure_can_predict(user),
            Err(BudgetError::UsageLimit { current: 5, max: 5 })
        ));
        assert!(!tracker.can_predict(user));
    }

    #[test]
    fn test_window_rolls_over() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let tracker = UsageTracker::new(&repo, &UsageSettings::default());
        let user = UserId::new();
        let start = Utc::now();

        tracker.increment_at(user, 5, start).unwrap();
        let later = start + Duration::days(31);
        let status = tracker.status_at(user, later).unwrap();
        assert_eq!(status.current_usage, 0);
        assert_eq!(status.reset_date, later + Duration::days(30));
    }

    #[test]
    fn test_reset_expired_and_statistics() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let tracker = UsageTracker::new(&repo, &UsageSettings::default());
        let start = Utc::now();
        let heavy = UserId::new();
        let light = UserId::new();

        tracker.increment_at(heavy, 5, start).unwrap();
        tracker.increment_at(light, 1, start + Duration::days(20)).unwrap();

        let stats = tracker.statistics_at(start + Duration::days(31)).unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.average_usage, 3.0);
        assert_eq!(stats.users_at_limit, 1);
        assert_eq!(stats.users_over_limit, 0);
        assert_eq!(stats.users_needing_reset, 1);

        assert_eq!(tracker.reset_expired_at(start + Duration::days(31)).unwrap(), 1);
        assert_eq!(tracker.status_at(heavy, start + Duration::days(31)).unwrap().current_usage, 0);
        assert_eq!(tracker.status_at(light, start + Duration::days(31)).unwrap().current_usage, 1);
    }

    #[test]
    fn test_manual_reset() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let tracker = UsageTracker::new(&repo, &UsageSettings::default());
        let user = UserId::new();

        tracker.increment(user, 3).unwrap();
        assert_eq!(tracker.reset(user).unwrap().current_usage, 0);
    }
}
