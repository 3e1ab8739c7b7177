//! Local notification store
//!
//! JSON-file implementation of the notification API, used by the CLI and
//! tests in place of the hosted notifications table. Notifications and
//! per-user preferences live in separate files.

use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::file_io::{read_json, write_json_atomic};
use crate::config::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Notification, NotificationId, UserId};
use crate::notify::services::{NotificationApi, NotificationPreferences, NotificationStats};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NotificationData {
    #[serde(default)]
    notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferenceEntry {
    user_id: UserId,
    preferences: NotificationPreferences,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferenceData {
    #[serde(default)]
    entries: Vec<PreferenceEntry>,
}

pub struct NotificationStore {
    notifications_path: PathBuf,
    preferences_path: PathBuf,
    notifications: RwLock<Vec<Notification>>,
    preferences: RwLock<Vec<PreferenceEntry>>,
}

fn lock_err(e: impl std::fmt::Display) -> BudgetError {
    BudgetError::Storage(format!("Failed to acquire lock: {}", e))
}

impl NotificationStore {
    pub fn new(notifications_path: PathBuf, preferences_path: PathBuf) -> Self {
        Self {
            notifications_path,
            preferences_path,
            notifications: RwLock::new(Vec::new()),
            preferences: RwLock::new(Vec::new()),
        }
    }

    /// Create a store at the standard paths and load it
    pub fn open(paths: &BudgetPaths) -> BudgetResult<Self> {
        let store = Self::new(paths.notifications_file(), paths.preferences_file());
        store.load()?;
        Ok(store)
    }

    /// Load notifications and preferences from disk
    pub fn load(&self) -> BudgetResult<()> {
        let data: NotificationData = read_json(&self.notifications_path)?;
        let prefs: PreferenceData = read_json(&self.preferences_path)?;

        *self.notifications.write().map_err(lock_err)? = data.notifications;
        *self.preferences.write().map_err(lock_err)? = prefs.entries;
        Ok(())
    }

    fn save_notifications(&self, notifications: &[Notification]) -> BudgetResult<()> {
        let data = NotificationData {
            notifications: notifications.to_vec(),
        };
        write_json_atomic(&self.notifications_path, &data)
    }

    /// Apply `change` to a copy, persist it, then swap it in
    ///
    /// `change` returns the result to hand back and whether anything changed;
    /// unchanged copies are not written.
    fn update_notifications<T>(
        &self,
        change: impl FnOnce(&mut Vec<Notification>) -> BudgetResult<(T, bool)>,
    ) -> BudgetResult<T> {
        let mut notifications = self.notifications.write().map_err(lock_err)?;
        let mut staged = notifications.clone();
        let (result, changed) = change(&mut staged)?;
        if changed {
            self.save_notifications(&staged)?;
            *notifications = staged;
        }
        Ok(result)
    }

    pub fn insert_notification(&self, notification: Notification) -> BudgetResult<()> {
        self.update_notifications(|staged| {
            staged.push(notification);
            Ok(((), true))
        })
    }

    /// A user's notifications, newest first
    pub fn list_for(&self, user_id: UserId, unread_only: bool) -> BudgetResult<Vec<Notification>> {
        let notifications = self.notifications.read().map_err(lock_err)?;
        let mut list: Vec<Notification> = notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    pub fn stats_for(&self, user_id: UserId) -> BudgetResult<NotificationStats> {
        let notifications = self.notifications.read().map_err(lock_err)?;
        let mut stats = NotificationStats::default();
        for n in notifications.iter().filter(|n| n.user_id == user_id) {
            stats.total += 1;
            if !n.read {
                stats.unread += 1;
            }
            *stats.by_kind.entry(n.kind).or_insert(0) += 1;
        }
        Ok(stats)
    }

    pub fn mark_all_read_for(&self, user_id: UserId) -> BudgetResult<usize> {
        self.update_notifications(|staged| {
            let mut changed = 0;
            for n in staged.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
                n.read = true;
                changed += 1;
            }
            Ok((changed, changed > 0))
        })
    }

    /// Mark one of a user's notifications as read
    pub fn mark_read(&self, user_id: UserId, id: NotificationId) -> BudgetResult<Notification> {
        self.update_notifications(|staged| {
            let notification = staged
                .iter_mut()
                .find(|n| n.id == id && n.user_id == user_id)
                .ok_or_else(|| BudgetError::notification_not_found(id.to_string()))?;
            let changed = !notification.read;
            notification.read = true;
            Ok((notification.clone(), changed))
        })
    }

    /// Remove a user's notifications matching `doomed`; returns how many went
    fn remove_where(
        &self,
        user_id: UserId,
        doomed: impl Fn(&Notification) -> bool,
    ) -> BudgetResult<usize> {
        self.update_notifications(|staged| {
            let before = staged.len();
            staged.retain(|n| n.user_id != user_id || !doomed(n));
            let removed = before - staged.len();
            Ok((removed, removed > 0))
        })
    }

    /// Delete notifications created more than `days_old` days before `now`
    pub fn delete_older_than_at(&self, user_id: UserId, days_old: i64, now: DateTime<Utc>) -> BudgetResult<usize> {
        if days_old < 0 {
            return Err(BudgetError::Validation(format!(
                "days_old must not be negative, got {}",
                days_old
            )));
        }
        let cutoff = Duration::try_days(days_old)
            .and_then(|age| now.checked_sub_signed(age))
            .ok_or_else(|| BudgetError::Validation(format!("days_old is out of range: {}", days_old)))?;
        self.remove_where(user_id, |n| n.created_at < cutoff)
    }

    pub fn purge_expired_at(&self, user_id: UserId, now: DateTime<Utc>) -> BudgetResult<usize> {
        self.remove_where(user_id, |n| n.is_expired(now))
    }

    pub fn preferences_for(&self, user_id: UserId) -> BudgetResult<NotificationPreferences> {
        let entries = self.preferences.read().map_err(lock_err)?;
        Ok(entries
            .iter()
            .find(|e| e.user_id == user_id)
            .map(|e| e.preferences.clone())
            .unwrap_or_default())
    }

    pub fn set_preferences(&self, user_id: UserId, preferences: NotificationPreferences) -> BudgetResult<()> {
        let mut entries = self.preferences.write().map_err(lock_err)?;
        let mut staged = entries.clone();
        match staged.iter_mut().find(|e| e.user_id == user_id) {
            Some(entry) => entry.preferences = preferences,
            None => staged.push(PreferenceEntry {
                user_id,
                preferences,
            }),
        }
        let data = PreferenceData { entries: staged };
        write_json_atomic(&self.preferences_path, &data)?;
        *entries = data.entries;
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for NotificationStore {
    async fn insert(&self, notification: Notification) -> BudgetResult<()> {
        self.insert_notification(notification)
    }

    async fn list(&self, user_id: UserId, unread_only: bool) -> BudgetResult<Vec<Notification>> {
        self.list_for(user_id, unread_only)
    }

    async fn stats(&self, user_id: UserId) -> BudgetResult<NotificationStats> {
        self.stats_for(user_id)
    }

    async fn mark_all_read(&self, user_id: UserId) -> BudgetResult<usize> {
        self.mark_all_read_for(user_id)
    }

    async fn delete_older_than(&self, user_id: UserId, days_old: i64) -> BudgetResult<usize> {
        self.delete_older_than_at(user_id, days_old, Utc::now())
    }

    async fn purge_expired(&self, user_id: UserId) -> BudgetResult<usize> {
        self.purge_expired_at(user_id, Utc::now())
    }

    async fn load_preferences(&self, user_id: UserId) -> BudgetResult<NotificationPreferences> {
        self.preferences_for(user_id)
    }
}
