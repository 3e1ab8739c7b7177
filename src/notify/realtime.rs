//! In-process real-time transport
//!
//! Stands in for the hosted change feed: callers push notifications with
//! [`LocalRealtime::deliver`] and every active subscription for that user
//! receives them, in order, on the caller's task.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::services::{NotificationCallback, RealtimeTransport, Subscription};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Notification, UserId};

#[derive(Default)]
pub struct LocalRealtime {
    subscribers: Mutex<HashMap<Uuid, (UserId, NotificationCallback)>>,
}

impl LocalRealtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a notification to its user's subscribers; returns how many received it
    pub fn deliver(&self, notification: &Notification) -> usize {
        // Callbacks run outside the lock so they may subscribe or unsubscribe
        let callbacks: Vec<NotificationCallback> = match self.subscribers.lock() {
            Ok(subscribers) => subscribers
                .values()
                .filter(|(user, _)| *user == notification.user_id)
                .map(|(_, cb)| cb.clone())
                .collect(),
            Err(_) => return 0,
        };

        for callback in &callbacks {
            callback(notification.clone());
        }
        callbacks.len()
    }

    /// Number of active subscriptions across all users
    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RealtimeTransport for LocalRealtime {
    async fn subscribe(&self, user_id: UserId, callback: NotificationCallback) -> BudgetResult<Subscription> {
        let subscription = Subscription::new(user_id);
        self.subscribers
            .lock()
            .map_err(|e| BudgetError::Realtime(format!("Failed to acquire subscriber lock: {}", e)))?
            .insert(subscription.id, (user_id, callback));
        debug!(user = %user_id, subscription = %subscription.id, "realtime subscription started");
        Ok(subscription)
    }

    async fn unsubscribe(&self, subscription: Subscription) -> BudgetResult<()> {
        let removed = self
            .subscribers
            .lock()
            .map_err(|e| BudgetError::Realtime(format!("Failed to acquire subscriber lock: {}", e)))?
            .remove(&subscription.id);

        match removed {
            Some(_) => {
                debug!(user = %subscription.user_id, subscription = %subscription.id, "realtime subscription stopped");
                Ok(())
            }
            None => Err(BudgetError::Realtime(format!(
                "Unknown subscription {}",
                subscription.id
            ))),
        }
    }
}
