//! Notification CLI commands

use clap::Subcommand;

use super::{api_data, AppContext};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{NotificationId, NotificationKind, UserId};

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// List notifications, newest first
    List {
        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Print full notification ids
        #[arg(long)]
        ids: bool,
    },
    /// Show notification counts
    Stats,
    /// Mark notifications as read (all of them unless --id is given)
    MarkRead {
        /// Full notification id, as shown by `list --ids`
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete notifications older than a number of days
    Prune {
        #[arg(short, long, default_value = "30")]
        days: i64,
    },
    /// Stop creating notifications of a kind
    Mute {
        /// Kind, e.g. large-transaction
        kind: String,
    },
    /// Resume notifications of a kind
    Unmute {
        kind: String,
    },
}

fn parse_kind(kind: &str) -> BudgetResult<NotificationKind> {
    NotificationKind::parse(kind).ok_or_else(|| {
        let valid: Vec<&str> = NotificationKind::all().iter().map(|k| k.as_str()).collect();
        BudgetError::Validation(format!(
            "Invalid notification kind: '{}'. Valid kinds: {}",
            kind,
            valid.join(", ")
        ))
    })
}

pub async fn handle_notifications_command(
    ctx: &AppContext,
    user_id: UserId,
    cmd: NotificationCommands,
) -> BudgetResult<()> {
    let store = &ctx.storage.notifications;

    match cmd {
        NotificationCommands::List { unread, limit, ids } => {
            let notifications = store.list_for(user_id, unread)?;
            if notifications.is_empty() {
                println!("No notifications.");
                return Ok(());
            }
            for n in notifications.iter().take(limit) {
                let marker = if n.read { " " } else { "*" };
                println!(
                    "{} {}  [{}] {}",
                    marker,
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.kind,
                    n.title
                );
                println!("      {}", n.message);
                if ids {
                    println!("      id: {}", n.id.to_db_string());
                }
            }
            if notifications.len() > limit {
                println!("... and {} more", notifications.len() - limit);
            }
        }

        NotificationCommands::Stats => {
            let stats = api_data(ctx.coordinator.notification_stats(user_id).await)?;
            println!("Total:  {}", stats.total);
            println!("Unread: {}", stats.unread);
            for (kind, count) in &stats.by_kind {
                println!("  {:<20} {}", kind.as_str(), count);
            }
        }

        NotificationCommands::MarkRead { id: Some(id) } => {
            let id: NotificationId = id
                .parse()
                .map_err(|_| BudgetError::Validation(format!("Invalid notification id: '{}'", id)))?;
            let notification = store.mark_read(user_id, id)?;
            println!("Marked \"{}\" as read.", notification.title);
        }

        NotificationCommands::MarkRead { id: None } => {
            let marked = api_data(ctx.coordinator.mark_all_as_read(user_id).await)?;
            println!("Marked {} notification(s) as read.", marked);
        }

        NotificationCommands::Prune { days } => {
            let removed = api_data(ctx.coordinator.delete_old_notifications(user_id, days).await)?;
            println!("Deleted {} notification(s) older than {} days.", removed, days);
        }

        NotificationCommands::Mute { kind } => {
            let kind = parse_kind(&kind)?;
            let mut preferences = store.preferences_for(user_id)?;
            preferences.muted_kinds.insert(kind);
            store.set_preferences(user_id, preferences)?;
            println!("Muted {} notifications.", kind);
        }

        NotificationCommands::Unmute { kind } => {
            let kind = parse_kind(&kind)?;
            let mut preferences = store.preferences_for(user_id)?;
            preferences.muted_kinds.remove(&kind);
            store.set_preferences(user_id, preferences)?;
            println!("Unmuted {} notifications.", kind);
        }
    }

    Ok(())
}
