//! Change-check CLI commands
//!
//! Each command describes one change (a budget's spending, a goal's savings,
//! a new transaction), runs it through the coordinator and prints whatever
//! notifications it produced.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use tokio::sync::broadcast::Receiver;

use super::{parse_money, AppContext};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Budget, BudgetPeriod, Goal, Notification, Transaction, UserId};
use crate::notify::UiEvent;

#[derive(Subcommand)]
pub enum CheckCommand {
    /// Check a budget after its spending changed
    BudgetCheck {
        /// Budget name
        #[arg(short, long)]
        name: String,
        /// Budgeted amount (e.g., "1000.00")
        #[arg(short, long)]
        amount: String,
        /// Amount spent now
        #[arg(short, long)]
        spent: String,
        /// Amount spent before the change
        #[arg(short, long)]
        previous: Option<String>,
    },
    /// Check a savings goal after its balance changed
    GoalCheck {
        /// Goal name
        #[arg(short, long)]
        name: String,
        /// Target amount
        #[arg(short, long)]
        target: String,
        /// Amount saved now
        #[arg(short, long)]
        current: String,
        /// Amount saved before the change
        #[arg(short, long)]
        previous: Option<String>,
        /// Target date (YYYY-MM-DD)
        #[arg(short, long)]
        deadline: Option<String>,
    },
    /// Check a newly created transaction
    TransactionCheck {
        /// Signed amount (negative for outflow)
        #[arg(short, long, allow_hyphen_values = true)]
        amount: String,
        /// Category name
        #[arg(short, long, default_value = "Uncategorized")]
        category: String,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },
}

fn parse_date(value: &str) -> BudgetResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        BudgetError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD. Error: {}", value, e))
    })
}

fn drain_notifications(events: &mut Receiver<UiEvent>) -> Vec<Notification> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let UiEvent::NotificationReceived(notification) = event {
            received.push(notification);
        }
    }
    received
}

fn print_outcome(ok: bool, notifications: &[Notification]) {
    if notifications.is_empty() {
        println!("No notifications triggered.");
    } else {
        println!("{} notification(s) triggered:", notifications.len());
        for n in notifications {
            println!("  [{}] {}", n.kind, n.title);
            println!("      {}", n.message);
        }
    }
    if !ok {
        println!("Warning: some notifications could not be delivered (see log).");
    }
}

/// Handle a change-check command for `user_id`
pub async fn handle_check_command(ctx: &AppContext, user_id: UserId, cmd: CheckCommand) -> BudgetResult<()> {
    if !ctx.coordinator.initialize(user_id).await {
        return Err(BudgetError::Realtime(
            "Could not start the notification feed".to_string(),
        ));
    }
    let mut events = ctx.coordinator.bus().subscribe();

    let ok = match cmd {
        CheckCommand::BudgetCheck {
            name,
            amount,
            spent,
            previous,
        } => {
            let amount = parse_money("amount", &amount)?;
            let spent = parse_money("spent amount", &spent)?;
            let previous = previous.map(|p| parse_money("previous amount", &p)).transpose()?;

            let budget = Budget::new(user_id, name, amount, BudgetPeriod::Monthly).with_spent(spent);
            println!(
                "Budget '{}': {} of {} spent ({:.1}%)",
                budget.name,
                budget.spent,
                budget.amount,
                budget.spent_percentage()
            );
            ctx.coordinator.handle_budget_update(&budget, previous).await
        }

        CheckCommand::GoalCheck {
            name,
            target,
            current,
            previous,
            deadline,
        } => {
            let target = parse_money("target", &target)?;
            let current = parse_money("current amount", &current)?;
            let previous = previous.map(|p| parse_money("previous amount", &p)).transpose()?;

            let mut goal = Goal::new(user_id, name, target).with_current(current);
            if let Some(deadline) = deadline {
                goal = goal.with_target_date(parse_date(&deadline)?);
            }
            println!(
                "Goal '{}': {} of {} saved ({:.1}%)",
                goal.name,
                goal.current_amount,
                goal.target_amount,
                goal.progress_percentage()
            );
            ctx.coordinator.handle_goal_update(&goal, previous).await
        }

        CheckCommand::TransactionCheck {
            amount,
            category,
            date,
            description,
        } => {
            let amount = parse_money("amount", &amount)?;
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => Utc::now().date_naive(),
            };

            let mut transaction = Transaction::new(user_id, amount, category, date);
            if let Some(description) = description {
                transaction = transaction.with_description(description);
            }
            println!("Transaction {} in {} on {}", transaction.amount, transaction.category, transaction.date);
            ctx.coordinator.handle_transaction_creation(&transaction).await
        }
    };

    print_outcome(ok, &drain_notifications(&mut events));
    ctx.coordinator.cleanup(user_id).await;
    Ok(())
}
