//! Prediction usage CLI commands

use clap::Subcommand;

use super::{parse_user, AppContext};
use crate::error::BudgetResult;
use crate::models::UsageStatus;
use crate::prediction::UsageTracker;

#[derive(Subcommand)]
pub enum UsageCommands {
    /// Show the user's remaining predictions
    Status,
    /// Record predictions against the user's quota
    Increment {
        #[arg(short, long, default_value = "1")]
        by: u32,
    },
    /// Reset the user's quota
    Reset,
    /// Restart every expired quota window
    ResetExpired,
    /// Show usage across all users
    Stats,
}

fn print_status(status: &UsageStatus) {
    println!("Predictions used: {}/{}", status.current_usage, status.max_usage);
    println!("Remaining:        {}", status.remaining);
    println!("Resets on:        {}", status.reset_date.format("%Y-%m-%d"));
    if status.exceeded {
        println!("Limit reached.");
    }
}

pub fn handle_usage_command(ctx: &AppContext, user: Option<&str>, cmd: UsageCommands) -> BudgetResult<()> {
    let tracker = UsageTracker::new(&ctx.storage.usage, &ctx.settings.usage);

    match cmd {
        UsageCommands::Status => {
            let status = tracker.status(parse_user(user)?)?;
            print_status(&status);
        }

        UsageCommands::Increment { by } => {
            let user_id = parse_user(user)?;
            let before = tracker.status(user_id)?;
            let after = tracker.increment(user_id, by)?;
            if after.current_usage == before.current_usage && by > 0 {
                println!("Increment refused: it would exceed the limit of {}.", tracker.max_usage());
            }
            print_status(&after);
        }

        UsageCommands::Reset => {
            let status = tracker.reset(parse_user(user)?)?;
            println!("Usage reset.");
            print_status(&status);
        }

        UsageCommands::ResetExpired => {
            let count = tracker.reset_expired_at(chrono::Utc::now())?;
            println!("Reset {} expired quota window(s).", count);
        }

        UsageCommands::Stats => {
            let stats = tracker.statistics_at(chrono::Utc::now())?;
            println!("Users:              {}", stats.total_users);
            println!("Average usage:      {:.2}", stats.average_usage);
            println!("At limit:           {}", stats.users_at_limit);
            println!("Over limit:         {}", stats.users_over_limit);
            println!("Needing reset:      {}", stats.users_needing_reset);
            println!("Limit per user:     {}", tracker.max_usage());
        }
    }

    Ok(())
}
