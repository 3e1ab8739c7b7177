use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use budgetme::cli::{
    handle_check_command, handle_notifications_command, handle_usage_command,
    handle_validate_command, parse_user, AppContext, CheckCommand, NotificationCommands,
    UsageCommands,
};
use budgetme::config::{paths::BudgetPaths, settings::Settings};
use budgetme::logging::init_logging;

#[derive(Parser)]
#[command(
    name = "budgetme",
    version,
    about = "Budget, goal and family notifications for BudgetMe",
    long_about = "Runs BudgetMe's notification rules against budget, goal and \
                  transaction changes, manages stored notifications and the \
                  prediction quota, and validates forecast input data."
)]
struct Cli {
    /// User id (UUID)
    #[arg(short, long, global = true, env = "BUDGETME_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Check(CheckCommand),

    /// Stored notification commands
    #[command(subcommand)]
    Notifications(NotificationCommands),

    /// Prediction quota commands
    #[command(subcommand)]
    Usage(UsageCommands),

    /// Validate a transaction CSV (date,amount,type,category) for forecasting
    Validate {
        file: PathBuf,
        /// Also print the monthly financial profile
        #[arg(long)]
        profile: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show which notification services are wired in
    Health,

    /// Write default settings and create the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = BudgetPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_logging(&settings.log_level);

    let ctx = AppContext::new(paths, settings)?;
    let user = cli.user.as_deref();

    match cli.command {
        Some(Commands::Check(cmd)) => {
            handle_check_command(&ctx, parse_user(user)?, cmd).await?;
        }
        Some(Commands::Notifications(cmd)) => {
            handle_notifications_command(&ctx, parse_user(user)?, cmd).await?;
        }
        Some(Commands::Usage(cmd)) => {
            handle_usage_command(&ctx, user, cmd)?;
        }
        Some(Commands::Validate {
            file,
            profile,
            json,
        }) => {
            if !handle_validate_command(&file, profile, json)? {
                bail!("{} is not usable for prediction", file.display());
            }
        }
        Some(Commands::Health) => {
            if let Some(user) = user {
                ctx.coordinator.initialize(parse_user(Some(user))?).await;
            }
            let report = ctx.coordinator.health_check().await;
            let mark = |present: bool| if present { "ok" } else { "missing" };
            println!("Budget notifier:      {}", mark(report.budget_notifier));
            println!("Goal notifier:        {}", mark(report.goal_notifier));
            println!("Transaction notifier: {}", mark(report.transaction_notifier));
            println!("Family notifier:      {}", mark(report.family_notifier));
            println!("Notification API:     {}", mark(report.notification_api));
            println!("Realtime transport:   {}", mark(report.realtime));
            println!("Initialized:          {}", report.initialized);
            println!("Healthy:              {}", report.is_healthy);
            if let Some(user) = ctx.coordinator.current_user().await {
                ctx.coordinator.cleanup(user).await;
            }
        }
        Some(Commands::Init) => {
            ctx.settings.save(&ctx.paths)?;
            println!("Initialized BudgetMe at: {}", ctx.paths.base_dir().display());
            println!("Edit {} to change retry, notification and quota settings.", ctx.paths.settings_file().display());
        }
        Some(Commands::Config) => {
            println!("BudgetMe Configuration");
            println!("======================");
            println!("Base directory:  {}", ctx.paths.base_dir().display());
            println!("Data directory:  {}", ctx.paths.data_dir().display());
            println!("Settings file:   {}", ctx.paths.settings_file().display());
            println!(
                "Initialized:     {}",
                if ctx.storage.is_initialized() { "yes" } else { "no (run 'budgetme init')" }
            );
            println!();
            println!("Settings:");
            println!(
                "  Retry: {} attempts, {} ms apart",
                ctx.settings.retry.max_attempts, ctx.settings.retry.delay_ms
            );
            println!(
                "  Large transaction threshold: {}",
                budgetme::models::Money::from_cents(ctx.settings.notifications.large_transaction_cents)
            );
            println!("  Notification expiry: {} days", ctx.settings.notifications.expiry_days);
            println!(
                "  Prediction quota: {} per {} days",
                ctx.settings.usage.max_predictions, ctx.settings.usage.reset_window_days
            );
            println!("  Log level: {}", ctx.settings.log_level);
        }
        None => {
            println!("BudgetMe - budget and goal notifications");
            println!();
            println!("Run 'budgetme --help' for usage information.");
        }
    }

    Ok(())
}
