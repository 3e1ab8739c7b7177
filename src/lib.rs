//! BudgetMe - notification coordination and data access for a family budgeting app
//!
//! The hosted backend owns budgets, goals, transactions and families. This
//! crate decides when changes to them deserve a notification, delivers those
//! notifications, and wraps the backend reads the app depends on.
//!
//! # Architecture
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `logging`: `tracing` subscriber setup
//! - `models`: Core data models (budgets, goals, transactions, families, notifications)
//! - `notify`: Notification coordinator, notifiers and event bus
//! - `retry`: Bounded retry policy shared by backend fetches
//! - `data`: Typed data-access hooks over the backend
//! - `storage`: JSON file storage for notifications, preferences and usage
//! - `prediction`: Prediction quota and input validation
//! - `cli`: Command handlers for the `budgetme` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use budgetme::config::{paths::BudgetPaths, settings::Settings};
//!
//! let paths = BudgetPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod prediction;
pub mod retry;
pub mod storage;

pub use error::{BackendError, BudgetError, BudgetResult};
