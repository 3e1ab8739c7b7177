//! Prediction support: per-user quota and input data checks

pub mod usage;
pub mod validation;

pub use usage::UsageTracker;
pub use validation::{
    load_transactions_csv, parse_transactions_csv, validate, FinancialProfile, FlowType,
    PredictionTransaction, ValidationReport,
};
