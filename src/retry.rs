//! Bounded retry policy for backend fetches
//!
//! Every data-access fetch goes through [`RetryPolicy::run`]. An attempt
//! answers with a value, with "no matching row", or with a backend error.
//! Missing rows and ordinary errors are retried after a fixed delay; errors
//! carrying a terminal marker (bad request, missing remote procedure) stop
//! immediately because retrying cannot fix them.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::settings::RetrySettings;
use crate::error::BackendError;

/// Markers identifying errors that will not go away on retry
pub const DEFAULT_TERMINAL_MARKERS: [&str; 4] = [
    "400",
    "Bad Request",
    "PGRST202",
    "Could not find the function",
];

/// Result of a fetch after the policy ran
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    /// The backend returned data
    Loaded(T),
    /// Nothing was found; not an error
    NoData,
    /// A human-readable message suitable for a toast
    Error(String),
}

impl<T> FetchState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Transform the loaded value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchState<U> {
        match self {
            Self::Loaded(value) => FetchState::Loaded(f(value)),
            Self::NoData => FetchState::NoData,
            Self::Error(message) => FetchState::Error(message),
        }
    }
}

/// How an error should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Terminal,
}

/// Sequential retries with a fixed delay
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    terminal_markers: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one attempt
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            terminal_markers: DEFAULT_TERMINAL_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.delay())
    }

    /// Replace the terminal markers
    pub fn with_terminal_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminal_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Classify an error against the terminal markers
    pub fn classify(&self, error: &BackendError) -> ErrorClass {
        let text = error.describe();
        if self.terminal_markers.iter().any(|m| text.contains(m.as_str())) {
            ErrorClass::Terminal
        } else {
            ErrorClass::Transient
        }
    }

    /// Run `attempt` until it yields data, hits a terminal error, or attempts run out
    ///
    /// `what` names the fetch in log lines. When attempts run out the outcome
    /// follows the last attempt: a missing row becomes [`FetchState::NoData`],
    /// an error becomes [`FetchState::Error`].
    pub async fn run<T, F, Fut>(&self, what: &str, mut attempt: F) -> FetchState<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, BackendError>>,
    {
        let mut attempt_no = 1;
        loop {
            let outcome = attempt(attempt_no).await;
            let last = attempt_no >= self.max_attempts;

            match outcome {
                Ok(Some(value)) => {
                    debug!(fetch = what, attempt = attempt_no, "fetch succeeded");
                    return FetchState::Loaded(value);
                }
                Ok(None) if last => {
                    debug!(fetch = what, attempts = attempt_no, "no data after retries");
                    return FetchState::NoData;
                }
                Ok(None) => {
                    debug!(fetch = what, attempt = attempt_no, "no matching row, retrying");
                }
                Err(err) => {
                    if self.classify(&err) == ErrorClass::Terminal {
                        warn!(fetch = what, attempt = attempt_no, error = %err.describe(), "terminal backend error");
                        return FetchState::Error(terminal_message(what, &err));
                    }
                    if last {
                        warn!(fetch = what, attempts = attempt_no, error = %err.describe(), "fetch failed after retries");
                        return FetchState::Error(format!("Failed to load {}: {}", what, err.message));
                    }
                    warn!(fetch = what, attempt = attempt_no, error = %err.describe(), "fetch failed, retrying");
                }
            }

            tokio::time::sleep(self.delay).await;
            attempt_no += 1;
        }
    }
}

fn terminal_message(what: &str, err: &BackendError) -> String {
    format!(
        "Unable to load {} because the service is misconfigured or unavailable ({}). Please contact support.",
        what,
        err.describe()
    )
}
