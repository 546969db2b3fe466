//! Retrying task runner.
//!
//! A task is re-run from scratch on retryable failures; nothing carries over
//! between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use takeaways_shared::{ProgressSink, Result, RetryConfig, TaskStatus};

/// How often and how patiently to retry a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(1000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Run `attempt` until it succeeds, fails terminally, or attempts run out.
///
/// `attempt` receives the 1-based attempt number. Every failure is reported
/// to `progress`; only [`is_retryable`](takeaways_shared::TakeawaysError::is_retryable)
/// errors cause another attempt.
pub async fn run_task<T, F, Fut>(
    name: &str,
    policy: RetryPolicy,
    progress: &dyn ProgressSink,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let run_id = Uuid::now_v7();
    progress.set_status(TaskStatus::Running);

    let mut number = 1;
    loop {
        let span = info_span!("task", task = name, %run_id, attempt = number);
        let outcome = attempt(number).instrument(span).await;

        match outcome {
            Ok(value) => {
                info!(task = name, %run_id, attempts = number, "task completed");
                progress.set_status(TaskStatus::Completed);
                return Ok(value);
            }
            Err(e) => {
                progress.record_error(&e.to_string());
                if !e.is_retryable() || number >= max_attempts {
                    error!(task = name, %run_id, attempts = number, error = %e, "task failed");
                    progress.set_status(TaskStatus::Failed);
                    return Err(e);
                }
                warn!(
                    task = name,
                    %run_id,
                    attempt = number,
                    error = %e,
                    "attempt failed, retrying"
                );
                progress.set_status(TaskStatus::Retrying);
                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff).await;
                }
                number += 1;
            }
        }
    }
}
