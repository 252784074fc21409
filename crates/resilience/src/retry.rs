//! Retry sub-policy.

use crate::classifier::{ExceptionClassifier, Failure};
use crate::config::{RetryDelayFn, RetryHook};
use crate::state::RuntimeState;
use std::fmt;
use std::future::Future;
use tokio::time::sleep;

/// Re-invokes a failing operation up to a fixed number of extra attempts
pub(crate) struct RetryPolicy<E> {
    pub max_attempts: u32,
    pub delay: RetryDelayFn,
    pub on_retry: Option<RetryHook<E>>,
}

impl<E: fmt::Display> RetryPolicy<E> {
    /// Run `operation` until it succeeds, fails unhandled, or exhausts the budget
    ///
    /// Each retry publishes the 1-based attempt as the policy's current retry
    /// count before the hook runs and the wait starts.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        name: &str,
        logging: bool,
        classifier: &ExceptionClassifier<E>,
        runtime: &RuntimeState,
        operation: F,
    ) -> Result<T, Failure<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    if logging && attempt > 0 {
                        tracing::info!(
                            policy = %name,
                            retry_count = attempt,
                            open_count = runtime.open_count(),
                            "operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !classifier.is_handled(&error) {
                return Err(Failure::Unhandled(error));
            }
            if attempt >= self.max_attempts {
                return Err(Failure::Exhausted(error));
            }

            attempt += 1;
            runtime.publish_retry_count(attempt);
            let delay = (self.delay)(attempt);

            if logging {
                tracing::warn!(
                    policy = %name,
                    retry_count = attempt,
                    open_count = runtime.open_count(),
                    max_attempts = self.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "handled failure, retrying"
                );
            }
            if let Some(hook) = &self.on_retry {
                hook(attempt, delay, &error);
            }

            sleep(delay).await;
        }
    }
}
