//! Circuit breaker sub-policy settings and transition notifications.

use crate::config::{OpenDurationFn, OpenHook, TransitionHook};
use crate::transitions::Transition;
use std::time::Duration;

/// Breaker settings rebuilt from each configuration
pub(crate) struct BreakerPolicy<E> {
    pub open_duration: OpenDurationFn,
    pub on_open: Option<OpenHook<E>>,
    pub on_close: Option<TransitionHook>,
    pub on_half_open: Option<TransitionHook>,
}

impl<E> BreakerPolicy<E> {
    /// Run the hook for a transition and emit its log event
    ///
    /// Called after the state lock is released so hooks may read the policy.
    pub(crate) fn notify(
        &self,
        transition: Transition,
        name: &str,
        logging: bool,
        retry_count: u32,
        failure: Option<&E>,
    ) where
        E: std::fmt::Display,
    {
        match transition {
            Transition::Opened {
                open_count,
                open_duration,
            } => {
                if logging {
                    let open_duration_ms =
                        u64::try_from(open_duration.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(
                        policy = %name,
                        retry_count,
                        open_count,
                        open_duration_ms,
                        error = %failure.map(|e| e.to_string()).unwrap_or_default(),
                        "circuit breaker opened"
                    );
                }
                if let Some(hook) = &self.on_open {
                    hook(open_count, open_duration, failure);
                }
            }
            Transition::HalfOpened => {
                if logging {
                    tracing::info!(
                        policy = %name,
                        retry_count,
                        "circuit breaker half-open, next call is a trial"
                    );
                }
                if let Some(hook) = &self.on_half_open {
                    hook();
                }
            }
            Transition::Closed => {
                if logging {
                    tracing::info!(
                        policy = %name,
                        retry_count,
                        open_count = 0,
                        "circuit breaker closed"
                    );
                }
                if let Some(hook) = &self.on_close {
                    hook();
                }
            }
            Transition::Isolated { open_count } => {
                if logging {
                    tracing::warn!(
                        policy = %name,
                        retry_count,
                        open_count,
                        "circuit breaker isolated manually"
                    );
                }
                if let Some(hook) = &self.on_open {
                    hook(open_count, Duration::MAX, None);
                }
            }
        }
    }
}
