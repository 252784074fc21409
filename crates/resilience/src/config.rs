//! Configuration model for the execution policy.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default policy name used until a configurator sets one
const DEFAULT_POLICY_NAME: &str = "default";

/// Maps a 1-based retry attempt to the wait before that attempt
pub type RetryDelayFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Produces how long the breaker stays open before admitting a trial
///
/// Called with the breaker state locked; it must not call back into the policy.
pub type OpenDurationFn = Arc<dyn Fn() -> Duration + Send + Sync>;

/// Decides whether a failure counts toward retry and breaker bookkeeping
pub type FailurePredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Called with `(attempt, delay, failure)` before each retry wait
pub type RetryHook<E> = Arc<dyn Fn(u32, Duration, &E) + Send + Sync>;

/// Called with `(open_count, open_duration, failure)` when the breaker opens
///
/// A manual isolation has no triggering failure and reports `Duration::MAX`,
/// since it lasts until the breaker is closed manually.
pub type OpenHook<E> = Arc<dyn Fn(u32, Duration, Option<&E>) + Send + Sync>;

/// Called on half-open and close transitions
pub type TransitionHook = Arc<dyn Fn() + Send + Sync>;

/// Optional lifecycle callbacks
///
/// Hooks run synchronously on the task that caused the transition, after the
/// runtime state has been updated. They observe; they cannot change the outcome.
pub struct PolicyHooks<E> {
    pub on_retry: Option<RetryHook<E>>,
    pub on_circuit_open: Option<OpenHook<E>>,
    pub on_circuit_close: Option<TransitionHook>,
    pub on_circuit_half_open: Option<TransitionHook>,
}

impl<E> Default for PolicyHooks<E> {
    fn default() -> Self {
        Self {
            on_retry: None,
            on_circuit_open: None,
            on_circuit_close: None,
            on_circuit_half_open: None,
        }
    }
}

impl<E> Clone for PolicyHooks<E> {
    fn clone(&self) -> Self {
        Self {
            on_retry: self.on_retry.clone(),
            on_circuit_open: self.on_circuit_open.clone(),
            on_circuit_close: self.on_circuit_close.clone(),
            on_circuit_half_open: self.on_circuit_half_open.clone(),
        }
    }
}

/// Settings applied to an [`ExecutionPolicy`](crate::ExecutionPolicy) at configure time
///
/// A fresh value carries no delay functions; a configurator must supply both
/// `retry_delay` and `circuit_open_duration` or configuration fails.
pub struct PolicyConfiguration<E> {
    /// Identifier attached to every log event
    pub name: String,
    /// Additional attempts after the first failure; 0 disables retry
    pub retry_max_attempt_count: u32,
    pub retry_delay: Option<RetryDelayFn>,
    pub circuit_open_duration: Option<OpenDurationFn>,
    /// Ordered predicates; a failure is handled if any of them matches
    pub handled_predicates: Vec<FailurePredicate<E>>,
    pub hooks: PolicyHooks<E>,
    pub logging_enabled: bool,
}

impl<E> Default for PolicyConfiguration<E> {
    fn default() -> Self {
        Self {
            name: DEFAULT_POLICY_NAME.to_string(),
            retry_max_attempt_count: 0,
            retry_delay: None,
            circuit_open_duration: None,
            handled_predicates: Vec::new(),
            hooks: PolicyHooks::default(),
            logging_enabled: false,
        }
    }
}

impl<E> Clone for PolicyConfiguration<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            retry_max_attempt_count: self.retry_max_attempt_count,
            retry_delay: self.retry_delay.clone(),
            circuit_open_duration: self.circuit_open_duration.clone(),
            handled_predicates: self.handled_predicates.clone(),
            hooks: self.hooks.clone(),
            logging_enabled: self.logging_enabled,
        }
    }
}

impl<E> fmt::Debug for PolicyConfiguration<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyConfiguration")
            .field("name", &self.name)
            .field("retry_max_attempt_count", &self.retry_max_attempt_count)
            .field("retry_delay", &self.retry_delay.as_ref().map(|_| "<fn>"))
            .field(
                "circuit_open_duration",
                &self.circuit_open_duration.as_ref().map(|_| "<fn>"),
            )
            .field("handled_predicates", &self.handled_predicates.len())
            .field("on_retry", &self.hooks.on_retry.is_some())
            .field("on_circuit_open", &self.hooks.on_circuit_open.is_some())
            .field("on_circuit_close", &self.hooks.on_circuit_close.is_some())
            .field(
                "on_circuit_half_open",
                &self.hooks.on_circuit_half_open.is_some(),
            )
            .field("logging_enabled", &self.logging_enabled)
            .finish()
    }
}

impl<E> PolicyConfiguration<E> {
    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn with_retry_max_attempt_count(&mut self, count: u32) -> &mut Self {
        self.retry_max_attempt_count = count;
        self
    }

    pub fn with_retry_delay<F>(&mut self, delay: F) -> &mut Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.retry_delay = Some(Arc::new(delay));
        self
    }

    pub fn with_circuit_open_duration<F>(&mut self, duration: F) -> &mut Self
    where
        F: Fn() -> Duration + Send + Sync + 'static,
    {
        self.circuit_open_duration = Some(Arc::new(duration));
        self
    }

    /// Append a predicate to the handled set
    pub fn handle<P>(&mut self, predicate: P) -> &mut Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.handled_predicates.push(Arc::new(predicate));
        self
    }

    pub fn on_retry<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(u32, Duration, &E) + Send + Sync + 'static,
    {
        self.hooks.on_retry = Some(Arc::new(hook));
        self
    }

    pub fn on_circuit_open<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(u32, Duration, Option<&E>) + Send + Sync + 'static,
    {
        self.hooks.on_circuit_open = Some(Arc::new(hook));
        self
    }

    pub fn on_circuit_close<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_circuit_close = Some(Arc::new(hook));
        self
    }

    pub fn on_circuit_half_open<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_circuit_half_open = Some(Arc::new(hook));
        self
    }

    pub fn with_logging(&mut self, enabled: bool) -> &mut Self {
        self.logging_enabled = enabled;
        self
    }

    /// Wait before the given 1-based attempt, if a delay function is set
    pub fn retry_delay_for(&self, attempt: u32) -> Option<Duration> {
        self.retry_delay.as_ref().map(|delay| delay(attempt))
    }

    /// Open duration the breaker would use if it opened now
    pub fn open_duration(&self) -> Option<Duration> {
        self.circuit_open_duration.as_ref().map(|duration| duration())
    }
}
