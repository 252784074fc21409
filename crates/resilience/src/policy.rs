//! Execution policy: classifier, retry and circuit breaker behind one entry point.

use crate::breaker::BreakerPolicy;
use crate::classifier::{ExceptionClassifier, Failure};
use crate::config::PolicyConfiguration;
use crate::profile::PolicyProfile;
use crate::retry::RetryPolicy;
use crate::state::RuntimeState;
use crate::transitions::{Admission, StateTransitions, Transition};
use crate::types::{CircuitState, ExecutionOutput, PolicyStats};
use bulwark_core::{Error, Result};
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Sub-policies built from one configuration snapshot
struct ActivePolicy<E> {
    configuration: Arc<PolicyConfiguration<E>>,
    classifier: ExceptionClassifier<E>,
    retry: RetryPolicy<E>,
    breaker: BreakerPolicy<E>,
}

impl<E> ActivePolicy<E> {
    fn build(configuration: PolicyConfiguration<E>) -> Result<Self> {
        let delay = configuration
            .retry_delay
            .clone()
            .ok_or_else(|| Error::missing_configuration("retry_delay"))?;
        let open_duration = configuration
            .circuit_open_duration
            .clone()
            .ok_or_else(|| Error::missing_configuration("circuit_open_duration"))?;
        if configuration.name.trim().is_empty() {
            return Err(Error::configuration("policy name must not be empty"));
        }

        let hooks = configuration.hooks.clone();
        Ok(Self {
            classifier: ExceptionClassifier::new(configuration.handled_predicates.clone()),
            retry: RetryPolicy {
                max_attempts: configuration.retry_max_attempt_count,
                delay,
                on_retry: hooks.on_retry,
            },
            breaker: BreakerPolicy {
                open_duration,
                on_open: hooks.on_circuit_open,
                on_close: hooks.on_circuit_close,
                on_half_open: hooks.on_circuit_half_open,
            },
            configuration: Arc::new(configuration),
        })
    }

    fn name(&self) -> &str {
        &self.configuration.name
    }

    fn logging(&self) -> bool {
        self.configuration.logging_enabled
    }
}

/// Retryable, circuit-broken execution of async operations
///
/// One instance owns one breaker and its counters. Clone an `Arc` of the
/// policy to share it between tasks; concurrent executions are safe.
///
/// Failures of type `E` are classified by the configured predicates:
/// unhandled failures come back as `Err(E)` untouched, while handled
/// failures are retried and, once the budget is spent, open the breaker and
/// turn into `Ok(false)`.
pub struct ExecutionPolicy<E> {
    active: RwLock<Arc<ActivePolicy<E>>>,
    runtime: Arc<RuntimeState>,
    transitions: StateTransitions,
}

impl<E> fmt::Debug for ExecutionPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPolicy")
            .field("configuration", &self.active.read().configuration)
            .field("runtime", &self.runtime)
            .finish()
    }
}

impl<E: fmt::Display> ExecutionPolicy<E> {
    /// Create a policy from a configurator applied to a fresh default configuration
    pub fn new<C>(configurator: C) -> Result<Self>
    where
        C: FnOnce(&mut PolicyConfiguration<E>),
    {
        let active = Arc::new(Self::build_active(configurator)?);
        let runtime = Arc::new(RuntimeState::new());
        Ok(Self {
            active: RwLock::new(active),
            transitions: StateTransitions::new(Arc::clone(&runtime)),
            runtime,
        })
    }

    /// Create a policy from a profile, then let `configurator` add predicates and hooks
    pub fn from_profile<C>(profile: &PolicyProfile, configurator: C) -> Result<Self>
    where
        C: FnOnce(&mut PolicyConfiguration<E>),
    {
        profile.validate()?;
        Self::new(|config| {
            profile.apply(config);
            configurator(config);
        })
    }

    fn build_active<C>(configurator: C) -> Result<ActivePolicy<E>>
    where
        C: FnOnce(&mut PolicyConfiguration<E>),
    {
        let mut configuration = PolicyConfiguration::default();
        configurator(&mut configuration);
        ActivePolicy::build(configuration)
    }

    /// Replace the active configuration
    ///
    /// Circuit state and counters are preserved. Executions already running
    /// finish with the configuration they started with.
    pub fn configure<C>(&self, configurator: C) -> Result<()>
    where
        C: FnOnce(&mut PolicyConfiguration<E>),
    {
        let active = Arc::new(Self::build_active(configurator)?);
        if active.logging() {
            tracing::debug!(
                policy = %active.name(),
                retry_count = self.runtime.retry_count(),
                open_count = self.runtime.open_count(),
                "policy reconfigured"
            );
        }
        *self.active.write() = active;
        Ok(())
    }

    fn active(&self) -> Arc<ActivePolicy<E>> {
        self.active.read().clone()
    }

    fn notify(
        &self,
        active: &ActivePolicy<E>,
        transition: Option<Transition>,
        failure: Option<&E>,
    ) {
        if let Some(transition) = transition {
            active.breaker.notify(
                transition,
                active.name(),
                active.logging(),
                self.runtime.retry_count(),
                failure,
            );
        }
    }

    /// Run `operation` through breaker and retry, yielding its value on success
    async fn run<T, F, Fut>(&self, operation: F) -> std::result::Result<Option<T>, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let active = self.active();

        let (admission, transition) = self.transitions.admit();
        self.notify(&active, transition, None);

        let permit = match admission {
            Admission::Admitted(permit) => permit,
            Admission::Rejected(state) => {
                if active.logging() {
                    tracing::debug!(
                        policy = %active.name(),
                        state = %state,
                        retry_count = self.runtime.retry_count(),
                        open_count = self.runtime.open_count(),
                        "execution rejected by circuit breaker"
                    );
                }
                return Ok(None);
            }
        };

        let outcome = active
            .retry
            .run(
                active.name(),
                active.logging(),
                &active.classifier,
                &self.runtime,
                operation,
            )
            .await;

        match outcome {
            Ok(value) => {
                let transition = self.transitions.record_success(permit);
                self.notify(&active, transition, None);
                Ok(Some(value))
            }
            Err(Failure::Exhausted(error)) => {
                let trial = permit.is_trial();
                let transition = self
                    .transitions
                    .record_failure(permit, || (active.breaker.open_duration)());
                if active.logging() {
                    tracing::error!(
                        policy = %active.name(),
                        retry_count = self.runtime.retry_count(),
                        open_count = self.runtime.open_count(),
                        half_open_trial = trial,
                        error = %error,
                        "execution failed after exhausting retries"
                    );
                }
                self.notify(&active, transition, Some(&error));
                Ok(None)
            }
            Err(Failure::Unhandled(error)) => {
                self.transitions.release(permit);
                if active.logging() {
                    tracing::error!(
                        policy = %active.name(),
                        retry_count = self.runtime.retry_count(),
                        open_count = self.runtime.open_count(),
                        error = %error,
                        "unhandled failure"
                    );
                }
                Err(error)
            }
        }
    }

    /// Execute a zero-input, zero-output operation
    ///
    /// Returns `Ok(true)` when the operation completed, `Ok(false)` when it
    /// exhausted its retries or the breaker refused it, and `Err` for a
    /// failure no predicate handles.
    pub async fn execute<F, Fut>(&self, handler: F) -> std::result::Result<bool, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
    {
        Ok(self.run(handler).await?.is_some())
    }

    /// Execute an operation that takes `input`; every attempt receives a clone
    pub async fn execute_with_input<I, F, Fut>(
        &self,
        handler: F,
        input: I,
    ) -> std::result::Result<bool, E>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
    {
        Ok(self.run(|| handler(input.clone())).await?.is_some())
    }

    /// Execute an operation that takes `input` and produces a value
    pub async fn execute_with_output<I, T, F, Fut>(
        &self,
        handler: F,
        input: I,
    ) -> std::result::Result<ExecutionOutput<T>, E>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        Ok(match self.run(|| handler(input.clone())).await? {
            Some(output) => ExecutionOutput::completed(output),
            None => ExecutionOutput::failed(),
        })
    }

    /// Execute a zero-input operation that produces a value
    pub async fn execute_for_output<T, F, Fut>(
        &self,
        handler: F,
    ) -> std::result::Result<ExecutionOutput<T>, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        Ok(match self.run(handler).await? {
            Some(output) => ExecutionOutput::completed(output),
            None => ExecutionOutput::failed(),
        })
    }

    /// Isolate the breaker: reject everything until closed manually
    pub fn open_circuit_breaker_manually(&self) {
        let active = self.active();
        let transition = self.transitions.isolate();
        self.notify(&active, Some(transition), None);
    }

    /// Close the breaker and reset counters without waiting for a trial
    pub fn close_circuit_breaker_manually(&self) {
        let active = self.active();
        if active.logging() {
            tracing::warn!(
                policy = %active.name(),
                retry_count = self.runtime.retry_count(),
                open_count = self.runtime.open_count(),
                "closing circuit breaker manually"
            );
        }
        let transition = self.transitions.reset();
        self.notify(&active, transition, None);
    }

    /// Apply the Open to HalfOpen timeout before an observer reads state
    fn refresh(&self) {
        let transition = self.transitions.check_half_open_transition();
        if transition.is_some() {
            let active = self.active();
            self.notify(&active, transition, None);
        }
    }

    /// Current circuit state, moving Open to HalfOpen if the open duration elapsed
    pub fn circuit_state(&self) -> CircuitState {
        self.refresh();
        self.runtime.recorded_state()
    }

    pub fn current_retry_count(&self) -> u32 {
        self.refresh();
        self.runtime.retry_count()
    }

    pub fn current_circuit_breaker_open_count(&self) -> u32 {
        self.refresh();
        self.runtime.open_count()
    }

    pub fn name(&self) -> String {
        self.active.read().name().to_string()
    }

    /// Configuration snapshot currently in force
    pub fn configuration(&self) -> Arc<PolicyConfiguration<E>> {
        Arc::clone(&self.active.read().configuration)
    }

    pub fn stats(&self) -> PolicyStats {
        self.refresh();
        let name = self.name();
        self.runtime.snapshot(&name)
    }
}
