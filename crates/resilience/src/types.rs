//! Core types and enums for the execution policy.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed - requests pass through normally
    Closed,
    /// Circuit is open - requests fail immediately until the open duration elapses
    Open,
    /// Circuit is half-open - a single trial request decides the next state
    HalfOpen,
    /// Circuit was opened manually and stays open until closed manually
    Isolated,
}

impl CircuitState {
    /// Whether executions are refused outright in this state
    #[must_use]
    pub fn rejects_calls(self) -> bool {
        matches!(self, CircuitState::Open | CircuitState::Isolated)
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
            CircuitState::Isolated => write!(f, "isolated"),
        }
    }
}

/// Result of an execution that captures the handler's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput<T> {
    /// Whether the wrapped call completed and was not rejected
    pub success: bool,
    /// Handler output; always `None` when `success` is false
    pub output: Option<T>,
}

impl<T> ExecutionOutput<T> {
    pub(crate) fn completed(output: T) -> Self {
        Self {
            success: true,
            output: Some(output),
        }
    }

    pub(crate) fn failed() -> Self {
        Self {
            success: false,
            output: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Consume the result, yielding the output of a successful call
    pub fn into_output(self) -> Option<T> {
        self.output
    }
}

/// Point-in-time snapshot of a policy's runtime state
#[derive(Debug, Clone)]
pub struct PolicyStats {
    pub name: String,
    pub state: CircuitState,
    pub current_retry_count: u32,
    pub current_circuit_open_count: u32,
    pub half_open_trial_in_flight: bool,
    /// Open duration in force since the last entry into Open
    pub open_duration: Option<Duration>,
    pub opened_at: Option<Instant>,
    pub last_state_change: Instant,
}
