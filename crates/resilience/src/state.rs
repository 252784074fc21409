//! Runtime state owned by a single execution policy.

use crate::types::{CircuitState, PolicyStats};
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Mutable breaker state and counters
///
/// Every field is read and written under the [`RuntimeState`] lock.
#[derive(Debug)]
pub(crate) struct BreakerCell {
    pub state: CircuitState,
    pub retry_count: u32,
    pub open_count: u32,
    pub opened_at: Option<Instant>,
    pub open_duration: Option<Duration>,
    pub trial_in_flight: bool,
    /// Bumped on every state change; outcomes from an older generation are ignored
    pub generation: u64,
    pub last_state_change: Instant,
}

/// Lock-guarded state shared by concurrent executions of one policy
///
/// The lock is held only while a counter or state transition is applied,
/// never across a handler invocation or a retry wait.
#[derive(Debug)]
pub struct RuntimeState {
    cell: Mutex<BreakerCell>,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self {
            cell: Mutex::new(BreakerCell {
                state: CircuitState::Closed,
                retry_count: 0,
                open_count: 0,
                opened_at: None,
                open_duration: None,
                trial_in_flight: false,
                generation: 0,
                last_state_change: Instant::now(),
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, BreakerCell> {
        self.cell.lock()
    }

    /// State as last recorded, without evaluating the open timeout
    pub fn recorded_state(&self) -> CircuitState {
        self.cell.lock().state
    }

    pub fn retry_count(&self) -> u32 {
        self.cell.lock().retry_count
    }

    pub fn open_count(&self) -> u32 {
        self.cell.lock().open_count
    }

    pub(crate) fn publish_retry_count(&self, attempt: u32) {
        self.cell.lock().retry_count = attempt;
    }

    pub fn snapshot(&self, name: &str) -> PolicyStats {
        let cell = self.cell.lock();
        PolicyStats {
            name: name.to_string(),
            state: cell.state,
            current_retry_count: cell.retry_count,
            current_circuit_open_count: cell.open_count,
            half_open_trial_in_flight: cell.trial_in_flight,
            open_duration: cell.open_duration,
            opened_at: cell.opened_at,
            last_state_change: cell.last_state_change,
        }
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerCell {
    fn mark_changed(&mut self, state: CircuitState) {
        self.state = state;
        self.trial_in_flight = false;
        self.generation += 1;
        self.last_state_change = Instant::now();
    }

    pub(crate) fn enter_open(&mut self, open_duration: Duration) {
        self.mark_changed(CircuitState::Open);
        self.open_count += 1;
        self.opened_at = Some(self.last_state_change);
        self.open_duration = Some(open_duration);
    }

    pub(crate) fn enter_isolated(&mut self) {
        self.mark_changed(CircuitState::Isolated);
        self.open_count += 1;
        self.opened_at = Some(self.last_state_change);
        self.open_duration = None;
    }

    pub(crate) fn enter_half_open(&mut self) {
        self.mark_changed(CircuitState::HalfOpen);
        self.retry_count = 0;
    }

    pub(crate) fn enter_closed(&mut self) {
        self.mark_changed(CircuitState::Closed);
        self.retry_count = 0;
        self.open_count = 0;
        self.opened_at = None;
        self.open_duration = None;
    }

    /// Whether an Open breaker has waited out its duration
    pub(crate) fn open_elapsed(&self) -> bool {
        match (self.state, self.opened_at, self.open_duration) {
            (CircuitState::Open, Some(opened_at), Some(duration)) => {
                opened_at.elapsed() >= duration
            }
            _ => false,
        }
    }
}
