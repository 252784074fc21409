//! State transition logic for the circuit breaker.

use crate::state::RuntimeState;
use crate::types::CircuitState;
use std::sync::Arc;
use std::time::Duration;

/// A state change that hooks and logs need to hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Opened {
        open_count: u32,
        open_duration: Duration,
    },
    HalfOpened,
    Closed,
    Isolated {
        open_count: u32,
    },
}

/// Result of asking the breaker to let an execution through
pub(crate) enum Admission {
    Admitted(Permit),
    Rejected(CircuitState),
}

/// Ticket for one admitted execution
///
/// A half-open trial permit that is dropped without being settled (the
/// caller's future was cancelled) frees the trial slot again.
pub(crate) struct Permit {
    runtime: Arc<RuntimeState>,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl Permit {
    pub(crate) fn is_trial(&self) -> bool {
        self.trial
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            let mut cell = self.runtime.lock();
            if cell.generation == self.generation {
                cell.trial_in_flight = false;
            }
        }
    }
}

/// Handles state transitions for the circuit breaker
pub(crate) struct StateTransitions {
    runtime: Arc<RuntimeState>,
}

impl StateTransitions {
    pub(crate) fn new(runtime: Arc<RuntimeState>) -> Self {
        Self { runtime }
    }

    /// Move an Open breaker to HalfOpen once its open duration has elapsed
    pub(crate) fn check_half_open_transition(&self) -> Option<Transition> {
        let mut cell = self.runtime.lock();
        if cell.open_elapsed() {
            cell.enter_half_open();
            return Some(Transition::HalfOpened);
        }
        None
    }

    /// Decide whether an execution may run
    ///
    /// Closed admits everyone. HalfOpen admits a single trial at a time.
    /// Open and Isolated reject.
    pub(crate) fn admit(&self) -> (Admission, Option<Transition>) {
        let mut cell = self.runtime.lock();

        let transition = if cell.open_elapsed() {
            cell.enter_half_open();
            Some(Transition::HalfOpened)
        } else {
            None
        };

        let admission = match cell.state {
            CircuitState::Closed => Admission::Admitted(Permit {
                runtime: Arc::clone(&self.runtime),
                generation: cell.generation,
                trial: false,
                settled: false,
            }),
            CircuitState::HalfOpen if !cell.trial_in_flight => {
                cell.trial_in_flight = true;
                Admission::Admitted(Permit {
                    runtime: Arc::clone(&self.runtime),
                    generation: cell.generation,
                    trial: true,
                    settled: false,
                })
            }
            state => Admission::Rejected(state),
        };

        (admission, transition)
    }

    /// Record a successful execution
    ///
    /// Resets the retry count of a closed breaker, even when the call started
    /// under an earlier generation. Only a trial from the current generation
    /// closes a half-open breaker.
    pub(crate) fn record_success(&self, mut permit: Permit) -> Option<Transition> {
        permit.settled = true;
        let mut cell = self.runtime.lock();
        match cell.state {
            CircuitState::Closed => {
                cell.retry_count = 0;
                None
            }
            CircuitState::HalfOpen
                if permit.trial && cell.generation == permit.generation =>
            {
                cell.enter_closed();
                Some(Transition::Closed)
            }
            _ => None,
        }
    }

    /// Record a handled failure that the retry sub-policy could not absorb
    ///
    /// `open_duration` is only called when the breaker actually opens, with the
    /// state lock held.
    pub(crate) fn record_failure<D>(
        &self,
        mut permit: Permit,
        open_duration: D,
    ) -> Option<Transition>
    where
        D: FnOnce() -> Duration,
    {
        permit.settled = true;
        let mut cell = self.runtime.lock();
        if cell.generation != permit.generation {
            return None;
        }

        match cell.state {
            CircuitState::Closed | CircuitState::HalfOpen => {
                let open_duration = open_duration();
                cell.enter_open(open_duration);
                Some(Transition::Opened {
                    open_count: cell.open_count,
                    open_duration,
                })
            }
            CircuitState::Open | CircuitState::Isolated => None,
        }
    }

    /// Give the permit back without affecting state or counters
    pub(crate) fn release(&self, permit: Permit) {
        // Drop frees an unsettled trial slot
        drop(permit);
    }

    /// Force the breaker into isolation from any state
    pub(crate) fn isolate(&self) -> Transition {
        let mut cell = self.runtime.lock();
        cell.enter_isolated();
        Transition::Isolated {
            open_count: cell.open_count,
        }
    }

    /// Force the breaker closed and reset both counters
    ///
    /// Returns a transition only when the breaker was not already closed.
    pub(crate) fn reset(&self) -> Option<Transition> {
        let mut cell = self.runtime.lock();
        if cell.state == CircuitState::Closed {
            cell.retry_count = 0;
            cell.open_count = 0;
            return None;
        }
        cell.enter_closed();
        Some(Transition::Closed)
    }
}
