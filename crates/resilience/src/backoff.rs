//! Delay presets for the retry sub-policy.
//!
//! Any `Fn(u32) -> Duration` works as a retry delay; these cover the common
//! shapes and can be loaded from a [`PolicyProfile`](crate::PolicyProfile).

use bulwark_core::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wait schedule between retry attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same wait before every attempt
    Constant { delay_ms: u64 },
    /// `step * attempt`
    Linear { step_ms: u64 },
    /// `base * 2^(attempt - 1)` capped at `max`, randomized by `jitter` (0.0 to 1.0)
    Exponential {
        base_ms: u64,
        max_ms: u64,
        #[serde(default)]
        jitter: f64,
    },
}

impl Backoff {
    /// Wait before the given 1-based attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match *self {
            Backoff::Constant { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Linear { step_ms } => {
                Duration::from_millis(step_ms.saturating_mul(u64::from(attempt)))
            }
            Backoff::Exponential {
                base_ms,
                max_ms,
                jitter,
            } => {
                let factor = 2u64.saturating_pow(attempt - 1);
                let capped = base_ms.saturating_mul(factor).min(max_ms);

                // Spread retries from concurrent callers
                if jitter > 0.0 {
                    let jitter_range = capped as f64 * jitter;
                    let offset = rand::thread_rng().gen_range(-1.0..=1.0) * jitter_range;
                    Duration::from_millis((capped as f64 + offset).max(0.0) as u64)
                } else {
                    Duration::from_millis(capped)
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Backoff::Exponential {
                base_ms,
                max_ms,
                jitter,
            } => {
                if !(0.0..=1.0).contains(&jitter) {
                    return Err(Error::configuration(format!(
                        "backoff jitter must be between 0.0 and 1.0, got {jitter}"
                    )));
                }
                if max_ms < base_ms {
                    return Err(Error::configuration(format!(
                        "backoff max_ms ({max_ms}) is smaller than base_ms ({base_ms})"
                    )));
                }
                Ok(())
            }
            Backoff::Constant { .. } | Backoff::Linear { .. } => Ok(()),
        }
    }
}
