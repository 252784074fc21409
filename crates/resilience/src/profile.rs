//! Serializable policy settings.
//!
//! Closures cannot come from a file, so a profile carries the data half of a
//! [`PolicyConfiguration`]: name, retry budget, backoff shape, open duration and
//! the logging gate. Predicates and hooks are still added in code.

use crate::backoff::Backoff;
use crate::config::PolicyConfiguration;
use bulwark_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Data-only policy settings loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyProfile {
    pub name: String,
    #[serde(default)]
    pub retry_max_attempt_count: u32,
    pub backoff: Backoff,
    pub circuit_open_duration_ms: u64,
    #[serde(default)]
    pub logging_enabled: bool,
}

impl PolicyProfile {
    /// Profile for network operations
    pub fn for_network() -> Self {
        Self {
            name: "network".to_string(),
            retry_max_attempt_count: 5,
            backoff: Backoff::Exponential {
                base_ms: 200,
                max_ms: 30_000,
                jitter: 0.2,
            },
            circuit_open_duration_ms: 30_000,
            logging_enabled: true,
        }
    }

    /// Profile for filesystem operations
    pub fn for_filesystem() -> Self {
        Self {
            name: "filesystem".to_string(),
            retry_max_attempt_count: 3,
            backoff: Backoff::Exponential {
                base_ms: 50,
                max_ms: 2_000,
                jitter: 0.1,
            },
            circuit_open_duration_ms: 5_000,
            logging_enabled: true,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read policy profile", e))?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::configuration("policy profile name must not be empty"));
        }
        if self.circuit_open_duration_ms == 0 {
            return Err(Error::configuration(format!(
                "policy profile '{}' has a zero circuit open duration",
                self.name
            )));
        }
        self.backoff.validate()
    }

    pub fn circuit_open_duration(&self) -> Duration {
        Duration::from_millis(self.circuit_open_duration_ms)
    }

    /// Write the profile's settings into a configuration, supplying both delay functions
    pub fn apply<E>(&self, config: &mut PolicyConfiguration<E>) {
        let backoff = self.backoff.clone();
        let open_duration = self.circuit_open_duration();

        config
            .with_name(self.name.clone())
            .with_retry_max_attempt_count(self.retry_max_attempt_count)
            .with_retry_delay(move |attempt| backoff.delay_for(attempt))
            .with_circuit_open_duration(move || open_duration)
            .with_logging(self.logging_enabled);
    }
}
