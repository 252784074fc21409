//! Retry and circuit breaker execution policy for async operations
//!
//! An [`ExecutionPolicy`] wraps fallible async work with bounded retry and a
//! circuit breaker, and reports state transitions through optional hooks.
//!
//! ## Architecture
//!
//! - [`types`] - Circuit states, execution outputs and stats snapshots
//! - [`config`] - The configuration model and hook signatures
//! - [`classifier`] - Decides which failures count toward retry and breaking
//! - [`backoff`] - Delay presets for the retry sub-policy
//! - [`profile`] - JSON-loadable policy settings
//! - [`state`] - Lock-guarded runtime state shared by concurrent calls
//! - `transitions` - The breaker state machine
//! - `retry` - The retry loop
//! - `policy` - The facade tying them together
//!
//! A failure matching no predicate is returned to the caller as `Err`
//! without being retried or counted. A handled failure is retried; once the
//! budget is spent the breaker opens and the call reports `Ok(false)`.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use bulwark_resilience::ExecutionPolicy;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Timeout,
//!     BadRequest,
//! }
//!
//! impl std::fmt::Display for FetchError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = ExecutionPolicy::new(|config| {
//!     config
//!         .with_name("fetch")
//!         .with_retry_max_attempt_count(3)
//!         .with_retry_delay(|attempt| Duration::from_millis(100 * u64::from(attempt)))
//!         .with_circuit_open_duration(|| Duration::from_secs(30))
//!         .handle(|e: &FetchError| matches!(e, FetchError::Timeout))
//!         .with_logging(true);
//! })?;
//!
//! let succeeded = policy
//!     .execute(|| async { Ok::<(), FetchError>(()) })
//!     .await
//!     .map_err(|e| e.to_string())?;
//! assert!(succeeded);
//! # Ok(())
//! # }
//! ```

pub mod backoff;
mod breaker;
pub mod classifier;
pub mod config;
mod policy;
pub mod profile;
mod retry;
pub mod state;
mod transitions;
pub mod types;

// Re-export public API
pub use backoff::Backoff;
pub use classifier::ExceptionClassifier;
pub use config::{PolicyConfiguration, PolicyHooks};
pub use policy::ExecutionPolicy;
pub use profile::PolicyProfile;
pub use state::RuntimeState;
pub use types::{CircuitState, ExecutionOutput, PolicyStats};
