//! End-to-end scenarios for the execution policy's public API.

use bulwark_resilience::{Backoff, CircuitState, ExecutionPolicy, PolicyProfile};
use proptest::prelude::*;
use rstest::rstest;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum ServiceError {
    Argument,
    InvalidOperation,
    Corrupted,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Argument => write!(f, "argument rejected"),
            ServiceError::InvalidOperation => write!(f, "operation not valid in current state"),
            ServiceError::Corrupted => write!(f, "payload corrupted"),
        }
    }
}

fn policy(max_attempts: u32, retries_seen: Arc<AtomicU32>) -> ExecutionPolicy<ServiceError> {
    ExecutionPolicy::new(move |config| {
        config
            .with_name("scenario")
            .with_retry_max_attempt_count(max_attempts)
            .with_retry_delay(|attempt| Duration::from_millis(100 * u64::from(attempt)))
            .with_circuit_open_duration(|| Duration::from_secs(3))
            .handle(|e: &ServiceError| *e == ServiceError::Argument)
            .handle(|e: &ServiceError| *e == ServiceError::InvalidOperation)
            .on_retry(move |_, _, _| {
                retries_seen.fetch_add(1, Ordering::SeqCst);
            })
            .with_logging(true);
    })
    .expect("scenario policy is fully configured")
}

#[tokio::test(start_paused = true)]
async fn always_failing_then_recovering_service() {
    let retries = Arc::new(AtomicU32::new(0));
    let policy = policy(5, Arc::clone(&retries));

    let succeeded = policy
        .execute(|| async { Err(ServiceError::Argument) })
        .await
        .unwrap();
    assert!(!succeeded);
    assert_eq!(policy.current_retry_count(), 5);
    assert_eq!(policy.current_circuit_breaker_open_count(), 1);
    assert_eq!(policy.circuit_state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_secs(4)).await;

    let succeeded = policy.execute(|| async { Ok(()) }).await.unwrap();
    assert!(succeeded);
    assert_eq!(policy.circuit_state(), CircuitState::Closed);
    assert_eq!(policy.current_retry_count(), 0);
    assert_eq!(policy.current_circuit_breaker_open_count(), 0);
    assert_eq!(retries.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn corrupted_payload_surfaces_as_error() {
    let retries = Arc::new(AtomicU32::new(0));
    let policy = policy(5, Arc::clone(&retries));

    let result = policy
        .execute_for_output(|| async { Err::<Vec<u8>, _>(ServiceError::Corrupted) })
        .await;

    assert_eq!(result, Err(ServiceError::Corrupted));
    assert_eq!(retries.load(Ordering::SeqCst), 0);
    assert_eq!(policy.circuit_state(), CircuitState::Closed);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[case(5)]
#[tokio::test(start_paused = true)]
async fn breaker_opens_after_budget_plus_one_calls(#[case] max_attempts: u32) {
    let retries = Arc::new(AtomicU32::new(0));
    let policy = policy(max_attempts, Arc::clone(&retries));
    let calls = AtomicU32::new(0);

    let succeeded = policy
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServiceError::InvalidOperation) }
        })
        .await
        .unwrap();

    assert!(!succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), max_attempts + 1);
    assert_eq!(retries.load(Ordering::SeqCst), max_attempts);
    assert_eq!(policy.current_circuit_breaker_open_count(), 1);
    assert_eq!(policy.circuit_state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn profile_backed_policy() {
    let profile = PolicyProfile {
        name: "profiled".to_string(),
        retry_max_attempt_count: 2,
        backoff: Backoff::Constant { delay_ms: 50 },
        circuit_open_duration_ms: 1_000,
        logging_enabled: false,
    };
    let policy = ExecutionPolicy::from_profile(&profile, |config| {
        config.handle(|e: &ServiceError| *e == ServiceError::Argument);
    })
    .unwrap();

    assert_eq!(policy.name(), "profiled");
    let attempts = AtomicU32::new(0);
    let output = policy
        .execute_with_output(
            |base: u32| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(ServiceError::Argument)
                    } else {
                        Ok(base + attempt)
                    }
                }
            },
            40,
        )
        .await
        .unwrap();

    assert_eq!(output.output, Some(42));
    assert_eq!(policy.current_retry_count(), 0);
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn succeeding_handler_never_moves_the_breaker(max_attempts in 0u32..20, runs in 1usize..8) {
        paused_runtime().block_on(async {
            let policy = policy(max_attempts, Arc::new(AtomicU32::new(0)));
            for _ in 0..runs {
                let succeeded = policy.execute(|| async { Ok(()) }).await.unwrap();
                prop_assert!(succeeded);
            }
            prop_assert_eq!(policy.circuit_state(), CircuitState::Closed);
            prop_assert_eq!(policy.current_retry_count(), 0);
            prop_assert_eq!(policy.current_circuit_breaker_open_count(), 0);
            Ok(())
        })?;
    }

    #[test]
    fn handled_failures_retry_exactly_the_budget(max_attempts in 0u32..12) {
        paused_runtime().block_on(async {
            let retries = Arc::new(AtomicU32::new(0));
            let policy = policy(max_attempts, Arc::clone(&retries));
            let succeeded = policy
                .execute(|| async { Err(ServiceError::Argument) })
                .await
                .unwrap();
            prop_assert!(!succeeded);
            prop_assert_eq!(retries.load(Ordering::SeqCst), max_attempts);
            prop_assert_eq!(policy.current_circuit_breaker_open_count(), 1);
            Ok(())
        })?;
    }
}
