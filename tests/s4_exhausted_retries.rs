use gateway_core::backoff::BackoffConfig;
use gateway_core::errors::GatewayError;
use gateway_core::retry::{execute_with_retry, RetryConfig, RetryHooks};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct FailureCounter {
    failures: Mutex<u32>,
}

impl RetryHooks for FailureCounter {
    fn on_failure(&self, attempts: u32, _error_history: &[String]) {
        *self.failures.lock().unwrap() = attempts;
    }
}

#[tokio::test]
async fn s4_all_three_calls_reject() {
    let calls = AtomicU32::new(0);
    let cancel = CancellationToken::new();
    let config = RetryConfig {
        max_retries: 3,
        backoff: BackoffConfig {
            base_delay_ms: 1,
            max_delay_ms: 2,
        },
    };
    let hooks = FailureCounter::default();

    let result: Result<(), GatewayError> = execute_with_retry(
        |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GatewayError::ServerError { status: 500 }) }
        },
        &config,
        &hooks,
        &cancel,
        None,
    )
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result.unwrap_err() {
        GatewayError::RetryExhausted {
            message,
            attempts,
            error_history,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(error_history.len(), 3);
            assert!(message.contains("after 3 attempts"));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    assert_eq!(*hooks.failures.lock().unwrap(), 3);
}
