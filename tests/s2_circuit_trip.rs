use gateway_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitStatus};
use gateway_core::clock::MockClock;
use std::sync::Arc;

#[test]
fn s2_circuit_trip_then_recovers() {
    let clock = MockClock::new(0);
    let breaker = CircuitBreaker::with_clock(
        CircuitBreakerConfig {
            failure_threshold: 5,
            timeout_ms: 60_000,
        },
        Arc::new(clock.clone()),
    );

    for _ in 0..5 {
        breaker.record_failure("p1");
    }

    let denied = breaker.check_circuit("p1");
    assert!(!denied.allowed);
    assert_eq!(denied.reason.as_deref(), Some("circuit-open"));

    clock.advance_ms(65_000);
    let allowed = breaker.check_circuit("p1");
    assert!(allowed.allowed);
    assert_eq!(breaker.get_state("p1").status, CircuitStatus::HalfOpen);

    breaker.record_success("p1");
    let state = breaker.get_state("p1");
    assert_eq!(state.status, CircuitStatus::Closed);
    assert_eq!(state.failures, 0);
}
