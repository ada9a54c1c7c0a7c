//! Circuit Breaker (SPEC_FULL.md §4.3): per-provider CLOSED/OPEN/HALF_OPEN
//! state machine, keyed by an opaque provider id.

use crate::clock::{system_clock, SharedClock};
use std::collections::HashMap;
use std::sync::Mutex;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_TIMEOUT_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_ms: i64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitState {
    pub status: CircuitStatus,
    pub failures: u32,
    pub last_failure: Option<i64>,
}

impl Default for CircuitState {
    fn default() -> Self {
        Self {
            status: CircuitStatus::Closed,
            failures: 0,
            last_failure: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl CheckResult {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
        }
    }
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: SharedClock,
    states: Mutex<HashMap<String, CircuitState>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            clock: system_clock(),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(config: CircuitBreakerConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a copy of the provider's state, creating a fresh CLOSED entry
    /// on first read.
    pub fn get_state(&self, provider_id: &str) -> CircuitState {
        let mut states = self.states.lock().expect("circuit breaker mutex poisoned");
        *states.entry(provider_id.to_string()).or_default()
    }

    /// Evaluate whether a call to `provider_id` is currently allowed,
    /// transitioning OPEN → HALF_OPEN lazily once the timeout has elapsed.
    pub fn check_circuit(&self, provider_id: &str) -> CheckResult {
        let mut states = self.states.lock().expect("circuit breaker mutex poisoned");
        let state = states.entry(provider_id.to_string()).or_default();

        match state.status {
            CircuitStatus::Closed | CircuitStatus::HalfOpen => CheckResult::allowed(),
            CircuitStatus::Open => {
                let now = self.clock.now_ms();
                let elapsed = state
                    .last_failure
                    .map(|lf| (now - lf).max(0))
                    .unwrap_or(i64::MAX);
                if elapsed >= self.config.timeout_ms {
                    state.status = CircuitStatus::HalfOpen;
                    CheckResult::allowed()
                } else {
                    CheckResult::denied("circuit-open")
                }
            }
        }
    }

    pub fn record_success(&self, provider_id: &str) {
        let mut states = self.states.lock().expect("circuit breaker mutex poisoned");
        let state = states.entry(provider_id.to_string()).or_default();
        state.status = CircuitStatus::Closed;
        state.failures = 0;
    }

    pub fn record_failure(&self, provider_id: &str) {
        let now = self.clock.now_ms();
        let mut states = self.states.lock().expect("circuit breaker mutex poisoned");
        let state = states.entry(provider_id.to_string()).or_default();

        match state.status {
            CircuitStatus::HalfOpen => {
                state.status = CircuitStatus::Open;
                state.last_failure = Some(now);
                state.failures += 1;
            }
            CircuitStatus::Closed => {
                state.failures += 1;
                if state.failures >= self.config.failure_threshold {
                    state.status = CircuitStatus::Open;
                    state.last_failure = Some(now);
                }
            }
            CircuitStatus::Open => {
                state.last_failure = Some(now);
                state.failures += 1;
            }
        }
    }

    pub fn reset(&self, provider_id: &str) {
        let mut states = self.states.lock().expect("circuit breaker mutex poisoned");
        states.insert(provider_id.to_string(), CircuitState::default());
    }

    pub fn reset_all(&self) {
        let mut states = self.states.lock().expect("circuit breaker mutex poisoned");
        states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use std::sync::Arc;

    fn breaker_with_clock(threshold: u32, timeout_ms: i64) -> (CircuitBreaker, MockClock) {
        let clock = MockClock::new(0);
        let breaker = CircuitBreaker::with_clock(
            CircuitBreakerConfig {
                failure_threshold: threshold,
                timeout_ms,
            },
            Arc::new(clock.clone()),
        );
        (breaker, clock)
    }

    #[test]
    fn fresh_provider_starts_closed() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        let state = breaker.get_state("p1");
        assert_eq!(state.status, CircuitStatus::Closed);
        assert_eq!(state.failures, 0);
    }

    #[test]
    fn trips_open_at_threshold() {
        let (breaker, _clock) = breaker_with_clock(3, 60_000);
        breaker.record_failure("p1");
        breaker.record_failure("p1");
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::Closed);
        breaker.record_failure("p1");
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::Open);
        assert!(!breaker.check_circuit("p1").allowed);
    }

    #[test]
    fn s2_circuit_trip_scenario() {
        let (breaker, clock) = breaker_with_clock(5, 60_000);
        for _ in 0..5 {
            breaker.record_failure("p1");
        }
        let result = breaker.check_circuit("p1");
        assert!(!result.allowed);
        assert_eq!(result.reason.as_deref(), Some("circuit-open"));

        clock.advance_ms(65_000);
        let result = breaker.check_circuit("p1");
        assert!(result.allowed);
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::HalfOpen);

        breaker.record_success("p1");
        let state = breaker.get_state("p1");
        assert_eq!(state.status, CircuitStatus::Closed);
        assert_eq!(state.failures, 0);
    }

    #[test]
    fn half_open_failure_reopens() {
        let (breaker, clock) = breaker_with_clock(2, 10_000);
        breaker.record_failure("p1");
        breaker.record_failure("p1");
        clock.advance_ms(10_000);
        assert!(breaker.check_circuit("p1").allowed);
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::HalfOpen);

        breaker.record_failure("p1");
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::Open);
    }

    #[test]
    fn clock_running_backwards_does_not_close_circuit() {
        let (breaker, clock) = breaker_with_clock(1, 60_000);
        clock.set_ms(100_000);
        breaker.record_failure("p1");
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::Open);

        // Clock jumps backwards (e.g. NTP correction).
        clock.set_ms(10_000);
        let result = breaker.check_circuit("p1");
        assert!(!result.allowed, "must not spuriously close on backwards clock");
    }

    #[test]
    fn providers_are_independent() {
        let (breaker, _clock) = breaker_with_clock(1, 60_000);
        breaker.record_failure("p1");
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::Open);
        assert_eq!(breaker.get_state("p2").status, CircuitStatus::Closed);
    }

    #[test]
    fn reset_and_reset_all() {
        let (breaker, _clock) = breaker_with_clock(1, 60_000);
        breaker.record_failure("p1");
        breaker.record_failure("p2");
        breaker.reset("p1");
        assert_eq!(breaker.get_state("p1").status, CircuitStatus::Closed);
        assert_eq!(breaker.get_state("p2").status, CircuitStatus::Open);
        breaker.reset_all();
        assert_eq!(breaker.get_state("p2").status, CircuitStatus::Closed);
    }
}
