//! Rate-Limit Tracker (SPEC_FULL.md §4.5): per-(providerType, model) capacity,
//! cooldown, health, and performance tracking, with optional JSON
//! persistence.

use crate::clock::{system_clock, SharedClock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const WINDOW_MS: i64 = 60_000;
const DAY_MS: i64 = 86_400_000;
const PERF_HISTORY_CAP: usize = 100;
const PERF_AVERAGE_SAMPLE_COUNT: usize = 20;
const DEFAULT_COOLDOWN_SECS: u64 = 60;
const UNHEALTHY_SCORE_THRESHOLD: f64 = 30.0;
const UNHEALTHY_CONSECUTIVE_ERRORS: u32 = 3;

fn key(provider_type: &str, model: &str) -> (String, String) {
    (provider_type.to_string(), model.to_string())
}

#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    timestamp_ms: i64,
    tokens: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct PerformanceSample {
    pub time_to_first_token_ms: u64,
    pub total_duration_ms: u64,
    pub timestamp_ms: i64,
}

/// Static capacity limits for a model. `None` means unlimited (∞).
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitCapacity {
    pub requests_per_minute: Option<u64>,
    pub tokens_per_minute: Option<u64>,
    pub requests_per_day: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Capacity {
    pub requests: Option<u64>,
    pub tokens: Option<u64>,
    pub requests_today: Option<u64>,
    pub available: bool,
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AveragePerformance {
    pub avg_ttft_ms: f64,
    pub avg_duration_ms: f64,
    pub sample_size: usize,
}

struct ModelRateLimit {
    requests_per_minute: Option<u64>,
    tokens_per_minute: Option<u64>,
    requests_per_day: Option<u64>,

    requests_used: u64,
    tokens_used: u64,
    requests_today: u64,
    request_history: VecDeque<HistoryEntry>,
    token_history: VecDeque<HistoryEntry>,

    unavailable_until: Option<i64>,
    retry_after: Option<u64>,

    last_reset: i64,
    last_day_reset: i64,

    total_requests: u64,
    successful_requests: u64,
    consecutive_errors: u32,

    performance_history: VecDeque<PerformanceSample>,
    last_response_headers: HashMap<String, String>,
}

impl ModelRateLimit {
    fn new(now: i64, limits: RateLimitCapacity) -> Self {
        Self {
            requests_per_minute: limits.requests_per_minute,
            tokens_per_minute: limits.tokens_per_minute,
            requests_per_day: limits.requests_per_day,
            requests_used: 0,
            tokens_used: 0,
            requests_today: 0,
            request_history: VecDeque::new(),
            token_history: VecDeque::new(),
            unavailable_until: None,
            retry_after: None,
            last_reset: now,
            last_day_reset: now,
            total_requests: 0,
            successful_requests: 0,
            consecutive_errors: 0,
            performance_history: VecDeque::new(),
            last_response_headers: HashMap::new(),
        }
    }

    fn clean_history(&mut self, now: i64) {
        while let Some(front) = self.request_history.front() {
            if now - front.timestamp_ms >= WINDOW_MS {
                self.request_history.pop_front();
            } else {
                break;
            }
        }
        while let Some(front) = self.token_history.front() {
            if now - front.timestamp_ms >= WINDOW_MS {
                self.token_history.pop_front();
            } else {
                break;
            }
        }
        self.requests_used = self.request_history.len() as u64;
        self.tokens_used = self.token_history.iter().map(|e| e.tokens).sum();
    }

    fn opportunistic_reset(&mut self, now: i64) {
        if now - self.last_reset >= WINDOW_MS {
            self.clean_history(now);
            self.last_reset = now;
        }
        if now - self.last_day_reset >= DAY_MS {
            self.requests_today = 0;
            self.last_day_reset = now;
        }
    }

    fn track_request(&mut self, now: i64, tokens: u64) {
        self.clean_history(now);
        self.request_history.push_back(HistoryEntry {
            timestamp_ms: now,
            tokens,
        });
        self.token_history.push_back(HistoryEntry {
            timestamp_ms: now,
            tokens,
        });
        self.requests_used = self.request_history.len() as u64;
        self.tokens_used = self.token_history.iter().map(|e| e.tokens).sum();
        self.requests_today += 1;
    }

    fn can_make_request(&self, now: i64, required_tokens: u64) -> bool {
        if let Some(until) = self.unavailable_until {
            if now < until {
                return false;
            }
        }
        let rpm_ok = self.requests_per_minute.is_none_or(|rpm| self.requests_used < rpm);
        let tpm_ok = self
            .tokens_per_minute
            .is_none_or(|tpm| self.tokens_used + required_tokens <= tpm);
        let rpd_ok = self.requests_per_day.is_none_or(|rpd| self.requests_today < rpd);
        rpm_ok && tpm_ok && rpd_ok
    }

    fn capacity(&self, now: i64) -> Capacity {
        let available = self.can_make_request(now, 0);
        Capacity {
            requests: self.requests_per_minute.map(|rpm| rpm.saturating_sub(self.requests_used)),
            tokens: self.tokens_per_minute.map(|tpm| tpm.saturating_sub(self.tokens_used)),
            requests_today: self
                .requests_per_day
                .map(|rpd| rpd.saturating_sub(self.requests_today)),
            available,
            retry_after: self.retry_after,
        }
    }

    fn health_score(&self) -> f64 {
        if self.total_requests == 0 {
            return 100.0;
        }
        let success_ratio = self.successful_requests as f64 / self.total_requests as f64;
        let score = 70.0 * success_ratio - 3.0 * (self.consecutive_errors.min(10) as f64);
        score.clamp(0.0, 100.0)
    }

    fn is_healthy(&self) -> bool {
        self.health_score() >= UNHEALTHY_SCORE_THRESHOLD && self.consecutive_errors < UNHEALTHY_CONSECUTIVE_ERRORS
    }

    fn record_performance(&mut self, now: i64, sample: PerformanceSample) {
        let mut sample = sample;
        if sample.timestamp_ms == 0 {
            sample.timestamp_ms = now;
        }
        if self.performance_history.len() >= PERF_HISTORY_CAP {
            self.performance_history.pop_front();
        }
        self.performance_history.push_back(sample);
    }

    fn average_performance(&self) -> Option<AveragePerformance> {
        if self.performance_history.is_empty() {
            return None;
        }
        let recent: Vec<&PerformanceSample> = self
            .performance_history
            .iter()
            .rev()
            .take(PERF_AVERAGE_SAMPLE_COUNT)
            .collect();
        let n = recent.len();
        let avg_ttft = recent.iter().map(|s| s.time_to_first_token_ms as f64).sum::<f64>() / n as f64;
        let avg_duration = recent.iter().map(|s| s.total_duration_ms as f64).sum::<f64>() / n as f64;
        Some(AveragePerformance {
            avg_ttft_ms: avg_ttft,
            avg_duration_ms: avg_duration,
            sample_size: n,
        })
    }
}

/// A `{save, load}` persistence hook for tracker state (§6).
pub trait Persistence: Send + Sync {
    fn save(&self, state: &TrackerState);
    fn load(&self) -> Option<TrackerState>;
}

/// JSON-serializable snapshot of the tracker, keyed `[providerType][model]`
/// (§6's persisted state layout). `None` numeric fields round-trip as `null`,
/// preserving ∞.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerState(pub HashMap<String, HashMap<String, PersistedModelState>>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedModelState {
    pub model_name: String,
    pub requests_per_minute: Option<u64>,
    pub tokens_per_minute: Option<u64>,
    pub requests_per_day: Option<u64>,
    pub requests_used: u64,
    pub tokens_used: u64,
    pub requests_today: u64,
    pub last_reset: i64,
    pub last_day_reset: i64,
    pub unavailable_until: Option<i64>,
    pub retry_after: Option<u64>,
}

pub struct RateLimitTracker {
    clock: SharedClock,
    auto_reset: bool,
    persistence: Option<std::sync::Arc<dyn Persistence>>,
    records: Mutex<HashMap<(String, String), ModelRateLimit>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            clock,
            auto_reset: true,
            persistence: None,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_persistence(clock: SharedClock, persistence: std::sync::Arc<dyn Persistence>) -> Self {
        let tracker = Self {
            clock,
            auto_reset: true,
            persistence: Some(persistence),
            records: Mutex::new(HashMap::new()),
        };
        if let Some(state) = tracker.persistence.as_ref().unwrap().load() {
            tracker.load_state(&state);
        }
        tracker
    }

    fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    fn persist(&self) {
        if let Some(p) = &self.persistence {
            p.save(&self.to_state());
        }
    }

    fn with_record<R>(&self, provider_type: &str, model: &str, f: impl FnOnce(&mut ModelRateLimit) -> R) -> R {
        let mut records = self.records.lock().expect("tracker mutex poisoned");
        let now = self.now();
        let record = records
            .entry(key(provider_type, model))
            .or_insert_with(|| ModelRateLimit::new(now, RateLimitCapacity::default()));
        if self.auto_reset {
            record.opportunistic_reset(now);
        }
        f(record)
    }

    pub fn configure_limits(&self, provider_type: &str, model: &str, limits: RateLimitCapacity) {
        let mut records = self.records.lock().expect("tracker mutex poisoned");
        let now = self.now();
        let record = records
            .entry(key(provider_type, model))
            .or_insert_with(|| ModelRateLimit::new(now, limits));
        record.requests_per_minute = limits.requests_per_minute;
        record.tokens_per_minute = limits.tokens_per_minute;
        record.requests_per_day = limits.requests_per_day;
    }

    pub fn track_request(&self, provider_type: &str, model: &str, tokens: u64) {
        let now = self.now();
        self.with_record(provider_type, model, |r| r.track_request(now, tokens));
        self.persist();
    }

    pub fn can_make_request(&self, provider_type: &str, model: &str, required_tokens: u64) -> bool {
        let now = self.now();
        self.with_record(provider_type, model, |r| r.can_make_request(now, required_tokens))
    }

    pub fn get_capacity(&self, provider_type: &str, model: &str) -> Capacity {
        let now = self.now();
        self.with_record(provider_type, model, |r| r.capacity(now))
    }

    pub fn update_from_429(&self, provider_type: &str, model: &str, retry_after_secs: Option<u64>) {
        let now = self.now();
        let secs = retry_after_secs.unwrap_or(DEFAULT_COOLDOWN_SECS);
        self.with_record(provider_type, model, |r| {
            r.unavailable_until = Some(now + secs as i64 * 1000);
            r.retry_after = Some(secs);
            r.total_requests += 1;
            r.consecutive_errors += 1;
        });
        self.persist();
    }

    pub fn update_from_headers(&self, provider_type: &str, model: &str, headers: &HashMap<String, String>) {
        let now = self.now();
        self.with_record(provider_type, model, |r| {
            r.last_response_headers = headers.clone();

            if let Some(v) = headers.get("x-ratelimit-limit-requests").and_then(|v| v.parse::<u64>().ok()) {
                r.requests_per_minute = Some(v);
            }
            if let Some(v) = headers
                .get("x-ratelimit-remaining-requests")
                .and_then(|v| v.parse::<u64>().ok())
            {
                if let Some(limit) = r.requests_per_minute {
                    r.requests_used = limit.saturating_sub(v);
                }
            }

            // Once the request quota is exhausted, `x-ratelimit-reset-requests` tells us
            // when it frees up again. Its magnitude is ambiguous (epoch-ms, epoch-s, or
            // seconds-from-now), so disambiguate via `resolve_reset_value` (§4.5).
            let requests_exhausted = r.requests_per_minute.is_some_and(|rpm| r.requests_used >= rpm);
            if requests_exhausted {
                if let Some(raw) = headers
                    .get("x-ratelimit-reset-requests")
                    .and_then(|v| v.trim().trim_end_matches('s').parse::<f64>().ok())
                {
                    if let Some(resolved_ms) = resolve_reset_value(raw, now) {
                        let wait_secs = ((resolved_ms - now).max(0) / 1000) as u64;
                        r.unavailable_until = Some(resolved_ms);
                        r.retry_after = Some(wait_secs);
                    }
                }
            }

            if let Some(v) = headers.get("x-ratelimit-limit-tokens").and_then(|v| v.parse::<u64>().ok()) {
                r.tokens_per_minute = Some(v);
            }
            if let Some(v) = headers
                .get("x-ratelimit-remaining-tokens")
                .and_then(|v| v.parse::<u64>().ok())
            {
                if let Some(limit) = r.tokens_per_minute {
                    r.tokens_used = limit.saturating_sub(v);
                }
            }
            if let Some(v) = headers
                .get("x-goog-quota-limit")
                .and_then(|v| v.parse::<u64>().ok())
            {
                r.requests_per_minute = Some(v);
            }
            if let Some(v) = headers
                .get("x-goog-quota-remaining")
                .and_then(|v| v.parse::<u64>().ok())
            {
                if let Some(limit) = r.requests_per_minute {
                    r.requests_used = limit.saturating_sub(v);
                }
            }

            // `retry-after` takes precedence over standard headers for scheduling.
            if let Some(raw) = headers.get("retry-after") {
                if let Some(secs) = parse_retry_after(raw) {
                    r.unavailable_until = Some(now + secs as i64 * 1000);
                    r.retry_after = Some(secs);
                }
            }
        });
        self.persist();
    }

    pub fn record_success(&self, provider_type: &str, model: &str) {
        self.with_record(provider_type, model, |r| {
            r.total_requests += 1;
            r.successful_requests += 1;
            r.consecutive_errors = 0;
        });
        self.persist();
    }

    pub fn record_error(&self, provider_type: &str, model: &str) {
        self.with_record(provider_type, model, |r| {
            r.total_requests += 1;
            r.consecutive_errors += 1;
        });
        self.persist();
    }

    pub fn record_performance(&self, provider_type: &str, model: &str, sample: PerformanceSample) {
        let now = self.now();
        self.with_record(provider_type, model, |r| r.record_performance(now, sample));
        self.persist();
    }

    pub fn get_average_performance(&self, provider_type: &str, model: &str) -> Option<AveragePerformance> {
        self.with_record(provider_type, model, |r| r.average_performance())
    }

    pub fn health_score(&self, provider_type: &str, model: &str) -> f64 {
        self.with_record(provider_type, model, |r| r.health_score())
    }

    pub fn is_healthy(&self, provider_type: &str, model: &str) -> bool {
        self.with_record(provider_type, model, |r| r.is_healthy())
    }

    /// Drop candidates whose tracked health is below threshold. Candidates
    /// with no tracker history are treated as healthy.
    pub fn filter_by_health<'a>(&self, candidates: &[&'a crate::model::Candidate]) -> Vec<&'a crate::model::Candidate> {
        candidates
            .iter()
            .copied()
            .filter(|c| {
                let records = self.records.lock().expect("tracker mutex poisoned");
                match records.get(&key(&c.provider_type, &c.model.name)) {
                    Some(r) => r.is_healthy(),
                    None => true,
                }
            })
            .collect()
    }

    /// Sort candidates descending-healthy then ascending by average
    /// time-to-first-token; candidates lacking perf data keep their relative
    /// input order and sort after those with data.
    pub fn sort_by_speed<'a>(&self, candidates: &mut Vec<&'a crate::model::Candidate>) {
        let records = self.records.lock().expect("tracker mutex poisoned");
        let perf = |c: &crate::model::Candidate| -> Option<f64> {
            records
                .get(&key(&c.provider_type, &c.model.name))
                .and_then(|r| r.average_performance())
                .map(|p| p.avg_ttft_ms)
        };
        let healthy = |c: &crate::model::Candidate| -> bool {
            records
                .get(&key(&c.provider_type, &c.model.name))
                .map(|r| r.is_healthy())
                .unwrap_or(true)
        };
        candidates.sort_by(|a, b| {
            let healthy_cmp = healthy(b).cmp(&healthy(a));
            if healthy_cmp != std::cmp::Ordering::Equal {
                return healthy_cmp;
            }
            match (perf(a), perf(b)) {
                (Some(pa), Some(pb)) => pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
    }

    pub fn to_state(&self) -> TrackerState {
        let records = self.records.lock().expect("tracker mutex poisoned");
        let mut out: HashMap<String, HashMap<String, PersistedModelState>> = HashMap::new();
        for ((provider_type, model), record) in records.iter() {
            out.entry(provider_type.clone()).or_default().insert(
                model.clone(),
                PersistedModelState {
                    model_name: model.clone(),
                    requests_per_minute: record.requests_per_minute,
                    tokens_per_minute: record.tokens_per_minute,
                    requests_per_day: record.requests_per_day,
                    requests_used: record.requests_used,
                    tokens_used: record.tokens_used,
                    requests_today: record.requests_today,
                    last_reset: record.last_reset,
                    last_day_reset: record.last_day_reset,
                    unavailable_until: record.unavailable_until,
                    retry_after: record.retry_after,
                },
            );
        }
        TrackerState(out)
    }

    pub fn load_state(&self, state: &TrackerState) {
        let mut records = self.records.lock().expect("tracker mutex poisoned");
        for (provider_type, models) in &state.0 {
            for (model, persisted) in models {
                let now = self.now();
                let mut record = ModelRateLimit::new(now, RateLimitCapacity::default());
                record.requests_per_minute = persisted.requests_per_minute;
                record.tokens_per_minute = persisted.tokens_per_minute;
                record.requests_per_day = persisted.requests_per_day;
                record.requests_used = persisted.requests_used;
                record.tokens_used = persisted.tokens_used;
                record.requests_today = persisted.requests_today;
                record.last_reset = persisted.last_reset;
                record.last_day_reset = persisted.last_day_reset;
                record.unavailable_until = persisted.unavailable_until;
                record.retry_after = persisted.retry_after;
                records.insert(key(provider_type, model), record);
            }
        }
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a `retry-after` header value: either a bare/`"Ns"` second count.
fn parse_retry_after(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    let numeric = trimmed.strip_suffix('s').unwrap_or(trimmed);
    numeric.parse::<u64>().ok()
}

/// Disambiguate a provider-supplied reset value by magnitude, per §4.5:
/// values above 1e12 are epoch-millis, above 1e9 are epoch-seconds, else a
/// relative "seconds from now" duration. Returns the resolved epoch-ms.
pub fn resolve_reset_value(raw: f64, now_ms: i64) -> Option<i64> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    if raw > 1e12 {
        Some(raw as i64)
    } else if raw > 1e9 {
        Some((raw * 1000.0) as i64)
    } else {
        Some(now_ms + (raw * 1000.0) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use std::sync::Arc;

    fn tracker_with_clock() -> (RateLimitTracker, MockClock) {
        let clock = MockClock::new(0);
        let tracker = RateLimitTracker::with_clock(Arc::new(clock.clone()));
        (tracker, clock)
    }

    #[test]
    fn invariant_usage_matches_recent_history() {
        let (tracker, clock) = tracker_with_clock();
        tracker.track_request("groq", "m", 100);
        clock.advance_ms(1_000);
        tracker.track_request("groq", "m", 200);

        let records = tracker.records.lock().unwrap();
        let record = &records[&key("groq", "m")];
        assert_eq!(record.requests_used, 2);
        assert_eq!(record.tokens_used, 300);
        drop(records);

        clock.advance_ms(60_000);
        // Force a clean via a capacity read so internal counters are recomputed.
        let cap = tracker.get_capacity("groq", "m");
        assert!(cap.requests.is_none() || cap.available);
        let records = tracker.records.lock().unwrap();
        let record = &records[&key("groq", "m")];
        assert_eq!(record.requests_used, 0);
        assert_eq!(record.tokens_used, 0);
    }

    #[test]
    fn json_round_trip_preserves_capacity() {
        let (tracker, _clock) = tracker_with_clock();
        tracker.configure_limits(
            "groq",
            "m",
            RateLimitCapacity {
                requests_per_minute: Some(10),
                tokens_per_minute: None,
                requests_per_day: Some(1000),
            },
        );
        tracker.track_request("groq", "m", 500);

        let state = tracker.to_state();
        let json = serde_json::to_string(&state).unwrap();
        let decoded: TrackerState = serde_json::from_str(&json).unwrap();

        let restored = RateLimitTracker::new();
        restored.load_state(&decoded);

        let original_cap = tracker.get_capacity("groq", "m");
        let restored_cap = restored.get_capacity("groq", "m");
        assert_eq!(original_cap.requests, restored_cap.requests);
        assert_eq!(original_cap.tokens, restored_cap.tokens);
        assert_eq!(original_cap.requests_today, restored_cap.requests_today);
    }

    #[test]
    fn infinity_round_trips_as_null() {
        let (tracker, _clock) = tracker_with_clock();
        tracker.configure_limits("groq", "m", RateLimitCapacity::default());
        let state = tracker.to_state();
        let json = serde_json::to_value(&state).unwrap();
        let entry = &json["groq"]["m"];
        assert!(entry["requestsPerMinute"].is_null() || entry["requests_per_minute"].is_null());
    }

    #[test]
    fn update_from_429_sets_cooldown() {
        let (tracker, clock) = tracker_with_clock();
        tracker.update_from_429("groq", "m", Some(5));
        assert!(!tracker.can_make_request("groq", "m", 0));
        clock.advance_ms(5_001);
        assert!(tracker.can_make_request("groq", "m", 0));
    }

    #[test]
    fn health_score_formula() {
        let (tracker, _clock) = tracker_with_clock();
        for _ in 0..10 {
            tracker.record_success("groq", "m");
        }
        assert_eq!(tracker.health_score("groq", "m"), 70.0);
        tracker.record_error("groq", "m");
        assert!(tracker.health_score("groq", "m") < 70.0);
    }

    #[test]
    fn fresh_model_is_fully_healthy() {
        let (tracker, _clock) = tracker_with_clock();
        assert_eq!(tracker.health_score("groq", "m"), 100.0);
        assert!(tracker.is_healthy("groq", "m"));
    }

    #[test]
    fn three_consecutive_errors_marks_unhealthy() {
        let (tracker, _clock) = tracker_with_clock();
        tracker.record_success("groq", "m");
        tracker.record_error("groq", "m");
        tracker.record_error("groq", "m");
        tracker.record_error("groq", "m");
        assert!(!tracker.is_healthy("groq", "m"));
    }

    #[test]
    fn average_performance_uses_most_recent_twenty() {
        let (tracker, clock) = tracker_with_clock();
        for i in 0..30u64 {
            tracker.record_performance(
                "groq",
                "m",
                PerformanceSample {
                    time_to_first_token_ms: i,
                    total_duration_ms: i * 2,
                    timestamp_ms: 0,
                },
            );
            clock.advance_ms(1);
        }
        let avg = tracker.get_average_performance("groq", "m").unwrap();
        assert_eq!(avg.sample_size, 20);
        // Most recent 20 are indices 10..30, average ttft = 19.5.
        assert!((avg.avg_ttft_ms - 19.5).abs() < 0.01);
    }

    #[test]
    fn reset_value_disambiguation() {
        let now = 1_000_000;
        // Epoch millis (far future, > 1e12).
        assert_eq!(resolve_reset_value(1_700_000_000_000.0, now), Some(1_700_000_000_000));
        // Epoch seconds (> 1e9).
        assert_eq!(resolve_reset_value(1_700_000_000.0, now), Some(1_700_000_000_000));
        // Seconds from now.
        assert_eq!(resolve_reset_value(30.0, now), Some(now + 30_000));
    }

    #[test]
    fn retry_after_header_takes_precedence() {
        let (tracker, _clock) = tracker_with_clock();
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), "5".to_string());
        headers.insert("x-ratelimit-limit-requests".to_string(), "100".to_string());
        tracker.update_from_headers("groq", "m", &headers);
        assert!(!tracker.can_make_request("groq", "m", 0));
    }
}
