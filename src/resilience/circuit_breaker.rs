//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: backend assumed down, calls fail fast until the cooldown elapses
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures reaches threshold
//! Open → (probing): cooldown elapsed, next calls are allowed through
//! probe success → Closed (failures reset, open_until cleared)
//! probe failure → Open for another full cooldown
//! ```
//!
//! # Design Decisions
//! - Per-service state, one mutex around the whole map (updates are cheap
//!   read-modify-writes; contention is not a concern at gateway call rates)
//! - No half-open admission control: once the cooldown elapses, any number
//!   of concurrent calls may probe the backend simultaneously. Known
//!   approximation, kept deliberately.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-service failure tracking.
#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// Failure-tracking state machine gating outbound calls per service.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    states: Mutex<HashMap<String, CircuitState>>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// True iff the circuit for `service` is open right now. Once the
    /// cooldown has elapsed this returns false even though the failure count
    /// is still at threshold; the next call acts as a probe.
    pub fn is_open(&self, service: &str) -> bool {
        let states = self.states.lock().unwrap();
        match states.get(service).and_then(|s| s.open_until) {
            Some(open_until) => Instant::now() < open_until,
            None => false,
        }
    }

    /// Record a failed call. Reaching the threshold (or failing a probe
    /// while already at it) opens the circuit for a full cooldown window.
    pub fn record_failure(&self, service: &str) {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(service.to_string()).or_default();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if state.consecutive_failures >= self.failure_threshold {
            state.open_until = Some(Instant::now() + self.cooldown);
            tracing::warn!(
                service = %service,
                failures = state.consecutive_failures,
                cooldown = ?self.cooldown,
                "circuit opened"
            );
        }
    }

    /// Record a successful call: failures reset to zero and the circuit
    /// closes regardless of its previous state.
    pub fn record_success(&self, service: &str) {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(service.to_string()).or_default();
        if state.open_until.is_some() {
            tracing::info!(service = %service, "circuit closed after successful probe");
        }
        state.consecutive_failures = 0;
        state.open_until = None;
    }

    /// Current consecutive failure count, for logging and tests.
    pub fn failure_count(&self, service: &str) -> u32 {
        let states = self.states.lock().unwrap();
        states
            .get(service)
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }
}
