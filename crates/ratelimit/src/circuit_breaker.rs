use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker '{name}' is open (retry in {retry_in:?})")]
    Open { name: String, retry_in: Duration },
    #[error("operation failed: {0}")]
    Operation(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitBreakerError::Open { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failing, reject requests
    HalfOpen, // Testing if recovered
}

impl From<CircuitState> for u8 {
    fn from(state: CircuitState) -> Self {
        match state {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failures inside `monitoring_window` that open the circuit
    pub failure_threshold: u32,
    pub monitoring_window: Duration,
    /// Cooldown between opening and the first half-open probe
    pub timeout: Duration,
    /// Consecutive half-open successes that close the circuit
    pub success_threshold: u32,
    /// Concurrent probe calls allowed while half-open
    pub half_open_max_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            monitoring_window: Duration::from_secs(120),
            timeout: Duration::from_secs(60),
            success_threshold: 2,
            half_open_max_probes: 1,
        }
    }
}

/// Point-in-time view of a breaker for operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub recent_failures: usize,
    pub success_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_in_ms: Option<u64>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: VecDeque<Instant>,
    success_count: u32,
    next_attempt: Option<Instant>,
    probes_in_flight: u32,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: VecDeque::new(),
            success_count: 0,
            next_attempt: None,
            probes_in_flight: 0,
        }
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.failures.front() {
            if now.duration_since(*oldest) > window {
                self.failures.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Whether a call was admitted as a half-open probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Probe,
}

/// Returns a half-open probe slot if the wrapped future is dropped before
/// it resolves, so a cancelled probe cannot pin the breaker half-open
struct ProbeSlot<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        if !self.settled && self.admission == Admission::Probe {
            self.breaker.release_probe();
        }
    }
}

/// Per-provider failure/backoff state machine
///
/// All reads and transitions happen under one mutex, so each call outcome
/// produces at most one authoritative transition. The lock is never held
/// across the wrapped future.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState::closed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // A poisoned lock only means another caller panicked mid-update;
        // the state itself is always left consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// False only while open and still cooling down
    pub fn is_operational(&self) -> bool {
        let inner = self.lock();
        match inner.state {
            CircuitState::Open => inner
                .next_attempt
                .map(|at| Instant::now() >= at)
                .unwrap_or(true),
            _ => true,
        }
    }

    pub fn stats(&self) -> BreakerStats {
        let mut inner = self.lock();
        let now = Instant::now();
        inner.prune(now, self.config.monitoring_window);
        let retry_in_ms = match inner.state {
            CircuitState::Open => inner
                .next_attempt
                .map(|at| at.saturating_duration_since(now).as_millis() as u64),
            _ => None,
        };

        BreakerStats {
            name: self.name.clone(),
            state: inner.state,
            recent_failures: inner.failures.len(),
            success_count: inner.success_count,
            retry_in_ms,
        }
    }

    /// Manual operator override back to a clean closed state
    pub fn reset(&self) {
        *self.lock() = BreakerState::closed();
        tracing::info!(breaker = %self.name, "circuit breaker manually reset to CLOSED");
    }

    fn admit(&self) -> Result<Admission, Duration> {
        let mut inner = self.lock();
        let now = Instant::now();

        match inner.state {
            CircuitState::Closed => Ok(Admission::Normal),
            CircuitState::Open => {
                let next_attempt = inner.next_attempt.unwrap_or(now);
                if now < next_attempt {
                    return Err(next_attempt - now);
                }
                inner.state = CircuitState::HalfOpen;
                inner.success_count = 0;
                inner.probes_in_flight = 1;
                tracing::info!(breaker = %self.name, "circuit breaker transitioned to HALF_OPEN");
                Ok(Admission::Probe)
            }
            CircuitState::HalfOpen => {
                if inner.probes_in_flight >= self.config.half_open_max_probes {
                    return Err(Duration::ZERO);
                }
                inner.probes_in_flight += 1;
                Ok(Admission::Probe)
            }
        }
    }

    fn release_probe(&self) {
        let mut inner = self.lock();
        inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
        tracing::debug!(breaker = %self.name, "half-open probe cancelled, slot released");
    }

    fn open(&self, inner: &mut BreakerState, now: Instant) {
        inner.state = CircuitState::Open;
        inner.success_count = 0;
        inner.next_attempt = Some(now + self.config.timeout);
    }

    fn record_success(&self, admission: Admission) {
        let mut inner = self.lock();
        if admission == Admission::Probe {
            inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
        }
        inner.failures.clear();

        if inner.state == CircuitState::HalfOpen {
            inner.success_count += 1;
            if inner.success_count >= self.config.success_threshold {
                *inner = BreakerState::closed();
                tracing::info!(breaker = %self.name, "circuit breaker transitioned to CLOSED");
            }
        }
    }

    fn record_failure(&self, admission: Admission) {
        let mut inner = self.lock();
        let now = Instant::now();
        if admission == Admission::Probe {
            inner.probes_in_flight = inner.probes_in_flight.saturating_sub(1);
        }

        inner.failures.push_back(now);
        inner.prune(now, self.config.monitoring_window);

        match inner.state {
            CircuitState::HalfOpen => {
                self.open(&mut inner, now);
                tracing::warn!(breaker = %self.name, "circuit breaker transitioned back to OPEN from HALF_OPEN");
            }
            CircuitState::Closed => {
                let failures = inner.failures.len();
                if failures >= self.config.failure_threshold as usize {
                    self.open(&mut inner, now);
                    tracing::warn!(
                        breaker = %self.name,
                        failures,
                        "circuit breaker transitioned to OPEN"
                    );
                }
            }
            // A call admitted before the circuit opened; the open window stands
            CircuitState::Open => {}
        }
    }

    /// Run `f` under the breaker
    ///
    /// Fails fast with `CircuitBreakerError::Open` (without invoking `f`)
    /// while the circuit is cooling down or the half-open probe budget is
    /// spent.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admit().map_err(|retry_in| CircuitBreakerError::Open {
            name: self.name.clone(),
            retry_in,
        })?;

        let mut slot = ProbeSlot {
            breaker: self,
            admission,
            settled: false,
        };
        let outcome = f().await;
        slot.settled = true;

        match outcome {
            Ok(result) => {
                self.record_success(admission);
                Ok(result)
            }
            Err(e) => {
                self.record_failure(admission);
                Err(CircuitBreakerError::Operation(e))
            }
        }
    }
}
