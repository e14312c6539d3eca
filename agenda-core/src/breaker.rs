//! Circuit breaker guarding the remote model.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::error::{AgendaError, AgendaResult};

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Breaker shared between every adapter that talks to the same endpoint.
pub type SharedBreaker = Arc<Mutex<CircuitBreaker>>;

/// Blocks remote calls after repeated failures.
///
/// The circuit is open while at least `threshold` consecutive failures have
/// been recorded and the latest is younger than `cooldown`. Once the cooldown
/// passes one attempt is let through; a success closes the circuit.
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    failures: u32,
    last_failure: Option<std::time::Instant>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        CircuitBreaker {
            threshold,
            cooldown,
            failures: 0,
            last_failure: None,
            clock,
        }
    }

    pub fn shared(self) -> SharedBreaker {
        Arc::new(Mutex::new(self))
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Time left until the next attempt is allowed, if the circuit is open.
    pub fn remaining(&self) -> Option<Duration> {
        if self.failures < self.threshold {
            return None;
        }
        let last = self.last_failure?;
        let elapsed = self.clock.instant().saturating_duration_since(last);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    pub fn is_open(&self) -> bool {
        self.remaining().is_some()
    }

    /// Fail fast when the circuit is open.
    pub fn check(&self) -> AgendaResult<()> {
        match self.remaining() {
            Some(left) => Err(AgendaError::RemoteUnavailable(left.as_secs_f64().ceil() as u64)),
            None => Ok(()),
        }
    }

    pub fn record_success(&mut self) {
        if self.failures > 0 {
            info!("remote model recovered after {} failure(s)", self.failures);
        }
        self.failures = 0;
        self.last_failure = None;
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        self.last_failure = Some(self.clock.instant());
        if self.failures == self.threshold {
            warn!(
                "remote model failed {} times, pausing for {}",
                self.failures,
                humantime::format_duration(self.cooldown)
            );
        }
    }
}
