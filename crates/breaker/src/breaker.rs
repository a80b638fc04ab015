// SPDX-License-Identifier: MIT

use crate::error::BreakerError;
use crate::state::CircuitState;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use ward_core::{Clock, FailureClass};

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub rolling_window: Duration,
    pub open_duration: Duration,
    pub half_open_probe_count: u32,
    /// Predicate deciding whether a [`FailureClass`] counts toward the
    /// rolling window. Defaults to [`FailureClass::countable_by_default`].
    pub is_countable: fn(FailureClass) -> bool,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            rolling_window: Duration::from_secs(60),
            open_duration: Duration::from_secs(30),
            half_open_probe_count: 2,
            is_countable: FailureClass::countable_by_default,
        }
    }
}

struct Inner {
    state: CircuitState,
    failures: VecDeque<u64>,
    opened_at_ms: u64,
    half_open_successes: u32,
}

/// Rolling-window circuit breaker (§4.6): CLOSED accumulates failures inside
/// a sliding window and trips to OPEN at the threshold; OPEN waits out a
/// fixed cooldown then moves to HALF_OPEN; HALF_OPEN closes after enough
/// consecutive probe successes, or reopens on the first failure.
pub struct CircuitBreaker<C: Clock> {
    clock: C,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    #[error(transparent)]
    Breaker(#[from] BreakerError),
    #[error(transparent)]
    Inner(E),
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn new(config: BreakerConfig, clock: C) -> Self {
        let inner = Inner { state: CircuitState::Closed, failures: VecDeque::new(), opened_at_ms: 0, half_open_successes: 0 };
        Self { clock, config, inner: Mutex::new(inner) }
    }

    /// Current state, applying the lazy OPEN -> HALF_OPEN transition if the
    /// cooldown has elapsed.
    pub fn state(&self) -> CircuitState {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner, now);
        inner.state
    }

    fn maybe_half_open(&self, inner: &mut Inner, now: u64) {
        if inner.state == CircuitState::Open {
            let elapsed = now.saturating_sub(inner.opened_at_ms);
            if elapsed >= self.config.open_duration.as_millis() as u64 {
                inner.state = CircuitState::HalfOpen;
                inner.half_open_successes = 0;
            }
        }
    }

    fn prune_window(inner: &mut Inner, now: u64, window_ms: u64) {
        while let Some(&oldest) = inner.failures.front() {
            if now.saturating_sub(oldest) > window_ms {
                inner.failures.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        let now = self.clock.epoch_ms();
        self.maybe_half_open(&mut inner, now);
        match inner.state {
            CircuitState::Closed => {
                inner.failures.clear();
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_probe_count {
                    inner.state = CircuitState::Closed;
                    inner.failures.clear();
                    inner.half_open_successes = 0;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self, class: FailureClass) {
        if !(self.config.is_countable)(class) {
            return;
        }
        let mut inner = self.inner.lock();
        let now = self.clock.epoch_ms();
        self.maybe_half_open(&mut inner, now);
        match inner.state {
            CircuitState::Closed => {
                inner.failures.push_back(now);
                Self::prune_window(&mut inner, now, self.config.rolling_window.as_millis() as u64);
                if inner.failures.len() as u32 >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at_ms = now;
                    inner.failures.clear();
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at_ms = now;
                inner.half_open_successes = 0;
                inner.failures.clear();
            }
            CircuitState::Open => {}
        }
    }

    fn remaining_open_ms(&self, inner: &Inner, now: u64) -> u64 {
        let elapsed = now.saturating_sub(inner.opened_at_ms);
        (self.config.open_duration.as_millis() as u64).saturating_sub(elapsed)
    }

    /// Run `f`, recording its outcome against the breaker. Refuses to run
    /// at all while OPEN. `classify` maps `f`'s error to a [`FailureClass`]
    /// so the breaker can decide whether it counts toward the threshold.
    pub fn execute<T, E>(
        &self,
        f: impl FnOnce() -> Result<T, E>,
        classify: impl FnOnce(&E) -> FailureClass,
    ) -> Result<T, ExecuteError<E>> {
        {
            let now = self.clock.epoch_ms();
            let mut inner = self.inner.lock();
            self.maybe_half_open(&mut inner, now);
            if inner.state == CircuitState::Open {
                let retry_after_ms = self.remaining_open_ms(&inner, now);
                return Err(ExecuteError::Breaker(BreakerError::CircuitOpen { retry_after_ms }));
            }
        }

        match f() {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                let class = classify(&err);
                self.record_failure(class);
                Err(ExecuteError::Inner(err))
            }
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
