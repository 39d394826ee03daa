// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cool-down between attempts of a failing lookup.
//!
//! Uses the tokio clock so paused-time tests can step over the cool-down.

use std::time::Duration;

use tokio::time::Instant;

/// First cool-down after a failure.
pub const BASE_COOLDOWN: Duration = Duration::from_secs(30);
/// Upper bound for the doubling cool-down.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(600);

/// Exponential cool-down: each failure doubles the wait, up to `max`.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    base: Duration,
    max: Duration,
    current: Duration,
    failures: u32,
    next_attempt: Option<Instant>,
}

impl RetryBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
            failures: 0,
            next_attempt: None,
        }
    }

    /// Whether the cool-down, if any, has elapsed.
    pub fn is_ready(&self) -> bool {
        self.next_attempt.is_none_or(|at| Instant::now() >= at)
    }

    /// Starts a cool-down and returns its length.
    pub fn record_failure(&mut self) -> Duration {
        let wait = self.current;
        self.failures = self.failures.saturating_add(1);
        self.next_attempt = Some(Instant::now() + wait);
        self.current = self.current.saturating_mul(2).min(self.max);
        wait
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
        self.current = self.base;
        self.next_attempt = None;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(BASE_COOLDOWN, MAX_COOLDOWN)
    }
}
