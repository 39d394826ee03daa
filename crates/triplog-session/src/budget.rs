// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily geocoding request budget.
//!
//! One budget is shared by every resolver in the process. It emits one
//! `tracing::warn` per day at 80% of the daily cap and refuses further requests once
//! the cap is reached or the provider reported its quota as exhausted. Both
//! conditions clear at midnight UTC.

use chrono::{NaiveDate, Utc};
use triplog_config::GeocodeConfig;
use triplog_core::TriplogError;
use tracing::warn;

/// In-memory request counter with a daily cap.
#[derive(Debug)]
pub struct RequestBudget {
    /// Requests sent today.
    used: u32,
    /// Daily cap (None = unlimited).
    daily_cap: Option<u32>,
    /// Set when the provider itself reported a quota error.
    exhausted: bool,
    /// The 80% warning was already emitted today.
    warned: bool,
    /// UTC day the counters belong to.
    current_day: NaiveDate,
}

impl RequestBudget {
    pub fn new(daily_cap: Option<u32>) -> Self {
        Self {
            used: 0,
            daily_cap,
            exhausted: false,
            warned: false,
            current_day: Utc::now().date_naive(),
        }
    }

    pub fn from_config(config: &GeocodeConfig) -> Self {
        Self::new(config.daily_request_limit)
    }

    /// Checks whether another request may be sent today.
    ///
    /// Returns [`TriplogError::RateLimitExceeded`] once the cap is reached.
    pub fn check(&mut self) -> Result<(), TriplogError> {
        self.check_on(Utc::now().date_naive())
    }

    pub(crate) fn check_on(&mut self, today: NaiveDate) -> Result<(), TriplogError> {
        self.maybe_reset(today);

        if self.exhausted {
            return Err(TriplogError::RateLimitExceeded);
        }
        if let Some(cap) = self.daily_cap {
            if self.used >= cap {
                return Err(TriplogError::RateLimitExceeded);
            }
            if !self.warned && u64::from(self.used) * 5 >= u64::from(cap) * 4 {
                self.warned = true;
                warn!(
                    used = self.used,
                    daily_cap = cap,
                    "approaching daily geocoding cap (80%+)"
                );
            }
        }
        Ok(())
    }

    pub fn record_request(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    /// Refuses every request until the next UTC day.
    pub fn exhaust(&mut self) {
        self.exhausted = true;
    }

    fn maybe_reset(&mut self, today: NaiveDate) {
        if today != self.current_day {
            self.used = 0;
            self.exhausted = false;
            self.warned = false;
            self.current_day = today;
        }
    }

    /// Requests sent today (for testing/reporting).
    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted || self.daily_cap.is_some_and(|cap| self.used >= cap)
    }
}
