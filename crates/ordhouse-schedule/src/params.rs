//! Schedule parameters and validation.
//!
//! Validation failures are collected as a list of human-readable strings —
//! callers check the list is empty before building a schedule. Nothing in
//! this crate panics on bad input.

use rust_decimal::Decimal;

/// The decay family of a continuous schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecayCurve {
    /// Fixed decrement per interval; reaches the floor at the deadline.
    Linear,
    /// `floor + (start - floor) * e^(-k*t)` with `k` calibrated so the
    /// price is within 1% of the floor range at the deadline.
    Exponential,
}

/// Inputs describing a continuous decay schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleParams {
    /// Price at `t = 0`, in sats.
    pub start_price: Decimal,
    /// Price at `t >= duration`, in sats.
    pub floor_price: Decimal,
    pub duration_secs: u64,
    pub interval_secs: u64,
    pub curve: DecayCurve,
}

impl ScheduleParams {
    /// Collect every validation failure. An empty vec means the parameters
    /// describe a well-formed schedule.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.floor_price < Decimal::ZERO {
            errors.push("floor price must be non-negative".to_string());
        }
        if self.start_price <= self.floor_price {
            errors.push("start price must be greater than floor price".to_string());
        }
        if self.duration_secs == 0 {
            errors.push("duration must be greater than zero".to_string());
        }
        if self.interval_secs == 0 {
            errors.push("interval must be greater than zero".to_string());
        } else if self.duration_secs % self.interval_secs != 0 {
            errors.push("duration must be a whole number of intervals".to_string());
        }
        errors
    }

    /// Number of decay steps (`duration / interval`). Zero for degenerate
    /// parameters — callers validate first.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        if self.interval_secs == 0 {
            0
        } else {
            self.duration_secs / self.interval_secs
        }
    }
}
