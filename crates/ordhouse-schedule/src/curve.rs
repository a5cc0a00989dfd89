//! Continuous decay schedules: materialized point lists and closed-form
//! evaluation.
//!
//! The materialized schedule has `n + 1` points (`n = duration / interval`).
//! The first point is always `start_price` and the last is forced to
//! `floor_price` exactly, so floating-point residue from the exponential
//! curve never leaks into the terminal price.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::params::{DecayCurve, ScheduleParams};

/// One point of a materialized schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePoint {
    pub offset_secs: u64,
    pub price: Decimal,
}

/// A validated, materialized decay schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    params: ScheduleParams,
    points: Vec<PricePoint>,
}

impl Schedule {
    /// Validate `params` and materialize the schedule.
    ///
    /// # Errors
    /// Returns the full list of validation failures if `params` is not
    /// well-formed. Callers surface these verbatim.
    pub fn build(params: ScheduleParams) -> Result<Self, Vec<String>> {
        let errors = params.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let points = match params.curve {
            DecayCurve::Linear => linear_points(&params),
            DecayCurve::Exponential => exponential_points(&params),
        };
        Ok(Self { params, points })
    }

    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[must_use]
    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    /// Closed-form price at `elapsed_secs`, see [`ScheduleParams::price_at`].
    #[must_use]
    pub fn price_at(&self, elapsed_secs: i64) -> Decimal {
        self.params.price_at(elapsed_secs)
    }
}

impl ScheduleParams {
    /// Closed-form price at `elapsed_secs` without materializing the
    /// schedule. Continuous interpolation of the underlying curve:
    /// `t <= 0` yields the start price, `t >= duration` the floor.
    #[must_use]
    pub fn price_at(&self, elapsed_secs: i64) -> Decimal {
        if elapsed_secs <= 0 {
            return self.start_price;
        }
        let elapsed = elapsed_secs.unsigned_abs();
        if elapsed >= self.duration_secs || self.duration_secs == 0 {
            return self.floor_price;
        }
        match self.curve {
            DecayCurve::Linear => {
                let progress =
                    Decimal::from(elapsed) / Decimal::from(self.duration_secs);
                let price = self.start_price - (self.start_price - self.floor_price) * progress;
                price.max(self.floor_price)
            }
            DecayCurve::Exponential => self.exponential_price(elapsed),
        }
    }

    /// `floor + (start - floor) * e^(-k*t)` with `k = ln(100) / duration`,
    /// rounded to whole sats. The exponential runs in f64; the result is
    /// clamped to `[floor, start]` so conversion error cannot escape the
    /// curve's range.
    #[allow(clippy::cast_precision_loss)]
    fn exponential_price(&self, elapsed: u64) -> Decimal {
        let k = 100f64.ln() / self.duration_secs as f64;
        let range = (self.start_price - self.floor_price)
            .to_f64()
            .unwrap_or(0.0);
        let floor = self.floor_price.to_f64().unwrap_or(0.0);
        let raw = floor + range * (-k * elapsed as f64).exp();
        Decimal::from_f64(raw)
            .map_or(self.floor_price, |price| price.round())
            .max(self.floor_price)
            .min(self.start_price)
    }
}

fn linear_points(params: &ScheduleParams) -> Vec<PricePoint> {
    let n = params.step_count();
    let decrement = (params.start_price - params.floor_price) / Decimal::from(n);
    (0..=n)
        .map(|i| {
            let price = if i == n {
                params.floor_price
            } else {
                (params.start_price - decrement * Decimal::from(i)).max(params.floor_price)
            };
            PricePoint {
                offset_secs: i * params.interval_secs,
                price,
            }
        })
        .collect()
}

fn exponential_points(params: &ScheduleParams) -> Vec<PricePoint> {
    let n = params.step_count();
    let mut prev = params.start_price;
    (0..=n)
        .map(|i| {
            let price = if i == 0 {
                params.start_price
            } else if i == n {
                params.floor_price
            } else {
                // Guard against rounding jitter: never rise above the
                // previous point.
                params.exponential_price(i * params.interval_secs).min(prev)
            };
            prev = price;
            PricePoint {
                offset_secs: i * params.interval_secs,
                price,
            }
        })
        .collect()
}
