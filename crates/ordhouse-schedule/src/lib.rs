//! # ordhouse-schedule
//!
//! **Pricing Plane**: pure, deterministic price-decay schedules for Dutch
//! auctions. No side effects, no I/O, no clocks — callers pass elapsed time.
//!
//! Two families of curves:
//!
//! - **Continuous schedules** ([`ScheduleParams`] / [`Schedule`]): linear or
//!   exponential decay from `start_price` to `floor_price`, materialized as
//!   `n + 1` points or evaluated closed-form at any elapsed time.
//! - **Stepped pricing** ([`stepped_price`]): the discrete variant used by
//!   single-item buy-now auctions — the price drops by a fixed amount once
//!   per interval and holds between drops.
//!
//! ## Determinism Contract
//!
//! Same parameters and elapsed time always produce the same price on every
//! node. Both curves are monotonically non-increasing; the first schedule
//! point equals `start_price` and the last equals `floor_price` exactly.

pub mod curve;
pub mod params;
pub mod stepped;

pub use curve::{PricePoint, Schedule};
pub use params::{DecayCurve, ScheduleParams};
pub use stepped::stepped_price;
