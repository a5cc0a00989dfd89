//! Stepped-interval pricing for single-item buy-now auctions.
//!
//! Unlike the continuous schedules in [`crate::curve`], the stepped price
//! holds constant between drops: the number of *completed* intervals
//! determines the price, capped at the total step count.

use rust_decimal::Decimal;

/// Price after `elapsed_secs` under stepped decay.
///
/// `steps = min(floor(elapsed / interval), duration / interval)`;
/// price = `max(min_price, start_price - steps * (start - min) / total_steps)`.
///
/// Degenerate inputs (zero duration or interval, floor above start) clamp
/// to the floor/start band rather than panicking — creation-time
/// validation is the ledger's job.
#[must_use]
pub fn stepped_price(
    start_price: Decimal,
    min_price: Decimal,
    duration_secs: u64,
    interval_secs: u64,
    elapsed_secs: i64,
) -> Decimal {
    if start_price <= min_price {
        return min_price.max(start_price);
    }
    if elapsed_secs <= 0 {
        return start_price;
    }
    if interval_secs == 0 || duration_secs == 0 || interval_secs > duration_secs {
        return start_price;
    }
    let total_steps = duration_secs / interval_secs;
    let steps = (elapsed_secs.unsigned_abs() / interval_secs).min(total_steps);
    let decrement = (start_price - min_price) / Decimal::from(total_steps);
    (start_price - decrement * Decimal::from(steps)).max(min_price)
}
