//! Configuration types for the Ordhouse engine and monitor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, Network};

/// Top-level configuration for one engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Network all addresses are checked against.
    pub network: Network,
    /// Reconciliation monitor timing and tolerances.
    pub monitor: MonitorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            monitor: MonitorConfig::default(),
        }
    }
}

/// Reconciliation monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between reconciliation cycles.
    pub poll_interval_secs: u64,
    /// Accepted deviation between an escrow output and the bid amount,
    /// in percent (fee-estimation slack).
    pub payment_tolerance_pct: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: constants::DEFAULT_MONITOR_INTERVAL_SECS,
            payment_tolerance_pct: constants::DEFAULT_PAYMENT_TOLERANCE_PCT,
        }
    }
}

impl MonitorConfig {
    /// Inclusive sat bounds an escrow output must fall within to be
    /// accepted as payment for `amount`.
    #[must_use]
    pub fn tolerance_bounds(&self, amount: Decimal) -> (Decimal, Decimal) {
        let pct = Decimal::from(self.payment_tolerance_pct) / Decimal::ONE_HUNDRED;
        (amount * (Decimal::ONE - pct), amount * (Decimal::ONE + pct))
    }
}
