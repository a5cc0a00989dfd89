//! System-wide constants for the Ordhouse auction engine.

/// Default seconds between reconciliation monitor cycles.
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 60;

/// Default escrow payment tolerance in percent (fee-estimation slack).
pub const DEFAULT_PAYMENT_TOLERANCE_PCT: u32 = 10;

/// Shortest plausible Bitcoin address (legacy base58).
pub const MIN_ADDRESS_LEN: usize = 26;

/// Longest plausible Bitcoin address (bech32m).
pub const MAX_ADDRESS_LEN: usize = 90;

/// Hex characters of hash digest rendered into a placeholder escrow address.
pub const ESCROW_ADDRESS_DIGEST_CHARS: usize = 38;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Ordhouse";
