//! # ordhouse-engine
//!
//! **Ledger Plane**: the auction ledgers and everything they mutate.
//!
//! ## Architecture
//!
//! 1. **`AuctionStore`**: storage trait — one engine, pluggable backends.
//!    [`MemoryStore`] is the in-process backend.
//! 2. **`SingleLedger`**: single-item buy-now Dutch auctions.
//! 3. **`ClearingLedger`**: clearing-price batch auctions, the bid payment
//!    state machine, allocation and idempotent settlement.
//! 4. **`escrow`**: deterministic escrow address derivation.
//! 5. **`AuditLog`**: append-only record every mutation writes to.
//!
//! ## Consistency discipline
//!
//! Both ledgers share one `Mutex` over the store; every operation performs
//! its read-validate-mutate sequence inside a single critical section. The
//! reconciliation monitor drives the same entry points — there is no bypass
//! path, which is what makes the no-oversell and idempotence guarantees
//! hold under concurrent API and monitor traffic.

pub mod audit;
pub mod clearing;
pub mod escrow;
pub mod single;
pub mod store;

pub use audit::AuditLog;
pub use clearing::{ClearingLedger, CreateClearingAuction};
pub use single::{CreateDutchAuction, SingleLedger};
pub use store::{AuctionStore, MemoryStore};
