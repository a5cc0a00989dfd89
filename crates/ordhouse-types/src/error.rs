//! Error types for the Ordhouse auction engine.
//!
//! All errors use the `OH_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Not-found errors
//! - 3xx: State / transition errors
//! - 4xx: Payment / settlement errors
//! - 5xx: Chain-data errors
//! - 9xx: General / internal errors
//!
//! Every error is local to the offending entity: bulk operations accumulate
//! per-item errors instead of propagating the first one, and the
//! reconciliation monitor converts all of these into counters.

use thiserror::Error;

use crate::{AuctionId, AuctionStatus, BidId, BidStatus, Network};

/// Central error enum for all Ordhouse operations.
#[derive(Debug, Error)]
pub enum OrdhouseError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The auction input failed validation (bad prices, zero quantity, etc.).
    #[error("OH_ERR_100: Invalid auction: {reason}")]
    InvalidAuction { reason: String },

    /// The bid input failed validation (zero quantity, non-positive amount).
    #[error("OH_ERR_101: Invalid bid: {reason}")]
    InvalidBid { reason: String },

    /// More slots requested than the auction has left.
    #[error("OH_ERR_102: Insufficient quantity: requested {requested}, available {available}")]
    QuantityUnavailable { requested: u32, available: u32 },

    /// The address fails the network boundary check.
    #[error("OH_ERR_103: Invalid {network} address: {address}")]
    InvalidAddress { network: Network, address: String },

    /// A non-empty transaction id is required for this operation.
    #[error("OH_ERR_104: Transaction id must not be empty")]
    MissingTransactionId,

    // =================================================================
    // Not-Found Errors (2xx)
    // =================================================================
    /// The requested auction was not found.
    #[error("OH_ERR_200: Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    /// The requested bid was not found.
    #[error("OH_ERR_201: Bid not found: {0}")]
    BidNotFound(BidId),

    // =================================================================
    // State / Transition Errors (3xx)
    // =================================================================
    /// The operation requires an ACTIVE auction.
    #[error("OH_ERR_300: Auction {id} is {status}, not ACTIVE")]
    AuctionNotActive { id: AuctionId, status: AuctionStatus },

    /// The bid cannot make this transition from its current status.
    #[error("OH_ERR_301: Bid {bid_id} is {from}; {required} required")]
    InvalidTransition {
        bid_id: BidId,
        from: BidStatus,
        required: BidStatus,
    },

    /// An auction with this ID already exists.
    #[error("OH_ERR_302: Auction already exists: {0}")]
    DuplicateAuction(AuctionId),

    /// A bid with this ID already exists.
    #[error("OH_ERR_303: Bid already exists: {0}")]
    DuplicateBid(BidId),

    // =================================================================
    // Payment / Settlement Errors (4xx)
    // =================================================================
    /// Settlement referenced a bid whose payment is not confirmed.
    #[error("OH_ERR_400: Payment not confirmed for bid {0}")]
    PaymentNotConfirmed(BidId),

    // =================================================================
    // Chain-Data Errors (5xx)
    // =================================================================
    /// The chain-data provider failed; treated as "no new information".
    #[error("OH_ERR_500: Chain data unavailable: {reason}")]
    ChainData { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OH_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OrdhouseError>;
