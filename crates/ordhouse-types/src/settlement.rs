//! Settlement outputs: allocation plans, artifacts for the PSBT builder,
//! and per-operation outcome reports.
//!
//! Artifacts are the only surface this engine hands to the transaction
//! builder — one artifact per newly allocated inscription.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidId, InscriptionId, Txid};

/// One bid's share of a clearing auction's slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidAllocation {
    pub bid_id: BidId,
    pub bidder_address: String,
    /// Slots the bid asked for.
    pub requested: u32,
    /// Slots the greedy walk actually assigned (may be a partial fill).
    pub allocated: u32,
}

/// Pure settlement computation for a clearing auction: the uniform clearing
/// price plus the greedy first-confirmed-first-served allocation.
///
/// Computing a plan performs no mutation; it is a snapshot of current state
/// and may be recomputed any number of times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub auction_id: AuctionId,
    /// Sats per slot every allocated bid settles at.
    pub clearing_price: Decimal,
    pub total_quantity: u32,
    pub items_remaining: u32,
    /// Confirmed/settled bids in `created_at` order, greedily assigned.
    pub allocations: Vec<BidAllocation>,
}

impl SettlementPlan {
    /// Total slots assigned across all allocations.
    #[must_use]
    pub fn allocated_total(&self) -> u32 {
        self.allocations.iter().map(|a| a.allocated).sum()
    }
}

/// One inscription transfer for the external PSBT/transaction builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementArtifact {
    pub bid_id: BidId,
    pub inscription_id: InscriptionId,
    pub to_address: String,
}

/// Result of one `process_settlement` run.
///
/// Re-running settlement on a fully settled auction yields an empty
/// `artifacts` list and an empty `newly_settled` list — never a second
/// artifact for an inscription already issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRun {
    pub auction_id: AuctionId,
    pub clearing_price: Decimal,
    pub artifacts: Vec<SettlementArtifact>,
    pub newly_settled: Vec<BidId>,
    /// Whether every inscription is now consumed (auction fully settled).
    pub auction_sold: bool,
}

/// Result of a `confirm_payment` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmOutcome {
    pub bid_id: BidId,
    pub transaction_id: Txid,
    /// True when the bid was already confirmed with this txid — the call
    /// succeeded without mutating anything.
    pub already_confirmed: bool,
}

/// A per-bid failure inside a bulk `mark_settled` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidMarkError {
    pub bid_id: BidId,
    pub message: String,
}

/// Accumulated outcome of a bulk `mark_settled` call. Per-item failures
/// never abort the remaining ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkSettledOutcome {
    /// Ids successfully marked (already-settled ids count as updated).
    pub updated: usize,
    pub errors: Vec<BidMarkError>,
}

impl MarkSettledOutcome {
    /// Some ids succeeded and some failed — callers map this to a
    /// multi-status response.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.updated > 0 && !self.errors.is_empty()
    }

    /// Every id failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.updated == 0 && !self.errors.is_empty()
    }
}
