//! Bid model and the per-bid payment state machine.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐                ┌─────────────────┐
//!   │ PLACED │                │ PAYMENT_PENDING │
//!   └────────┘                └────────┬────────┘
//!    (no payment tracking)             │ escrow payment observed
//!                                      ▼
//!                            ┌───────────────────┐
//!                            │ PAYMENT_CONFIRMED │
//!                            └────────┬──────────┘
//!                                     │ settlement artifacts issued
//!                                     ▼
//!                                ┌─────────┐
//!                                │ SETTLED │
//!                                └─────────┘
//! ```
//!
//! A bid created without payment tracking starts (and stays) PLACED — it can
//! never reach PAYMENT_CONFIRMED without a payment-creation call. Transitions
//! are monotonic; the ledger layers the idempotence rules (same-txid
//! re-confirmation, settled-is-settled) on top of these primitives.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AuctionId, BidId, OrdhouseError, Result, Txid};

/// Lifecycle status of a bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidStatus {
    /// Quantity reserved, no payment tracking. Terminal for this flow.
    Placed,
    /// Escrow address issued, awaiting payment on chain.
    PaymentPending,
    /// Escrow payment observed and accepted.
    PaymentConfirmed,
    /// Settlement artifacts issued (or bulk-marked after broadcast).
    Settled,
}

impl BidStatus {
    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::PaymentPending, Self::PaymentConfirmed)
                | (Self::PaymentConfirmed, Self::Settled)
        )
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placed => write!(f, "PLACED"),
            Self::PaymentPending => write!(f, "PAYMENT_PENDING"),
            Self::PaymentConfirmed => write!(f, "PAYMENT_CONFIRMED"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// A bid against a clearing auction.
///
/// Owned exclusively by its auction; the ledger holds the authoritative
/// auction-to-bids index (insertion order = allocation tie-break order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder_address: String,
    /// Sats the bidder pays (or indicated willingness for PLACED bids).
    pub bid_amount: Decimal,
    /// Slots requested. Invariant: `> 0`, enforced at placement.
    pub quantity: u32,
    pub status: BidStatus,
    /// Escrow address the bidder pays into. Present iff payment-tracked.
    pub escrow_address: Option<String>,
    pub transaction_id: Option<Txid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bid {
    /// A bid reserved via `place_bid` — no payment tracking.
    #[must_use]
    pub fn placed(
        auction_id: AuctionId,
        bidder_address: String,
        bid_amount: Decimal,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            bidder_address,
            bid_amount,
            quantity,
            status: BidStatus::Placed,
            escrow_address: None,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A payment-tracked bid — escrow address issued, awaiting payment.
    #[must_use]
    pub fn payment_pending(
        auction_id: AuctionId,
        bidder_address: String,
        bid_amount: Decimal,
        quantity: u32,
        escrow_address: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            bidder_address,
            bid_amount,
            quantity,
            status: BidStatus::PaymentPending,
            escrow_address: Some(escrow_address),
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this bid carries an escrow address (payment-tracked flow).
    #[must_use]
    pub fn is_payment_tracked(&self) -> bool {
        self.escrow_address.is_some()
    }

    /// Attach a bidder-reported txid to a still-pending bid. The monitor
    /// polls this transaction for confirmation instead of scanning the
    /// escrow address.
    ///
    /// # Errors
    /// - [`OrdhouseError::MissingTransactionId`] if `txid` is empty
    /// - [`OrdhouseError::InvalidTransition`] unless PAYMENT_PENDING
    pub fn attach_transaction(&mut self, txid: Txid, now: DateTime<Utc>) -> Result<()> {
        if txid.is_empty() {
            return Err(OrdhouseError::MissingTransactionId);
        }
        if self.status != BidStatus::PaymentPending {
            return Err(OrdhouseError::InvalidTransition {
                bid_id: self.id,
                from: self.status,
                required: BidStatus::PaymentPending,
            });
        }
        self.transaction_id = Some(txid);
        self.updated_at = now;
        Ok(())
    }

    /// Transition PAYMENT_PENDING -> PAYMENT_CONFIRMED, recording the txid.
    ///
    /// # Errors
    /// - [`OrdhouseError::MissingTransactionId`] if `txid` is empty
    /// - [`OrdhouseError::InvalidTransition`] unless PAYMENT_PENDING
    pub fn mark_payment_confirmed(&mut self, txid: Txid, now: DateTime<Utc>) -> Result<()> {
        if txid.is_empty() {
            return Err(OrdhouseError::MissingTransactionId);
        }
        if !self.status.can_transition_to(BidStatus::PaymentConfirmed) {
            return Err(OrdhouseError::InvalidTransition {
                bid_id: self.id,
                from: self.status,
                required: BidStatus::PaymentPending,
            });
        }
        self.status = BidStatus::PaymentConfirmed;
        self.transaction_id = Some(txid);
        self.updated_at = now;
        Ok(())
    }

    /// Transition PAYMENT_CONFIRMED -> SETTLED.
    ///
    /// # Errors
    /// Returns [`OrdhouseError::InvalidTransition`] unless PAYMENT_CONFIRMED.
    pub fn mark_settled(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(BidStatus::Settled) {
            return Err(OrdhouseError::InvalidTransition {
                bid_id: self.id,
                from: self.status,
                required: BidStatus::PaymentConfirmed,
            });
        }
        self.status = BidStatus::Settled;
        self.updated_at = now;
        Ok(())
    }
}
