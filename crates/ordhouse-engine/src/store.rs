//! Storage abstraction for auctions and bids.
//!
//! One engine, pluggable backends: the ledgers are generic over
//! [`AuctionStore`], so the business logic exists exactly once. The store
//! itself does no locking and enforces no invariants beyond id uniqueness —
//! the ledgers own the critical sections.

use ordhouse_types::{
    AuctionId, Bid, BidId, BidStatus, ClearingAuction, DutchAuction, OrdhouseError, Result,
};
use std::collections::HashMap;

/// CRUD surface the ledgers require from a backend.
///
/// `auction_bids` must preserve **insertion order** — it doubles as the
/// allocation tie-break order.
pub trait AuctionStore: Send {
    fn insert_dutch(&mut self, auction: DutchAuction) -> Result<()>;
    fn dutch(&self, id: AuctionId) -> Option<&DutchAuction>;
    fn dutch_mut(&mut self, id: AuctionId) -> Option<&mut DutchAuction>;
    /// Ids of every single-item auction, any status.
    fn dutch_ids(&self) -> Vec<AuctionId>;

    fn insert_clearing(&mut self, auction: ClearingAuction) -> Result<()>;
    fn clearing(&self, id: AuctionId) -> Option<&ClearingAuction>;
    fn clearing_mut(&mut self, id: AuctionId) -> Option<&mut ClearingAuction>;
    /// Ids of every clearing auction, any status.
    fn clearing_ids(&self) -> Vec<AuctionId>;

    fn insert_bid(&mut self, bid: Bid) -> Result<()>;
    fn bid(&self, id: BidId) -> Option<&Bid>;
    fn bid_mut(&mut self, id: BidId) -> Option<&mut Bid>;
    /// Bid ids for an auction, in insertion order.
    fn auction_bids(&self, auction_id: AuctionId) -> Vec<BidId>;
    /// Every bid currently in PAYMENT_PENDING, across all auctions.
    fn payment_pending_bids(&self) -> Vec<BidId>;
}

/// In-process backend: hash maps plus an insertion-ordered bid index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    dutch: HashMap<AuctionId, DutchAuction>,
    clearing: HashMap<AuctionId, ClearingAuction>,
    bids: HashMap<BidId, Bid>,
    /// Authoritative auction -> bids index, insertion-ordered.
    bids_by_auction: HashMap<AuctionId, Vec<BidId>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuctionStore for MemoryStore {
    fn insert_dutch(&mut self, auction: DutchAuction) -> Result<()> {
        if self.dutch.contains_key(&auction.id) {
            return Err(OrdhouseError::DuplicateAuction(auction.id));
        }
        self.dutch.insert(auction.id, auction);
        Ok(())
    }

    fn dutch(&self, id: AuctionId) -> Option<&DutchAuction> {
        self.dutch.get(&id)
    }

    fn dutch_mut(&mut self, id: AuctionId) -> Option<&mut DutchAuction> {
        self.dutch.get_mut(&id)
    }

    fn dutch_ids(&self) -> Vec<AuctionId> {
        self.dutch.keys().copied().collect()
    }

    fn insert_clearing(&mut self, auction: ClearingAuction) -> Result<()> {
        if self.clearing.contains_key(&auction.id) {
            return Err(OrdhouseError::DuplicateAuction(auction.id));
        }
        self.clearing.insert(auction.id, auction);
        Ok(())
    }

    fn clearing(&self, id: AuctionId) -> Option<&ClearingAuction> {
        self.clearing.get(&id)
    }

    fn clearing_mut(&mut self, id: AuctionId) -> Option<&mut ClearingAuction> {
        self.clearing.get_mut(&id)
    }

    fn clearing_ids(&self) -> Vec<AuctionId> {
        self.clearing.keys().copied().collect()
    }

    fn insert_bid(&mut self, bid: Bid) -> Result<()> {
        if self.bids.contains_key(&bid.id) {
            return Err(OrdhouseError::DuplicateBid(bid.id));
        }
        self.bids_by_auction
            .entry(bid.auction_id)
            .or_default()
            .push(bid.id);
        self.bids.insert(bid.id, bid);
        Ok(())
    }

    fn bid(&self, id: BidId) -> Option<&Bid> {
        self.bids.get(&id)
    }

    fn bid_mut(&mut self, id: BidId) -> Option<&mut Bid> {
        self.bids.get_mut(&id)
    }

    fn auction_bids(&self, auction_id: AuctionId) -> Vec<BidId> {
        self.bids_by_auction
            .get(&auction_id)
            .cloned()
            .unwrap_or_default()
    }

    fn payment_pending_bids(&self) -> Vec<BidId> {
        let mut pending: Vec<&Bid> = self
            .bids
            .values()
            .filter(|b| b.status == BidStatus::PaymentPending)
            .collect();
        // HashMap iteration order is arbitrary; the monitor wants a stable
        // oldest-first sweep.
        pending.sort_by_key(|b| (b.created_at, b.id));
        pending.iter().map(|b| b.id).collect()
    }
}
