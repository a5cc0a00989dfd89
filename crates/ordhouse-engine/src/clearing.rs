//! Clearing-price batch auction ledger and the bid payment state machine.
//!
//! ## Allocation & settlement
//!
//! The uniform clearing price is a function of the sold fraction (see
//! [`ordhouse_types::ClearingAuction::clearing_price`]). Allocation walks
//! confirmed/settled bids oldest-first and greedily assigns slots;
//! settlement then draws inscriptions in the auction's fixed order,
//! starting at the persisted cursor — a settled bid is never revisited and
//! an inscription is never issued twice.
//!
//! ## Critical sections
//!
//! Every operation takes the store mutex for its whole
//! read-validate-mutate sequence. Two concurrent bids for the last slot
//! serialize on that lock: one wins the reservation, the other observes
//! the decremented `items_remaining` and is rejected.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use ordhouse_schedule::{DecayCurve, ScheduleParams};
use ordhouse_types::{
    redact_address, AuctionId, AuctionStatus, Bid, BidAllocation, BidId, BidMarkError, BidStatus,
    ClearingAuction, ConfirmOutcome, InscriptionId, MarkSettledOutcome, Network, OrdhouseError,
    Result, SettlementArtifact, SettlementPlan, SettlementRun, Txid,
};
use rust_decimal::Decimal;

use crate::audit::AuditLog;
use crate::escrow::escrow_address;
use crate::store::AuctionStore;

/// Inputs for creating a clearing auction. The slot count is the length of
/// `inscription_ids` — the list also fixes the settlement draw order.
#[derive(Debug, Clone)]
pub struct CreateClearingAuction {
    pub inscription_ids: Vec<InscriptionId>,
    pub start_price: Decimal,
    pub min_price: Decimal,
    pub duration_secs: u64,
    pub decrement_interval_secs: u64,
    pub start_time: DateTime<Utc>,
}

/// Ledger for clearing-price batch auctions.
pub struct ClearingLedger<S: AuctionStore> {
    store: Arc<Mutex<S>>,
    audit: Arc<AuditLog>,
    network: Network,
}

impl<S: AuctionStore> ClearingLedger<S> {
    #[must_use]
    pub fn new(store: Arc<Mutex<S>>, audit: Arc<AuditLog>, network: Network) -> Self {
        Self {
            store,
            audit,
            network,
        }
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, S>> {
        self.store
            .lock()
            .map_err(|_| OrdhouseError::Internal("auction store mutex poisoned".to_string()))
    }

    /// Insert a new ACTIVE clearing auction.
    ///
    /// # Errors
    /// `InvalidAuction` for an empty inscription list, inverted prices, or
    /// a zero duration.
    pub fn create_auction(&self, input: CreateClearingAuction) -> Result<AuctionId> {
        if input.inscription_ids.is_empty() {
            return Err(OrdhouseError::InvalidAuction {
                reason: "at least one inscription is required".to_string(),
            });
        }
        if input.min_price > input.start_price {
            return Err(OrdhouseError::InvalidAuction {
                reason: "min price must not exceed start price".to_string(),
            });
        }
        if input.duration_secs == 0 {
            return Err(OrdhouseError::InvalidAuction {
                reason: "duration must be greater than zero".to_string(),
            });
        }

        let auction = ClearingAuction::new(
            input.inscription_ids,
            input.start_price,
            input.min_price,
            input.duration_secs,
            input.decrement_interval_secs,
            input.start_time,
        );
        let id = auction.id;
        let quantity = auction.quantity;

        self.lock_store()?.insert_clearing(auction)?;

        self.audit.record(
            "clearing_auction_created",
            serde_json::json!({
                "auction_id": id.to_string(),
                "quantity": quantity,
                "start_price": input.start_price.to_string(),
                "min_price": input.min_price.to_string(),
            }),
        );
        tracing::info!(auction = %id, quantity, "clearing auction created");
        Ok(id)
    }

    /// Fetch a snapshot of an auction.
    pub fn get(&self, id: AuctionId) -> Result<ClearingAuction> {
        self.lock_store()?
            .clearing(id)
            .cloned()
            .ok_or(OrdhouseError::AuctionNotFound(id))
    }

    /// Fetch a snapshot of a bid.
    pub fn get_bid(&self, id: BidId) -> Result<Bid> {
        self.lock_store()?
            .bid(id)
            .cloned()
            .ok_or(OrdhouseError::BidNotFound(id))
    }

    /// Snapshots of an auction's bids, insertion-ordered.
    pub fn bids(&self, auction_id: AuctionId) -> Result<Vec<Bid>> {
        let store = self.lock_store()?;
        store
            .clearing(auction_id)
            .ok_or(OrdhouseError::AuctionNotFound(auction_id))?;
        Ok(store
            .auction_bids(auction_id)
            .into_iter()
            .filter_map(|id| store.bid(id).cloned())
            .collect())
    }

    /// Snapshots of every PAYMENT_PENDING bid, oldest first — the
    /// monitor's work list.
    pub fn payment_pending_bids(&self) -> Result<Vec<Bid>> {
        let store = self.lock_store()?;
        Ok(store
            .payment_pending_bids()
            .into_iter()
            .filter_map(|id| store.bid(id).cloned())
            .collect())
    }

    /// Continuous per-slot price at `at`, plus the derived status.
    pub fn current_price(
        &self,
        id: AuctionId,
        at: DateTime<Utc>,
    ) -> Result<(Decimal, AuctionStatus)> {
        let store = self.lock_store()?;
        let auction = store
            .clearing(id)
            .ok_or(OrdhouseError::AuctionNotFound(id))?;
        let price = unit_price(auction, at);
        let status = if auction.is_due(at) {
            AuctionStatus::Expired
        } else {
            auction.status
        };
        Ok((price, status))
    }

    /// Reserve `quantity` slots and append a PLACED bid (no payment
    /// tracking). The availability check, the decrement, and the bid
    /// append are one critical section — concurrent callers cannot
    /// jointly oversell.
    ///
    /// # Errors
    /// - `InvalidAddress` for a malformed bidder address
    /// - `AuctionNotFound` / `AuctionNotActive`
    /// - `InvalidBid` for zero quantity
    /// - `QuantityUnavailable` naming requested vs. available
    pub fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_address: &str,
        quantity: u32,
    ) -> Result<Bid> {
        self.network.validate_address(bidder_address)?;
        let now = Utc::now();

        let mut store = self.lock_store()?;
        let auction = store
            .clearing_mut(auction_id)
            .ok_or(OrdhouseError::AuctionNotFound(auction_id))?;

        // Price the bid before the reservation moves the sold fraction.
        let amount = unit_price(auction, now) * Decimal::from(quantity);
        auction.reserve(quantity, now)?;

        let bid = Bid::placed(auction_id, bidder_address.to_string(), amount, quantity, now);
        let snapshot = bid.clone();
        store.insert_bid(bid)?;
        drop(store);

        self.audit.record(
            "bid_placed",
            serde_json::json!({
                "auction_id": auction_id.to_string(),
                "bid_id": snapshot.id.to_string(),
                "bidder": redact_address(bidder_address),
                "quantity": quantity,
            }),
        );
        tracing::info!(auction = %auction_id, bid = %snapshot.id, quantity, "bid placed");
        Ok(snapshot)
    }

    /// Reserve `quantity` slots and append a PAYMENT_PENDING bid with a
    /// freshly derived escrow address. Reservation accounting is applied
    /// exactly once per bid — this entry point and [`Self::place_bid`]
    /// share the same rule (reserve on bid creation, never again at
    /// settlement).
    ///
    /// # Errors
    /// As [`Self::place_bid`], plus `InvalidBid` for a non-positive amount.
    pub fn create_bid_payment(
        &self,
        auction_id: AuctionId,
        bidder_address: &str,
        bid_amount: Decimal,
        quantity: u32,
    ) -> Result<Bid> {
        self.network.validate_address(bidder_address)?;
        if bid_amount <= Decimal::ZERO {
            return Err(OrdhouseError::InvalidBid {
                reason: "bid amount must be positive".to_string(),
            });
        }
        let now = Utc::now();

        let mut store = self.lock_store()?;
        let auction = store
            .clearing_mut(auction_id)
            .ok_or(OrdhouseError::AuctionNotFound(auction_id))?;
        auction.reserve(quantity, now)?;

        let bid_id = BidId::new();
        let escrow = escrow_address(self.network, auction_id, bidder_address, bid_id);
        let bid = Bid {
            id: bid_id,
            auction_id,
            bidder_address: bidder_address.to_string(),
            bid_amount,
            quantity,
            status: BidStatus::PaymentPending,
            escrow_address: Some(escrow.clone()),
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };
        let snapshot = bid.clone();
        store.insert_bid(bid)?;
        drop(store);

        self.audit.record(
            "bid_payment_created",
            serde_json::json!({
                "auction_id": auction_id.to_string(),
                "bid_id": bid_id.to_string(),
                "bidder": redact_address(bidder_address),
                "escrow_address": redact_address(&escrow),
                "bid_amount": bid_amount.to_string(),
                "quantity": quantity,
            }),
        );
        tracing::info!(auction = %auction_id, bid = %bid_id, quantity, "bid payment created");
        Ok(snapshot)
    }

    /// Attach a bidder-reported txid to a still-pending bid. The monitor
    /// then polls that transaction for confirmation instead of scanning
    /// the escrow address.
    pub fn record_payment_transaction(&self, bid_id: BidId, txid: Txid) -> Result<Bid> {
        let now = Utc::now();
        let mut store = self.lock_store()?;
        let bid = store
            .bid_mut(bid_id)
            .ok_or(OrdhouseError::BidNotFound(bid_id))?;
        bid.attach_transaction(txid.clone(), now)?;
        let snapshot = bid.clone();
        drop(store);

        self.audit.record(
            "bid_transaction_recorded",
            serde_json::json!({
                "bid_id": bid_id.to_string(),
                "transaction_id": txid.to_string(),
            }),
        );
        Ok(snapshot)
    }

    /// Confirm an escrow payment. Idempotent: re-confirming with the same
    /// txid succeeds with `already_confirmed = true` and mutates nothing
    /// (`updated_at` included).
    ///
    /// # Errors
    /// - `MissingTransactionId` for an empty txid
    /// - `BidNotFound`
    /// - `InvalidTransition` naming the required PAYMENT_PENDING status
    ///   for any other state (including a confirmed bid with a different
    ///   txid)
    pub fn confirm_payment(&self, bid_id: BidId, txid: Txid) -> Result<ConfirmOutcome> {
        if txid.is_empty() {
            return Err(OrdhouseError::MissingTransactionId);
        }
        let now = Utc::now();

        let mut store = self.lock_store()?;
        let bid = store
            .bid_mut(bid_id)
            .ok_or(OrdhouseError::BidNotFound(bid_id))?;

        if bid.status == BidStatus::PaymentConfirmed && bid.transaction_id.as_ref() == Some(&txid)
        {
            return Ok(ConfirmOutcome {
                bid_id,
                transaction_id: txid,
                already_confirmed: true,
            });
        }

        bid.mark_payment_confirmed(txid.clone(), now)?;
        drop(store);

        self.audit.record(
            "bid_payment_confirmed",
            serde_json::json!({
                "bid_id": bid_id.to_string(),
                "transaction_id": txid.to_string(),
            }),
        );
        tracing::info!(bid = %bid_id, txid = %txid, "bid payment confirmed");
        Ok(ConfirmOutcome {
            bid_id,
            transaction_id: txid,
            already_confirmed: false,
        })
    }

    /// Pure settlement computation: clearing price plus the greedy
    /// oldest-first allocation over confirmed/settled bids. No mutation —
    /// call it as often as needed.
    pub fn calculate_settlement(&self, auction_id: AuctionId) -> Result<SettlementPlan> {
        let store = self.lock_store()?;
        plan_for(&*store, auction_id)
    }

    /// Issue settlement artifacts for every newly allocated unit and
    /// transition the covered bids to SETTLED.
    ///
    /// Idempotent: bids already SETTLED are skipped entirely and the
    /// inscription cursor only moves forward, so re-running on a settled
    /// auction yields zero artifacts and no inscription is ever issued to
    /// two bids.
    ///
    /// # Errors
    /// `PaymentNotConfirmed` (naming the bid) when bids exist but none has
    /// a confirmed payment.
    pub fn process_settlement(&self, auction_id: AuctionId) -> Result<SettlementRun> {
        let now = Utc::now();
        let mut store = self.lock_store()?;
        let plan = plan_for(&*store, auction_id)?;

        if plan.allocations.is_empty() {
            // No allocatable bids. If unconfirmed bids exist this is a
            // caller error; an auction with no bids settles to nothing.
            let bid_ids = store.auction_bids(auction_id);
            if let Some(first) = bid_ids.first() {
                return Err(OrdhouseError::PaymentNotConfirmed(*first));
            }
            return Ok(SettlementRun {
                auction_id,
                clearing_price: plan.clearing_price,
                artifacts: Vec::new(),
                newly_settled: Vec::new(),
                auction_sold: false,
            });
        }

        // Guard before any mutation: every allocated bid must be
        // confirmed or already settled.
        for alloc in &plan.allocations {
            let bid = store
                .bid(alloc.bid_id)
                .ok_or(OrdhouseError::BidNotFound(alloc.bid_id))?;
            if !matches!(
                bid.status,
                BidStatus::PaymentConfirmed | BidStatus::Settled
            ) {
                return Err(OrdhouseError::PaymentNotConfirmed(alloc.bid_id));
            }
        }

        let (inscription_ids, mut cursor) = {
            let auction = store
                .clearing(auction_id)
                .ok_or(OrdhouseError::AuctionNotFound(auction_id))?;
            (
                auction.inscription_ids.clone(),
                auction.inscriptions_assigned as usize,
            )
        };

        let mut artifacts = Vec::new();
        let mut newly_settled = Vec::new();

        for alloc in &plan.allocations {
            let bid = store
                .bid_mut(alloc.bid_id)
                .ok_or(OrdhouseError::BidNotFound(alloc.bid_id))?;
            if bid.status == BidStatus::Settled {
                // Settled bids keep their original inscriptions; the
                // cursor already accounts for them.
                continue;
            }

            let available = inscription_ids.len().saturating_sub(cursor);
            let take = (alloc.allocated as usize).min(available);
            for inscription_id in &inscription_ids[cursor..cursor + take] {
                artifacts.push(SettlementArtifact {
                    bid_id: bid.id,
                    inscription_id: inscription_id.clone(),
                    to_address: bid.bidder_address.clone(),
                });
            }
            cursor += take;
            bid.mark_settled(now)?;
            newly_settled.push(bid.id);
        }

        let auction = store
            .clearing_mut(auction_id)
            .ok_or(OrdhouseError::AuctionNotFound(auction_id))?;
        auction.inscriptions_assigned = u32::try_from(cursor).unwrap_or(u32::MAX);
        let auction_sold = cursor == inscription_ids.len();
        if auction_sold && auction.status == AuctionStatus::Active {
            auction.status = AuctionStatus::Sold;
        }
        auction.updated_at = now;
        drop(store);

        if !newly_settled.is_empty() {
            self.audit.record(
                "settlement_processed",
                serde_json::json!({
                    "auction_id": auction_id.to_string(),
                    "clearing_price": plan.clearing_price.to_string(),
                    "artifacts": artifacts.len(),
                    "settled_bids": newly_settled.len(),
                }),
            );
        }
        tracing::info!(
            auction = %auction_id,
            clearing_price = %plan.clearing_price,
            artifacts = artifacts.len(),
            "settlement processed"
        );

        Ok(SettlementRun {
            auction_id,
            clearing_price: plan.clearing_price,
            artifacts,
            newly_settled,
            auction_sold,
        })
    }

    /// Bulk status flip after off-chain broadcast confirmation. Per-item
    /// failures never abort the remaining ids; an already-SETTLED bid
    /// counts as updated without duplicate side effects.
    pub fn mark_settled(
        &self,
        auction_id: AuctionId,
        bid_ids: &[BidId],
    ) -> Result<MarkSettledOutcome> {
        let now = Utc::now();
        let mut store = self.lock_store()?;
        store
            .clearing(auction_id)
            .ok_or(OrdhouseError::AuctionNotFound(auction_id))?;

        let mut outcome = MarkSettledOutcome::default();
        for &bid_id in bid_ids {
            let Some(bid) = store.bid_mut(bid_id) else {
                outcome.errors.push(BidMarkError {
                    bid_id,
                    message: format!("Bid {bid_id} not found"),
                });
                continue;
            };
            if bid.auction_id != auction_id {
                outcome.errors.push(BidMarkError {
                    bid_id,
                    message: "Bid belongs to a different auction".to_string(),
                });
                continue;
            }
            match bid.status {
                BidStatus::Settled => outcome.updated += 1,
                BidStatus::PaymentConfirmed => match bid.mark_settled(now) {
                    Ok(()) => outcome.updated += 1,
                    Err(err) => outcome.errors.push(BidMarkError {
                        bid_id,
                        message: err.to_string(),
                    }),
                },
                BidStatus::Placed | BidStatus::PaymentPending => {
                    outcome.errors.push(BidMarkError {
                        bid_id,
                        message: "Payment must be confirmed first".to_string(),
                    });
                }
            }
        }
        drop(store);

        self.audit.record(
            "bids_marked_settled",
            serde_json::json!({
                "auction_id": auction_id.to_string(),
                "updated": outcome.updated,
                "errors": outcome.errors.len(),
            }),
        );
        Ok(outcome)
    }

    /// Transition every ACTIVE clearing auction past its deadline to
    /// EXPIRED. Expiry gates *placement*; bids already confirmed remain
    /// settleable.
    pub fn expire_due(&self, at: DateTime<Utc>) -> Result<usize> {
        let mut store = self.lock_store()?;
        let mut expired = 0usize;
        for id in store.clearing_ids() {
            if let Some(auction) = store.clearing_mut(id) {
                if auction.is_due(at) {
                    auction.mark_expired(at)?;
                    expired += 1;
                    self.audit.record(
                        "clearing_auction_expired",
                        serde_json::json!({ "auction_id": id.to_string() }),
                    );
                }
            }
        }
        if expired > 0 {
            tracing::info!(count = expired, "expired due clearing auctions");
        }
        Ok(expired)
    }
}

/// Continuous per-slot price for a clearing auction at `at`.
fn unit_price(auction: &ClearingAuction, at: DateTime<Utc>) -> Decimal {
    let params = ScheduleParams {
        start_price: auction.start_price,
        floor_price: auction.min_price,
        duration_secs: auction.duration_secs,
        interval_secs: auction.decrement_interval_secs,
        curve: DecayCurve::Linear,
    };
    params.price_at((at - auction.start_time).num_seconds())
}

/// Clearing price + greedy allocation snapshot. Shared by the pure
/// calculation entry point and the settlement processor (same lock).
fn plan_for<S: AuctionStore>(store: &S, auction_id: AuctionId) -> Result<SettlementPlan> {
    let auction = store
        .clearing(auction_id)
        .ok_or(OrdhouseError::AuctionNotFound(auction_id))?;

    let mut bids: Vec<&Bid> = store
        .auction_bids(auction_id)
        .iter()
        .filter_map(|id| store.bid(*id))
        .filter(|b| matches!(b.status, BidStatus::PaymentConfirmed | BidStatus::Settled))
        .collect();
    // First confirmed, first served; the insertion-ordered index breaks
    // created_at ties deterministically (stable sort).
    bids.sort_by_key(|b| b.created_at);

    let mut remaining = auction.quantity;
    let mut allocations = Vec::new();
    for bid in bids {
        if remaining == 0 {
            break;
        }
        let allocated = bid.quantity.min(remaining);
        remaining -= allocated;
        allocations.push(BidAllocation {
            bid_id: bid.id,
            bidder_address: bid.bidder_address.clone(),
            requested: bid.quantity,
            allocated,
        });
    }

    Ok(SettlementPlan {
        auction_id,
        clearing_price: auction.clearing_price(),
        total_quantity: auction.quantity,
        items_remaining: auction.items_remaining,
        allocations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn ledger() -> ClearingLedger<MemoryStore> {
        ClearingLedger::new(
            Arc::new(Mutex::new(MemoryStore::new())),
            Arc::new(AuditLog::new()),
            Network::Testnet,
        )
    }

    fn auction(ledger: &ClearingLedger<MemoryStore>, slots: u32) -> AuctionId {
        ledger
            .create_auction(CreateClearingAuction {
                inscription_ids: (0..slots)
                    .map(|i| InscriptionId::new(format!("ins-{i}i0")))
                    .collect(),
                start_price: dec(100_000),
                min_price: dec(50_000),
                duration_secs: 3600,
                decrement_interval_secs: 60,
                start_time: Utc::now(),
            })
            .unwrap()
    }

    const BIDDER: &str = "tb1qbidder08d6qejxtdg4y5r3zarvary0c5xw7k";

    #[test]
    fn create_rejects_empty_inscriptions() {
        let err = ledger()
            .create_auction(CreateClearingAuction {
                inscription_ids: vec![],
                start_price: dec(1000),
                min_price: dec(100),
                duration_secs: 3600,
                decrement_interval_secs: 60,
                start_time: Utc::now(),
            })
            .unwrap_err();
        assert!(matches!(err, OrdhouseError::InvalidAuction { .. }));
    }

    #[test]
    fn place_bid_reserves_and_flips_sold() {
        let ledger = ledger();
        let id = auction(&ledger, 3);

        ledger.place_bid(id, BIDDER, 2).unwrap();
        assert_eq!(ledger.get(id).unwrap().items_remaining, 1);

        ledger.place_bid(id, BIDDER, 1).unwrap();
        let a = ledger.get(id).unwrap();
        assert_eq!(a.items_remaining, 0);
        assert_eq!(a.status, AuctionStatus::Sold);

        let err = ledger.place_bid(id, BIDDER, 1).unwrap_err();
        assert!(matches!(err, OrdhouseError::AuctionNotActive { .. }));
    }

    #[test]
    fn place_bid_overdraw_names_requested_vs_available() {
        let ledger = ledger();
        let id = auction(&ledger, 3);
        let err = ledger.place_bid(id, BIDDER, 5).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("requested 5"));
        assert!(msg.contains("available 3"));
        // Rejected placement leaves quantity untouched.
        assert_eq!(ledger.get(id).unwrap().items_remaining, 3);
    }

    #[test]
    fn place_bid_rejects_bad_address() {
        let ledger = ledger();
        let id = auction(&ledger, 3);
        let err = ledger.place_bid(id, "not-an-address", 1).unwrap_err();
        assert!(matches!(err, OrdhouseError::InvalidAddress { .. }));
    }

    #[test]
    fn create_bid_payment_requires_positive_amount() {
        let ledger = ledger();
        let id = auction(&ledger, 3);
        let err = ledger
            .create_bid_payment(id, BIDDER, Decimal::ZERO, 1)
            .unwrap_err();
        assert!(matches!(err, OrdhouseError::InvalidBid { .. }));
        assert_eq!(ledger.get(id).unwrap().items_remaining, 3);
    }

    #[test]
    fn create_bid_payment_issues_unique_escrows() {
        let ledger = ledger();
        let id = auction(&ledger, 4);
        let a = ledger
            .create_bid_payment(id, BIDDER, dec(100_000), 1)
            .unwrap();
        let b = ledger
            .create_bid_payment(id, BIDDER, dec(100_000), 1)
            .unwrap();
        assert_ne!(a.escrow_address, b.escrow_address);
        assert_eq!(a.status, BidStatus::PaymentPending);
        // Reservation applied exactly once per bid.
        assert_eq!(ledger.get(id).unwrap().items_remaining, 2);
    }

    #[test]
    fn confirm_requires_pending_status() {
        let ledger = ledger();
        let id = auction(&ledger, 3);
        let placed = ledger.place_bid(id, BIDDER, 1).unwrap();
        let err = ledger
            .confirm_payment(placed.id, Txid::new("aa".repeat(32)))
            .unwrap_err();
        assert!(matches!(err, OrdhouseError::InvalidTransition { .. }));
        assert_eq!(ledger.get_bid(placed.id).unwrap().status, BidStatus::Placed);
    }

    #[test]
    fn confirm_is_idempotent_for_same_txid() {
        let ledger = ledger();
        let id = auction(&ledger, 3);
        let bid = ledger
            .create_bid_payment(id, BIDDER, dec(100_000), 1)
            .unwrap();
        let txid = Txid::new("ab".repeat(32));

        let first = ledger.confirm_payment(bid.id, txid.clone()).unwrap();
        assert!(!first.already_confirmed);
        let confirmed_at = ledger.get_bid(bid.id).unwrap().updated_at;

        let second = ledger.confirm_payment(bid.id, txid.clone()).unwrap();
        assert!(second.already_confirmed);
        // No mutation on the idempotent path.
        assert_eq!(ledger.get_bid(bid.id).unwrap().updated_at, confirmed_at);

        // A different txid is not an idempotent repeat.
        let err = ledger
            .confirm_payment(bid.id, Txid::new("cd".repeat(32)))
            .unwrap_err();
        assert!(matches!(err, OrdhouseError::InvalidTransition { .. }));
    }

    #[test]
    fn calculate_settlement_is_pure() {
        let ledger = ledger();
        let id = auction(&ledger, 10);
        for _ in 0..5 {
            let bid = ledger
                .create_bid_payment(id, BIDDER, dec(100_000), 1)
                .unwrap();
            ledger
                .confirm_payment(bid.id, Txid::new(format!("{:064}", bid.id.timestamp_ms())))
                .unwrap();
        }

        let plan1 = ledger.calculate_settlement(id).unwrap();
        let plan2 = ledger.calculate_settlement(id).unwrap();
        assert_eq!(plan1.clearing_price, dec(75_000));
        assert_eq!(plan1.allocated_total(), 5);
        assert_eq!(plan2.allocated_total(), 5);
        assert_eq!(ledger.get(id).unwrap().items_remaining, 5);
    }

    #[test]
    fn settlement_with_only_pending_bids_fails() {
        let ledger = ledger();
        let id = auction(&ledger, 5);
        let bid = ledger
            .create_bid_payment(id, BIDDER, dec(100_000), 2)
            .unwrap();

        let err = ledger.process_settlement(id).unwrap_err();
        assert!(matches!(err, OrdhouseError::PaymentNotConfirmed(b) if b == bid.id));
        // Nothing changed.
        assert_eq!(
            ledger.get_bid(bid.id).unwrap().status,
            BidStatus::PaymentPending
        );
        assert_eq!(ledger.get(id).unwrap().items_remaining, 3);
    }

    #[test]
    fn settlement_with_no_bids_is_empty() {
        let ledger = ledger();
        let id = auction(&ledger, 5);
        let run = ledger.process_settlement(id).unwrap();
        assert!(run.artifacts.is_empty());
        assert!(run.newly_settled.is_empty());
        assert!(!run.auction_sold);
    }

    #[test]
    fn mark_settled_accumulates_partial_results() {
        let ledger = ledger();
        let id = auction(&ledger, 6);

        let confirmed = ledger
            .create_bid_payment(id, BIDDER, dec(100_000), 1)
            .unwrap();
        ledger
            .confirm_payment(confirmed.id, Txid::new("aa".repeat(32)))
            .unwrap();
        let pending = ledger
            .create_bid_payment(id, BIDDER, dec(100_000), 1)
            .unwrap();
        let missing = BidId::new();

        let outcome = ledger
            .mark_settled(id, &[confirmed.id, pending.id, missing])
            .unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.is_partial());
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.bid_id == pending.id && e.message == "Payment must be confirmed first"));
        assert!(outcome
            .errors
            .iter()
            .any(|e| e.bid_id == missing && e.message.contains("not found")));

        // Already-settled ids count as updated on repeat, no new errors for them.
        let outcome = ledger.mark_settled(id, &[confirmed.id]).unwrap();
        assert_eq!(outcome.updated, 1);
        assert!(outcome.errors.is_empty());
    }
}
