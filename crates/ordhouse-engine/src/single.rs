//! Single-item buy-now Dutch auction ledger.
//!
//! The stepped-interval price (see [`ordhouse_schedule::stepped_price`])
//! decays from `start_price` to `min_price`; the first valid buy-now
//! executes the sale. Expiry is an explicit sweep driven by the
//! reconciliation monitor — price queries derive the EXPIRED status without
//! persisting it.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use ordhouse_schedule::stepped_price;
use ordhouse_types::{
    redact_address, AuctionId, AuctionStatus, DutchAuction, EncryptedBlob, InscriptionId, Network,
    OrdhouseError, Result, Txid,
};
use rust_decimal::Decimal;

use crate::audit::AuditLog;
use crate::store::AuctionStore;

/// Inputs for creating a single-item auction. The address and key
/// ciphertext come from the external key-derivation and encryption
/// providers — the ledger stores them opaquely.
#[derive(Debug, Clone)]
pub struct CreateDutchAuction {
    pub inscription_id: InscriptionId,
    pub start_price: Decimal,
    pub min_price: Decimal,
    pub duration_secs: u64,
    pub decrement_interval_secs: u64,
    pub start_time: DateTime<Utc>,
    pub auction_address: String,
    pub encrypted_private_key: EncryptedBlob,
}

/// Ledger for single-item buy-now Dutch auctions.
pub struct SingleLedger<S: AuctionStore> {
    store: Arc<Mutex<S>>,
    audit: Arc<AuditLog>,
    network: Network,
}

impl<S: AuctionStore> SingleLedger<S> {
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

    /// Insert a new ACTIVE auction.
    ///
    /// # Errors
    /// - `InvalidAuction` if `min_price > start_price` (defense — the
    ///   schedule validates separately) or the duration is zero
    /// - `InvalidAddress` if the auction address fails the boundary check
    pub fn create(&self, input: CreateDutchAuction) -> Result<AuctionId> {
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
        self.network.validate_address(&input.auction_address)?;

        let auction = DutchAuction::new(
            input.inscription_id,
            input.start_price,
            input.min_price,
            input.duration_secs,
            input.decrement_interval_secs,
            input.start_time,
            input.auction_address,
            input.encrypted_private_key,
        );
        let id = auction.id;
        let inscription = auction.inscription_id.clone();

        self.lock_store()?.insert_dutch(auction)?;

        self.audit.record(
            "auction_created",
            serde_json::json!({
                "auction_id": id.to_string(),
                "inscription_id": inscription.to_string(),
                "start_price": input.start_price.to_string(),
                "min_price": input.min_price.to_string(),
            }),
        );
        tracing::info!(auction = %id, inscription = %inscription, "Dutch auction created");
        Ok(id)
    }

    /// Fetch a snapshot of an auction.
    pub fn get(&self, id: AuctionId) -> Result<DutchAuction> {
        self.lock_store()?
            .dutch(id)
            .cloned()
            .ok_or(OrdhouseError::AuctionNotFound(id))
    }

    /// Stepped price at `at`, plus the status the auction *would* have —
    /// a pure query: an auction past its deadline reads EXPIRED here even
    /// before the expiry sweep persists it.
    pub fn current_price(&self, id: AuctionId, at: DateTime<Utc>) -> Result<(Decimal, AuctionStatus)> {
        let store = self.lock_store()?;
        let auction = store.dutch(id).ok_or(OrdhouseError::AuctionNotFound(id))?;
        let elapsed = (at - auction.start_time).num_seconds();
        let price = stepped_price(
            auction.start_price,
            auction.min_price,
            auction.duration_secs,
            auction.decrement_interval_secs,
            elapsed,
        );
        let status = if auction.is_due(at) {
            AuctionStatus::Expired
        } else {
            auction.status
        };
        Ok((price, status))
    }

    /// Transition every ACTIVE auction whose deadline has passed to
    /// EXPIRED. Idempotent: a second sweep updates nothing.
    pub fn expire_due(&self, at: DateTime<Utc>) -> Result<usize> {
        let mut store = self.lock_store()?;
        let mut expired = 0usize;
        for id in store.dutch_ids() {
            if let Some(auction) = store.dutch_mut(id) {
                if auction.is_due(at) {
                    auction.mark_expired(at)?;
                    expired += 1;
                    self.audit.record(
                        "auction_expired",
                        serde_json::json!({ "auction_id": id.to_string() }),
                    );
                }
            }
        }
        if expired > 0 {
            tracing::info!(count = expired, "expired due Dutch auctions");
        }
        Ok(expired)
    }

    /// Execute buy-now: the terminal ACTIVE -> SOLD transition.
    ///
    /// Records the buyer, synthesizes a placeholder txid for the external
    /// PSBT builder to replace, and freezes the record.
    ///
    /// # Errors
    /// - `InvalidAddress` if the buyer address fails the boundary check
    /// - `AuctionNotFound` / `AuctionNotActive`
    pub fn execute_buy_now(&self, id: AuctionId, buyer_address: &str) -> Result<DutchAuction> {
        self.network.validate_address(buyer_address)?;
        let now = Utc::now();

        let mut store = self.lock_store()?;
        let auction = store
            .dutch_mut(id)
            .ok_or(OrdhouseError::AuctionNotFound(id))?;

        let txid = Txid::synthetic(id, buyer_address);
        auction.mark_sold(buyer_address.to_string(), txid.clone(), now)?;
        let snapshot = auction.clone();
        drop(store);

        self.audit.record(
            "buy_now_executed",
            serde_json::json!({
                "auction_id": id.to_string(),
                "buyer": redact_address(buyer_address),
                "transaction_id": txid.to_string(),
            }),
        );
        tracing::info!(auction = %id, txid = %txid, "buy-now executed");
        Ok(snapshot)
    }

    /// Number of auctions currently ACTIVE.
    pub fn active_count(&self) -> Result<usize> {
        let store = self.lock_store()?;
        Ok(store
            .dutch_ids()
            .into_iter()
            .filter_map(|id| store.dutch(id))
            .filter(|a| a.status == AuctionStatus::Active)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::store::MemoryStore;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn ledger() -> SingleLedger<MemoryStore> {
        SingleLedger::new(
            Arc::new(Mutex::new(MemoryStore::new())),
            Arc::new(AuditLog::new()),
            Network::Testnet,
        )
    }

    fn input(start_time: DateTime<Utc>) -> CreateDutchAuction {
        CreateDutchAuction {
            inscription_id: InscriptionId::new("abci0"),
            start_price: dec(100_000),
            min_price: dec(50_000),
            duration_secs: 100,
            decrement_interval_secs: 20,
            start_time,
            auction_address: "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx".to_string(),
            encrypted_private_key: EncryptedBlob::new(vec![1u8; 48]),
        }
    }

    #[test]
    fn create_rejects_inverted_prices() {
        let ledger = ledger();
        let mut bad = input(Utc::now());
        bad.min_price = dec(200_000);
        let err = ledger.create(bad).unwrap_err();
        assert!(matches!(err, OrdhouseError::InvalidAuction { .. }));
    }

    #[test]
    fn current_price_steps_down() {
        let ledger = ledger();
        let start = Utc::now();
        let id = ledger.create(input(start)).unwrap();

        let (p0, s0) = ledger.current_price(id, start).unwrap();
        assert_eq!(p0, dec(100_000));
        assert_eq!(s0, AuctionStatus::Active);

        let (p1, _) = ledger
            .current_price(id, start + Duration::seconds(20))
            .unwrap();
        assert_eq!(p1, dec(90_000));
    }

    #[test]
    fn current_price_derives_expired_without_persisting() {
        let ledger = ledger();
        let start = Utc::now();
        let id = ledger.create(input(start)).unwrap();

        let late = start + Duration::seconds(500);
        let (price, status) = ledger.current_price(id, late).unwrap();
        assert_eq!(price, dec(50_000));
        assert_eq!(status, AuctionStatus::Expired);

        // The query is side-effect free: the record itself is still ACTIVE.
        assert_eq!(ledger.get(id).unwrap().status, AuctionStatus::Active);
    }

    #[test]
    fn expire_due_is_idempotent() {
        let ledger = ledger();
        let start = Utc::now();
        let id = ledger.create(input(start)).unwrap();

        let late = start + Duration::seconds(500);
        assert_eq!(ledger.expire_due(late).unwrap(), 1);
        assert_eq!(ledger.get(id).unwrap().status, AuctionStatus::Expired);
        assert_eq!(ledger.expire_due(late).unwrap(), 0);
    }

    #[test]
    fn buy_now_is_terminal() {
        let ledger = ledger();
        let id = ledger.create(input(Utc::now())).unwrap();

        let sold = ledger
            .execute_buy_now(id, "tb1qbuyer508d6qejxtdg4y5r3zarvary0c5xw7k")
            .unwrap();
        assert_eq!(sold.status, AuctionStatus::Sold);
        assert!(sold.transaction_id.is_some());
        assert_eq!(
            sold.buyer_address.as_deref(),
            Some("tb1qbuyer508d6qejxtdg4y5r3zarvary0c5xw7k")
        );

        let err = ledger
            .execute_buy_now(id, "tb1qother508d6qejxtdg4y5r3zarvary0c5xw7k")
            .unwrap_err();
        assert!(matches!(err, OrdhouseError::AuctionNotActive { .. }));
    }

    #[test]
    fn buy_now_rejects_wrong_network_address() {
        let ledger = ledger();
        let id = ledger.create(input(Utc::now())).unwrap();
        let err = ledger
            .execute_buy_now(id, "bc1qmainnetbuyerxxxxxxxxxxxxxxxxxxxxxxxxx")
            .unwrap_err();
        assert!(matches!(err, OrdhouseError::InvalidAddress { .. }));
        assert_eq!(ledger.get(id).unwrap().status, AuctionStatus::Active);
    }

    #[test]
    fn buy_now_on_unknown_auction() {
        let ledger = ledger();
        let err = ledger
            .execute_buy_now(AuctionId::new(), "tb1qbuyer508d6qejxtdg4y5r3zarvary0c5xw7k")
            .unwrap_err();
        assert!(matches!(err, OrdhouseError::AuctionNotFound(_)));
    }

    #[test]
    fn mutations_append_audit_events() {
        let audit = Arc::new(AuditLog::new());
        let ledger = SingleLedger::new(
            Arc::new(Mutex::new(MemoryStore::new())),
            Arc::clone(&audit),
            Network::Testnet,
        );
        let id = ledger.create(input(Utc::now())).unwrap();
        ledger
            .execute_buy_now(id, "tb1qbuyer508d6qejxtdg4y5r3zarvary0c5xw7k")
            .unwrap();

        let events: Vec<String> = audit.events().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec!["auction_created", "buy_now_executed"]);
        // Buyer address must be redacted in the trail.
        let details = &audit.events()[1].details;
        assert!(!details["buyer"].as_str().unwrap().contains("508d6qejxtdg"));
    }
}
