//! Auction models: single-item Dutch auctions and clearing-price batch
//! auctions over a fixed, ordered set of inscriptions.
//!
//! ## Status machine
//!
//! ```text
//!   ┌────────┐  buy-now / all settled  ┌──────┐
//!   │ ACTIVE ├────────────────────────▶│ SOLD │
//!   └───┬────┘                         └──────┘
//!       │ deadline passed
//!       ▼
//!   ┌─────────┐
//!   │ EXPIRED │
//!   └─────────┘
//! ```
//!
//! Transitions are **monotonic**: once SOLD or EXPIRED a record is frozen —
//! price and status mutations are rejected.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AuctionId, InscriptionId, OrdhouseError, Result, Txid};

/// Lifecycle status shared by both auction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionStatus {
    /// Accepting bids / buy-now; price decays on schedule.
    Active,
    /// All quantity sold (or buy-now executed). Terminal.
    Sold,
    /// Deadline passed with quantity unsold. Terminal.
    Expired,
}

impl AuctionStatus {
    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Sold | Self::Expired)
        )
    }
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Sold => write!(f, "SOLD"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Opaque ciphertext blob holding an auction key encrypted by the external
/// encryption provider. The engine stores and returns it — never decrypts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob(pub Vec<u8>);

impl EncryptedBlob {
    #[must_use]
    pub fn new(ciphertext: Vec<u8>) -> Self {
        Self(ciphertext)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Debug never prints ciphertext bytes — they end up in logs otherwise.
impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedBlob({} bytes)", self.0.len())
    }
}

fn end_of(start_time: DateTime<Utc>, duration_secs: u64) -> DateTime<Utc> {
    i64::try_from(duration_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|duration| start_time.checked_add_signed(duration))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// ---------------------------------------------------------------------------
// DutchAuction
// ---------------------------------------------------------------------------

/// A single-item buy-now Dutch auction.
///
/// The price starts at `start_price` and steps down every
/// `decrement_interval_secs` until it reaches `min_price` at the deadline.
/// The first buy-now executes the sale; the record is then frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutchAuction {
    pub id: AuctionId,
    pub inscription_id: InscriptionId,
    /// Starting price in sats.
    pub start_price: Decimal,
    /// Floor price in sats. Invariant: `min_price <= start_price`.
    pub min_price: Decimal,
    pub duration_secs: u64,
    pub decrement_interval_secs: u64,
    pub start_time: DateTime<Utc>,
    /// Derived: `start_time + duration_secs`.
    pub end_time: DateTime<Utc>,
    pub status: AuctionStatus,
    /// Address the sale settles into, derived by the external key provider.
    pub auction_address: String,
    /// Auction key ciphertext. Held for the recovery tooling, never decrypted.
    pub encrypted_private_key: EncryptedBlob,
    pub buyer_address: Option<String>,
    pub transaction_id: Option<Txid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DutchAuction {
    /// Construct a new active auction. `end_time` is derived.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inscription_id: InscriptionId,
        start_price: Decimal,
        min_price: Decimal,
        duration_secs: u64,
        decrement_interval_secs: u64,
        start_time: DateTime<Utc>,
        auction_address: String,
        encrypted_private_key: EncryptedBlob,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AuctionId::new(),
            inscription_id,
            start_price,
            min_price,
            duration_secs,
            decrement_interval_secs,
            start_time,
            end_time: end_of(start_time, duration_secs),
            status: AuctionStatus::Active,
            auction_address,
            encrypted_private_key,
            buyer_address: None,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this auction should be swept to EXPIRED at `at`.
    #[must_use]
    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Active && at >= self.end_time
    }

    /// Terminal transition: record the sale.
    ///
    /// # Errors
    /// Returns [`OrdhouseError::AuctionNotActive`] unless currently ACTIVE.
    pub fn mark_sold(
        &mut self,
        buyer_address: String,
        transaction_id: Txid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.status.can_transition_to(AuctionStatus::Sold) {
            return Err(OrdhouseError::AuctionNotActive {
                id: self.id,
                status: self.status,
            });
        }
        self.status = AuctionStatus::Sold;
        self.buyer_address = Some(buyer_address);
        self.transaction_id = Some(transaction_id);
        self.updated_at = now;
        Ok(())
    }

    /// Terminal transition: deadline passed without a sale.
    ///
    /// # Errors
    /// Returns [`OrdhouseError::AuctionNotActive`] unless currently ACTIVE.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(AuctionStatus::Expired) {
            return Err(OrdhouseError::AuctionNotActive {
                id: self.id,
                status: self.status,
            });
        }
        self.status = AuctionStatus::Expired;
        self.updated_at = now;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ClearingAuction
// ---------------------------------------------------------------------------

/// A clearing-price batch auction over `quantity` fungible slots backed by
/// a fixed, ordered inscription list (the settlement draw order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingAuction {
    pub id: AuctionId,
    /// Fixed at creation; settlement draws inscriptions in this order.
    pub inscription_ids: Vec<InscriptionId>,
    /// Total slots. Equals `inscription_ids.len()`.
    pub quantity: u32,
    /// Slots not yet reserved by a bid. Invariant: `<= quantity`.
    pub items_remaining: u32,
    /// Settlement cursor: inscriptions already issued to settled bids.
    /// Monotonic — this is what makes double-issue impossible.
    pub inscriptions_assigned: u32,
    pub status: AuctionStatus,
    /// Starting price per slot, in sats.
    pub start_price: Decimal,
    /// Floor price per slot, in sats.
    pub min_price: Decimal,
    pub duration_secs: u64,
    pub decrement_interval_secs: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClearingAuction {
    /// Construct a new active clearing auction over the given inscriptions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(
        inscription_ids: Vec<InscriptionId>,
        start_price: Decimal,
        min_price: Decimal,
        duration_secs: u64,
        decrement_interval_secs: u64,
        start_time: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        let quantity = inscription_ids.len() as u32;
        Self {
            id: AuctionId::new(),
            inscription_ids,
            quantity,
            items_remaining: quantity,
            inscriptions_assigned: 0,
            status: AuctionStatus::Active,
            start_price,
            min_price,
            duration_secs,
            decrement_interval_secs,
            start_time,
            end_time: end_of(start_time, duration_secs),
            created_at: now,
            updated_at: now,
        }
    }

    /// Slots already reserved by bids.
    #[must_use]
    pub fn items_sold(&self) -> u32 {
        self.quantity - self.items_remaining
    }

    /// Fraction of total quantity sold, in `[0, 1]`.
    #[must_use]
    pub fn sold_fraction(&self) -> Decimal {
        if self.quantity == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.items_sold()) / Decimal::from(self.quantity)
        }
    }

    /// The uniform clearing price all allocated slots settle at:
    /// `max(min_price, round(start_price - (start_price - min_price) * sold_fraction))`.
    #[must_use]
    pub fn clearing_price(&self) -> Decimal {
        let decayed = self.start_price - (self.start_price - self.min_price) * self.sold_fraction();
        decayed.round().max(self.min_price)
    }

    /// Reserve `qty` slots for a new bid. Flips status to SOLD when the last
    /// slot goes. Must be called inside the ledger's critical section —
    /// the availability check and the decrement are one unit.
    ///
    /// # Errors
    /// - [`OrdhouseError::AuctionNotActive`] unless currently ACTIVE
    /// - [`OrdhouseError::QuantityUnavailable`] if `qty` exceeds `items_remaining`
    /// - [`OrdhouseError::InvalidBid`] if `qty` is zero
    pub fn reserve(&mut self, qty: u32, now: DateTime<Utc>) -> Result<()> {
        if self.status != AuctionStatus::Active {
            return Err(OrdhouseError::AuctionNotActive {
                id: self.id,
                status: self.status,
            });
        }
        if qty == 0 {
            return Err(OrdhouseError::InvalidBid {
                reason: "quantity must be greater than zero".to_string(),
            });
        }
        if qty > self.items_remaining {
            return Err(OrdhouseError::QuantityUnavailable {
                requested: qty,
                available: self.items_remaining,
            });
        }
        self.items_remaining -= qty;
        if self.items_remaining == 0 {
            self.status = AuctionStatus::Sold;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Whether this auction should be swept to EXPIRED at `at`.
    #[must_use]
    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Active && at >= self.end_time
    }

    /// Terminal transition: deadline passed with slots unsold.
    ///
    /// # Errors
    /// Returns [`OrdhouseError::AuctionNotActive`] unless currently ACTIVE.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(AuctionStatus::Expired) {
            return Err(OrdhouseError::AuctionNotActive {
                id: self.id,
                status: self.status,
            });
        }
        self.status = AuctionStatus::Expired;
        self.updated_at = now;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl DutchAuction {
    pub fn dummy(start_price: Decimal, min_price: Decimal, duration_secs: u64) -> Self {
        Self::new(
            InscriptionId::new("inscription-0i0"),
            start_price,
            min_price,
            duration_secs,
            60,
            Utc::now(),
            "tb1qauctionaddressxxxxxxxxxxxxxxxxxxxxxxxx".to_string(),
            EncryptedBlob::new(vec![0u8; 48]),
        )
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl ClearingAuction {
    pub fn dummy(quantity: u32, start_price: Decimal, min_price: Decimal) -> Self {
        let inscriptions = (0..quantity)
            .map(|i| InscriptionId::new(format!("inscription-{i}i0")))
            .collect();
        Self::new(inscriptions, start_price, min_price, 3600, 60, Utc::now())
    }
}
