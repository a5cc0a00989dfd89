//! Globally unique identifiers used throughout Ordhouse.
//!
//! Auction and bid IDs use UUIDv7 for time-ordered lexicographic sorting —
//! bid ID order doubles as the `created_at` tie-break during allocation.
//! Inscription IDs and transaction IDs are opaque chain-side strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AuctionId
// ---------------------------------------------------------------------------

/// Globally unique auction identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AuctionId(pub Uuid);

impl AuctionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for AuctionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BidId
// ---------------------------------------------------------------------------

/// Globally unique bid identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BidId(pub Uuid);

impl BidId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for BidId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// InscriptionId
// ---------------------------------------------------------------------------

/// Identifier of an inscribed on-chain asset (e.g. `<txid>i<index>`).
///
/// The engine treats inscription IDs as opaque — parsing and provenance
/// checks belong to the chain-data layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct InscriptionId(pub String);

impl InscriptionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Txid
// ---------------------------------------------------------------------------

/// A Bitcoin transaction identifier (hex string).
///
/// Real txids arrive from the chain-data provider. Buy-now execution
/// synthesizes a deterministic placeholder via [`Txid::synthetic`] until the
/// external PSBT builder broadcasts the real transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Txid(pub String);

impl Txid {
    #[must_use]
    pub fn new(txid: impl Into<String>) -> Self {
        Self(txid.into())
    }

    /// Deterministic placeholder txid for a buy-now execution.
    ///
    /// Same auction + buyer always yields the same txid, so re-running a
    /// recovery sweep never mints a second identifier for the same sale.
    #[must_use]
    pub fn synthetic(auction_id: AuctionId, buyer_address: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"ordhouse:txid:v1:");
        hasher.update(auction_id.0.as_bytes());
        hasher.update(buyer_address.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auction_id_uniqueness() {
        let a = AuctionId::new();
        let b = AuctionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn bid_id_ordering() {
        let a = BidId::new();
        let b = BidId::new();
        assert!(a < b);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn bid_id_timestamp_extraction() {
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let id = BidId::new();
        let after = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = id.timestamp_ms();
        assert!(
            ts >= before && ts <= after,
            "ts={ts}, before={before}, after={after}"
        );
    }

    #[test]
    fn synthetic_txid_deterministic() {
        let auction = AuctionId::new();
        let a = Txid::synthetic(auction, "tb1qbuyer");
        let b = Txid::synthetic(auction, "tb1qbuyer");
        assert_eq!(a, b);
        let c = Txid::synthetic(auction, "tb1qother");
        assert_ne!(a, c);
    }

    #[test]
    fn synthetic_txid_is_hex256() {
        let txid = Txid::synthetic(AuctionId::new(), "tb1qbuyer");
        assert_eq!(txid.as_str().len(), 64);
        assert!(txid.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn serde_roundtrips() {
        let aid = AuctionId::new();
        let json = serde_json::to_string(&aid).unwrap();
        let back: AuctionId = serde_json::from_str(&json).unwrap();
        assert_eq!(aid, back);

        let bid = BidId::new();
        let json = serde_json::to_string(&bid).unwrap();
        let back: BidId = serde_json::from_str(&json).unwrap();
        assert_eq!(bid, back);
    }

    #[test]
    fn inscription_id_display() {
        let ins = InscriptionId::new("abc123i0");
        assert_eq!(ins.to_string(), "abc123i0");
        assert_eq!(ins.as_str(), "abc123i0");
    }
}
