//! Deterministic escrow address derivation.
//!
//! Each payment-tracked bid gets a unique, network-prefixed escrow address
//! derived from `SHA-256(auction || bidder || bid)`. This is a placeholder
//! behind the key-derivation provider contract: the engine only relies on
//! determinism and uniqueness. Production swaps in real BIP32 HD
//! derivation before any funds are at risk.

use ordhouse_types::{constants, AuctionId, BidId, Network};
use sha2::{Digest, Sha256};

/// Derive the escrow address for a bid.
///
/// Same `(auction, bidder, bid)` triple always yields the same address, so
/// recovery tooling can re-derive every escrow the engine ever issued.
#[must_use]
pub fn escrow_address(
    network: Network,
    auction_id: AuctionId,
    bidder_address: &str,
    bid_id: BidId,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"ordhouse:escrow:v1:");
    hasher.update(auction_id.0.as_bytes());
    hasher.update(bidder_address.as_bytes());
    hasher.update(bid_id.0.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!(
        "{}{}",
        network.bech32_hrp(),
        &digest[..constants::ESCROW_ADDRESS_DIGEST_CHARS]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_per_bid() {
        let auction = AuctionId::new();
        let bid = BidId::new();
        let a = escrow_address(Network::Testnet, auction, "tb1qbidder", bid);
        let b = escrow_address(Network::Testnet, auction, "tb1qbidder", bid);
        assert_eq!(a, b);
    }

    #[test]
    fn unique_per_bid() {
        let auction = AuctionId::new();
        let a = escrow_address(Network::Testnet, auction, "tb1qbidder", BidId::new());
        let b = escrow_address(Network::Testnet, auction, "tb1qbidder", BidId::new());
        assert_ne!(a, b);
    }

    #[test]
    fn network_prefixed() {
        let auction = AuctionId::new();
        let bid = BidId::new();
        assert!(escrow_address(Network::Mainnet, auction, "bc1qbidder", bid).starts_with("bc1q"));
        assert!(escrow_address(Network::Testnet, auction, "tb1qbidder", bid).starts_with("tb1q"));
        assert!(
            escrow_address(Network::Regtest, auction, "bcrt1qbidder", bid).starts_with("bcrt1q")
        );
    }

    #[test]
    fn passes_boundary_check() {
        let addr = escrow_address(Network::Testnet, AuctionId::new(), "tb1qbidder", BidId::new());
        Network::Testnet.validate_address(&addr).unwrap();
    }
}
