//! Bitcoin network selection and address boundary checks.
//!
//! The engine does **not** validate address encodings — checksum and
//! script-type validation belong to the wallet layer. What it does enforce
//! at every mutating entry point is a boundary check: a bidder/buyer
//! address must carry the prefix of the configured network and fall within
//! plausible length bounds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{constants, OrdhouseError, Result};

/// The Bitcoin network an engine instance operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// Address prefixes accepted on this network (bech32 and legacy).
    #[must_use]
    pub fn address_prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::Mainnet => &["bc1", "1", "3"],
            Self::Testnet => &["tb1", "m", "n", "2"],
            Self::Regtest => &["bcrt1", "m", "n", "2"],
        }
    }

    /// The bech32 human-readable part used when deriving placeholder
    /// escrow addresses.
    #[must_use]
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Self::Mainnet => "bc1q",
            Self::Testnet => "tb1q",
            Self::Regtest => "bcrt1q",
        }
    }

    /// Boundary check: non-empty, plausible length, network-correct prefix.
    ///
    /// # Errors
    /// Returns [`OrdhouseError::InvalidAddress`] if the address fails any check.
    pub fn validate_address(&self, address: &str) -> Result<()> {
        let plausible_len = (constants::MIN_ADDRESS_LEN..=constants::MAX_ADDRESS_LEN)
            .contains(&address.len());
        if plausible_len
            && self
                .address_prefixes()
                .iter()
                .any(|p| address.starts_with(p))
        {
            return Ok(());
        }
        Err(OrdhouseError::InvalidAddress {
            network: *self,
            address: address.to_string(),
        })
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
            Self::Regtest => write!(f, "regtest"),
        }
    }
}
