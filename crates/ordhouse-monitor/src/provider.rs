//! Chain-data provider contract.
//!
//! The monitor's only view of the blockchain. A provider failure is
//! treated as "no new information this cycle" — the bid stays pending and
//! the next cycle retries. Timeouts are the provider's responsibility;
//! the monitor assumes every call returns within a bounded budget.

use std::future::Future;

use ordhouse_types::{Result, Txid};
use rust_decimal::Decimal;

/// One output of a transaction paying an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: String,
    pub value_sats: Decimal,
}

/// A transaction observed paying an address (mempool or confirmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTransaction {
    pub txid: Txid,
    pub outputs: Vec<TxOutput>,
}

/// Confirmation status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfirmation {
    pub confirmed: bool,
    pub block_height: Option<u64>,
}

/// Read-only chain queries the reconciliation cycle depends on.
///
/// Implementations wrap an indexer or node RPC; they may fail with
/// [`ordhouse_types::OrdhouseError::ChainData`] at any time.
pub trait ChainDataProvider: Send + Sync {
    /// Transactions paying `address`, newest last.
    fn transactions_for_address(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Vec<AddressTransaction>>> + Send;

    /// Confirmation status of `txid`.
    fn transaction_confirmation(
        &self,
        txid: &Txid,
    ) -> impl Future<Output = Result<TxConfirmation>> + Send;
}

/// Scripted in-memory provider for tests.
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use ordhouse_types::OrdhouseError;

    use super::{AddressTransaction, ChainDataProvider, Result, TxConfirmation, Txid};

    /// Scripted provider: tests preload address transactions and
    /// confirmations, or flip `fail` to simulate an indexer outage.
    #[derive(Debug, Default)]
    pub struct MockChainProvider {
        transactions: Mutex<HashMap<String, Vec<AddressTransaction>>>,
        confirmations: Mutex<HashMap<Txid, TxConfirmation>>,
        fail: Mutex<bool>,
        /// Per-call artificial latency, for in-flight guard tests.
        pub delay_ms: u64,
    }

    impl MockChainProvider {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A provider whose every call takes `delay_ms` — for tests that
        /// need a cycle to still be in flight when the next tick lands.
        #[must_use]
        pub fn with_delay_ms(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Self::default()
            }
        }

        pub fn add_transaction(&self, address: &str, tx: AddressTransaction) {
            self.transactions
                .lock()
                .unwrap()
                .entry(address.to_string())
                .or_default()
                .push(tx);
        }

        pub fn set_confirmation(&self, txid: Txid, confirmation: TxConfirmation) {
            self.confirmations.lock().unwrap().insert(txid, confirmation);
        }

        pub fn set_failing(&self, failing: bool) {
            *self.fail.lock().unwrap() = failing;
        }

        fn check_failure(&self) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(OrdhouseError::ChainData {
                    reason: "mock provider outage".to_string(),
                });
            }
            Ok(())
        }
    }

    impl ChainDataProvider for MockChainProvider {
        async fn transactions_for_address(
            &self,
            address: &str,
        ) -> Result<Vec<AddressTransaction>> {
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            self.check_failure()?;
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .get(address)
                .cloned()
                .unwrap_or_default())
        }

        async fn transaction_confirmation(&self, txid: &Txid) -> Result<TxConfirmation> {
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            self.check_failure()?;
            Ok(self
                .confirmations
                .lock()
                .unwrap()
                .get(txid)
                .copied()
                .unwrap_or(TxConfirmation {
                    confirmed: false,
                    block_height: None,
                }))
        }
    }
}
