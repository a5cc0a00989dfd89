//! The reconciliation monitor: periodic expiry sweeps and escrow payment
//! detection.
//!
//! Single-threaded cycle with an in-flight guard — if the timer fires
//! while a cycle is still running, the tick is skipped, not queued.
//! `stop()` lets an in-flight cycle finish; it never aborts mid-mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ordhouse_engine::{AuctionStore, ClearingLedger, SingleLedger};
use ordhouse_types::{Bid, MonitorConfig, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::provider::ChainDataProvider;

/// Counters from one reconciliation cycle. The cycle never raises past
/// its boundary — failures land here and in the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub auctions_expired: usize,
    pub bids_checked: usize,
    pub payments_confirmed: usize,
    pub errors: usize,
}

/// Periodic reconciliation driver over both ledgers and a chain-data
/// provider.
pub struct ReconciliationMonitor<S: AuctionStore, P: ChainDataProvider> {
    single: Arc<SingleLedger<S>>,
    clearing: Arc<ClearingLedger<S>>,
    provider: Arc<P>,
    config: MonitorConfig,
    in_flight: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl<S: AuctionStore, P: ChainDataProvider> ReconciliationMonitor<S, P> {
    #[must_use]
    pub fn new(
        single: Arc<SingleLedger<S>>,
        clearing: Arc<ClearingLedger<S>>,
        provider: Arc<P>,
        config: MonitorConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            single,
            clearing,
            provider,
            config,
            in_flight: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Run cycles until [`Self::stop`]. The first cycle fires immediately;
    /// ticks that land while a cycle is in flight are skipped.
    pub async fn run(self: Arc<Self>) {
        let period = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            // stop() raced ahead of the loop.
            return;
        }

        tracing::info!(
            interval_secs = self.config.poll_interval_secs,
            "reconciliation monitor started"
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(report) = self.tick().await {
                        if report != CycleReport::default() {
                            tracing::info!(
                                expired = report.auctions_expired,
                                checked = report.bids_checked,
                                confirmed = report.payments_confirmed,
                                errors = report.errors,
                                "reconciliation cycle complete"
                            );
                        }
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("reconciliation monitor stopped");
    }

    /// Spawn [`Self::run`] onto the tokio runtime.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()>
    where
        S: 'static,
        P: 'static,
    {
        tokio::spawn(self.run())
    }

    /// Signal the loop to stop after any in-flight cycle finishes.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Guarded cycle entry. Returns `None` when a cycle is already in
    /// flight (the tick is dropped, not queued).
    pub async fn tick(&self) -> Option<CycleReport> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("reconciliation cycle in flight; tick skipped");
            return None;
        }
        let report = self.run_cycle().await;
        self.in_flight.store(false, Ordering::SeqCst);
        Some(report)
    }

    /// One reconciliation cycle. All internal errors are recoverable:
    /// logged, counted, and the loop continues with the next item.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let now = Utc::now();

        // Step 1: expiry sweeps. A failure here never aborts step 2.
        match self.single.expire_due(now) {
            Ok(expired) => report.auctions_expired += expired,
            Err(err) => {
                report.errors += 1;
                tracing::warn!(error = %err, "Dutch auction expiry sweep failed");
            }
        }
        match self.clearing.expire_due(now) {
            Ok(expired) => report.auctions_expired += expired,
            Err(err) => {
                report.errors += 1;
                tracing::warn!(error = %err, "clearing auction expiry sweep failed");
            }
        }
        if report.auctions_expired > 0 {
            tracing::info!(count = report.auctions_expired, "auctions expired this cycle");
        }

        // Step 2: pending payment checks.
        let pending = match self.clearing.payment_pending_bids() {
            Ok(pending) => pending,
            Err(err) => {
                report.errors += 1;
                tracing::warn!(error = %err, "could not list pending bids");
                return report;
            }
        };
        for bid in pending {
            report.bids_checked += 1;
            match self.check_bid(&bid).await {
                Ok(true) => report.payments_confirmed += 1,
                Ok(false) => {}
                Err(err) => {
                    report.errors += 1;
                    tracing::warn!(bid = %bid.id, error = %err, "payment check failed");
                }
            }
        }
        report
    }

    /// Check one pending bid. Chain queries run without any ledger lock;
    /// only the resulting `confirm_payment` call takes it.
    async fn check_bid(&self, bid: &Bid) -> Result<bool> {
        if let Some(txid) = &bid.transaction_id {
            // Bidder reported a txid: poll it for confirmation.
            let confirmation = self.provider.transaction_confirmation(txid).await?;
            if !confirmation.confirmed {
                return Ok(false);
            }
            let outcome = self.clearing.confirm_payment(bid.id, txid.clone())?;
            return Ok(!outcome.already_confirmed);
        }

        // No txid yet: scan the escrow address for a payment within
        // tolerance of the bid amount.
        let Some(escrow) = bid.escrow_address.as_deref() else {
            return Ok(false);
        };
        let transactions = self.provider.transactions_for_address(escrow).await?;
        let (low, high) = self.config.tolerance_bounds(bid.bid_amount);
        for tx in transactions {
            let matches = tx
                .outputs
                .iter()
                .any(|out| out.address == escrow && out.value_sats >= low && out.value_sats <= high);
            if matches {
                let outcome = self.clearing.confirm_payment(bid.id, tx.txid)?;
                return Ok(!outcome.already_confirmed);
            }
        }
        Ok(false)
    }
}
