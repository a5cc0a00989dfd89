//! # ordhouse-types
//!
//! Shared types, errors, and configuration for the **Ordhouse** auction
//! and settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AuctionId`], [`BidId`], [`InscriptionId`], [`Txid`]
//! - **Auction models**: [`DutchAuction`], [`ClearingAuction`], [`AuctionStatus`]
//! - **Bid model**: [`Bid`], [`BidStatus`] (the payment state machine)
//! - **Settlement model**: [`SettlementArtifact`], [`SettlementPlan`], [`SettlementRun`]
//! - **Audit model**: [`AuditEvent`]
//! - **Network**: [`Network`] with address boundary checks
//! - **Configuration**: [`EngineConfig`], [`MonitorConfig`]
//! - **Errors**: [`OrdhouseError`] with `OH_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod audit;
pub mod auction;
pub mod bid;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod network;
pub mod settlement;

// Re-export all primary types at crate root for ergonomic imports:
//   use ordhouse_types::{DutchAuction, ClearingAuction, Bid, BidStatus, ...};

pub use audit::*;
pub use auction::*;
pub use bid::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use network::*;
pub use settlement::*;

// Constants are accessed via `ordhouse_types::constants::FOO`
// (not re-exported to avoid name collisions).
