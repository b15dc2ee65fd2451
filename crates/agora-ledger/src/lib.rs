//! # agora-ledger
//!
//! Marketplace ledger for the Agora network.
//!
//! Coordinates the full lifecycle of a sale: seller registration,
//! product listing, order placement, escrowed payment, shipment,
//! delivery settlement, dispute arbitration, and post-delivery
//! reviews. All funds in flight are custodied by per-order escrow
//! accounts; settlement splits each escrow between the seller and the
//! platform treasury down to the last micro-AGO.
//!
//! The entry point is [`Marketplace`], configured with a
//! [`MarketConfig`] naming the administrative identity.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod dispute;
pub mod error;
pub mod escrow;
pub mod ledger;
pub mod order;
pub mod registry;
pub mod review;

pub use catalog::{Listing, Product};
pub use dispute::Dispute;
pub use error::{LedgerError, Result};
pub use escrow::EscrowAccount;
pub use ledger::{MarketConfig, Marketplace};
pub use order::{Order, OrderCost, OrderStatus};
pub use registry::SellerProfile;
pub use review::Review;
