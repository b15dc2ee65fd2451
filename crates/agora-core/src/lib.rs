//! # agora-core
//!
//! Currency and identity primitives for the Agora marketplace ledger.
//!
//! This crate provides:
//!
//! - [`Amount`] — unsigned fixed-point token amounts (6 decimals) with
//!   checked arithmetic
//! - [`Wallet`] / [`Address`] — Ed25519 keypairs and base58 addresses
//!   used as unforgeable caller identities

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod error;
pub mod wallet;

pub use amount::{Amount, DECIMALS, MICRO_PER_TOKEN};
pub use error::{CoreError, Result};
pub use wallet::{verify_signature, Address, Wallet};
