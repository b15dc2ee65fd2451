//! Integration test crate for the Agora marketplace ledger.
//!
//! This crate exists solely to run integration tests that span multiple Agora crates.
//! It has no public API - all functionality is in the test modules.

#![forbid(unsafe_code)]
