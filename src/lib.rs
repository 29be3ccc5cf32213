//! RELAY: brokerage sell/buy/transfer workflow
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod encoding;
pub mod broker;
pub mod engine;
