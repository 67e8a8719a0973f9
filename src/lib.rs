//! Bidwatch - Bid Aggregation Platform Backend
//!
//! This crate implements the payment-provider webhook ingestion endpoint
//! and the subscription lifecycle it drives: an idempotent payment ledger
//! and a per-user subscription state machine.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
