//! Marketplace checkout pipeline.
//!
//! Converts a buyer's multi-seller cart into one persisted order per seller,
//! gated by per-seller transaction quotas, operating hours, payment-method
//! risk rules and distance-based shipping cost.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
