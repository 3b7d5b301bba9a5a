//! Application layer: the quota ledger and the checkout orchestrator that
//! drive the domain rules against the storage and gateway ports.

pub mod checkout;
pub mod ledger;
