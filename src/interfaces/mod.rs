//! Inbound adapters: CSV cart ingestion and JSON world fixtures for the CLI.

pub mod csv;
pub mod fixture;
