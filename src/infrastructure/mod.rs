//! Port implementations: in-memory stores for tests and the CLI, the system
//! clock, and an optional RocksDB-backed store.

pub mod clock;
pub mod in_memory;
pub mod notify;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
