//! Outbound adapters: persistence, cache, and object storage.

pub mod cache;
pub mod persistence;
pub mod storage;
