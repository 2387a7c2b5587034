//! Object-storage adapters.

mod signed_url;

pub use signed_url::{ProxySignedStorage, StorageSettings};
