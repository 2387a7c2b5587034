//! Port for the short-lived pagination count cache.
//!
//! The cache is the only process-wide shared state in the system. It is an
//! injected collaborator with explicit operations and a TTL, never a global
//! singleton; entries expire on their own and invalidation on write is
//! best effort.

use std::time::Duration;

use async_trait::async_trait;

use super::macros::define_port_error;

/// Cache key for the question collection total.
pub const QUESTIONS_TOTAL_COUNT: &str = "questions:total_count";

/// Default entry lifetime.
pub const COUNT_TTL: Duration = Duration::from_secs(300);

define_port_error! {
    /// Errors raised by count-cache adapters.
    pub enum CountCacheError {
        /// The cache backend failed or was unreachable.
        Backend { message: String } =>
            "count cache backend error: {message}",
    }
}

/// Port for caching per-entity-kind collection totals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountCache: Send + Sync {
    /// Read a cached total; `None` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<u64>, CountCacheError>;

    /// Store a total with the given lifetime.
    async fn set(&self, key: &str, value: u64, ttl: Duration) -> Result<(), CountCacheError>;

    /// Drop a cached total after a create or delete of that entity kind.
    async fn invalidate(&self, key: &str) -> Result<(), CountCacheError>;
}

/// Cache double that never hits, for tests and cache-less boots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCountCache;

#[async_trait]
impl CountCache for NoOpCountCache {
    async fn get(&self, _key: &str) -> Result<Option<u64>, CountCacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: u64, _ttl: Duration) -> Result<(), CountCacheError> {
        Ok(())
    }

    async fn invalidate(&self, _key: &str) -> Result<(), CountCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoOpCountCache;
        cache
            .set(QUESTIONS_TOTAL_COUNT, 42, COUNT_TTL)
            .await
            .expect("set succeeds");
        let cached = cache.get(QUESTIONS_TOTAL_COUNT).await.expect("get succeeds");
        assert!(cached.is_none(), "no-op cache should always miss");
    }

    #[rstest]
    fn backend_error_formats_message() {
        let err = CountCacheError::backend("connection refused");
        assert!(err.to_string().contains("connection refused"));
    }
}
