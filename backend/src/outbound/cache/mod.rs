//! Redis-backed count cache adapter.
//!
//! Serves the pagination totals with a short TTL over a `bb8-redis` pool.
//! A small random jitter is added to each TTL so entries written together
//! do not expire together.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8;
use bb8_redis::redis::AsyncCommands;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::domain::ports::{CountCache, CountCacheError};

/// Upper bound on the random TTL extension, in seconds.
const TTL_JITTER_SECS: u64 = 30;

/// Redis implementation of the count cache port.
#[derive(Clone)]
pub struct RedisCountCache {
    pool: bb8::Pool<RedisConnectionManager>,
}

impl RedisCountCache {
    /// Connect a pooled client to the given Redis URL.
    ///
    /// # Errors
    ///
    /// Returns [`CountCacheError::Backend`] when the URL is invalid or the
    /// pool cannot be built.
    pub async fn connect(url: &str) -> Result<Self, CountCacheError> {
        let manager = RedisConnectionManager::new(url)
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        let pool = bb8::Pool::builder()
            .build(manager)
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        Ok(Self { pool })
    }

    async fn connection(
        &self,
    ) -> Result<bb8::PooledConnection<'_, RedisConnectionManager>, CountCacheError> {
        self.pool
            .get()
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))
    }
}

fn jittered_secs(ttl: Duration) -> u64 {
    let jitter = SmallRng::from_entropy().gen_range(0..=TTL_JITTER_SECS);
    ttl.as_secs().max(1) + jitter
}

#[async_trait]
impl CountCache for RedisCountCache {
    async fn get(&self, key: &str) -> Result<Option<u64>, CountCacheError> {
        let mut conn = self.connection().await?;
        conn.get(key)
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))
    }

    async fn set(&self, key: &str, value: u64, ttl: Duration) -> Result<(), CountCacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(key, value, jittered_secs(ttl))
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CountCacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .del(key)
            .await
            .map_err(|err| CountCacheError::backend(err.to_string()))?;
        Ok(())
    }
}
