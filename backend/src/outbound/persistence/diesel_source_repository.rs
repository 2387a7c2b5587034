//! PostgreSQL-backed `SourceRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SourceRepository, SourceRepositoryError};
use crate::domain::question::Source;

use super::error_mapping::{map_basic_diesel_error, map_pool_error};
use super::models::SourceRow;
use super::pool::{DbPool, PoolError};
use super::schema::sources;

/// Diesel-backed implementation of the source repository port.
#[derive(Clone)]
pub struct DieselSourceRepository {
    pool: DbPool,
}

impl DieselSourceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> SourceRepositoryError {
    map_pool_error(error, SourceRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> SourceRepositoryError {
    map_basic_diesel_error(
        error,
        SourceRepositoryError::query,
        SourceRepositoryError::connection,
    )
}

#[async_trait]
impl SourceRepository for DieselSourceRepository {
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Source>, SourceRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let rows: Vec<SourceRow> = sources::table
            .filter(sources::id.eq_any(ids))
            .order_by(sources::id)
            .select(SourceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_errors_map_to_connection() {
        let mapped = map_pool(PoolError::build("bad url"));
        assert!(matches!(mapped, SourceRepositoryError::Connection { .. }));
    }
}
