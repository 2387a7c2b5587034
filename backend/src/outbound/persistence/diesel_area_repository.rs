//! PostgreSQL-backed `AreaRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AreaRepository, AreaRepositoryError};
use crate::domain::question::Area;

use super::error_mapping::{map_basic_diesel_error, map_pool_error};
use super::models::AreaRow;
use super::pool::{DbPool, PoolError};
use super::schema::areas;

/// Diesel-backed implementation of the area repository port.
#[derive(Clone)]
pub struct DieselAreaRepository {
    pool: DbPool,
}

impl DieselAreaRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> AreaRepositoryError {
    map_pool_error(error, AreaRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> AreaRepositoryError {
    map_basic_diesel_error(
        error,
        AreaRepositoryError::query,
        AreaRepositoryError::connection,
    )
}

#[async_trait]
impl AreaRepository for DieselAreaRepository {
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Area>, AreaRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let rows: Vec<AreaRow> = areas::table
            .filter(areas::id.eq_any(ids))
            .order_by(areas::id)
            .select(AreaRow::as_select())
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
        let mapped = map_pool(PoolError::checkout("connection refused"));
        assert!(matches!(mapped, AreaRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn diesel_errors_map_to_query() {
        let mapped = map_diesel(diesel::result::Error::NotFound);
        assert!(matches!(mapped, AreaRepositoryError::Query { .. }));
    }
}
