//! Shared Diesel error mapping for the persistence adapters.
//!
//! Unique and foreign-key violations are surfaced through dedicated
//! constructors so callers can re-map them to their domain kinds; everything
//! else degrades to query/connection errors.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// Used by the read-only reference repositories where constraint violations
/// cannot occur.
pub fn map_basic_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(String) -> E,
    C: Fn(String) -> E,
{
    map_diesel_error(error, &query, &connection, &query, &query)
}

/// Map a Diesel error into the repository's error type, distinguishing
/// unique and foreign-key violations (reported with the violated constraint
/// name) from generic failures.
pub fn map_diesel_error<E, Q, C, D, F>(
    error: diesel::result::Error,
    query: Q,
    connection: C,
    duplicate: D,
    foreign_key: F,
) -> E
where
    Q: Fn(String) -> E,
    C: Fn(String) -> E,
    D: Fn(String) -> E,
    F: Fn(String) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => query("database query error".to_owned()),
        DieselError::DatabaseError(kind, info) => {
            let constraint = info
                .constraint_name()
                .unwrap_or("unnamed constraint")
                .to_owned();
            match kind {
                DatabaseErrorKind::UniqueViolation => duplicate(constraint),
                DatabaseErrorKind::ForeignKeyViolation => foreign_key(constraint),
                DatabaseErrorKind::ClosedConnection => {
                    connection("database connection error".to_owned())
                }
                _ => query("database error".to_owned()),
            }
        }
        _ => query("database error".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::ports::QuestionRepositoryError;

    fn map(error: diesel::result::Error) -> QuestionRepositoryError {
        map_diesel_error(
            error,
            QuestionRepositoryError::query,
            QuestionRepositoryError::connection,
            QuestionRepositoryError::duplicate_key,
            QuestionRepositoryError::foreign_key,
        )
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let mapped = map(diesel::result::Error::NotFound);
        assert!(matches!(mapped, QuestionRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_key() {
        let error = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );
        let mapped = map(error);
        assert!(matches!(
            mapped,
            QuestionRepositoryError::DuplicateKey { .. }
        ));
    }

    #[rstest]
    fn foreign_key_violation_maps_to_foreign_key() {
        let error = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ForeignKeyViolation,
            Box::new("violates foreign key constraint".to_owned()),
        );
        let mapped = map(error);
        assert!(matches!(mapped, QuestionRepositoryError::ForeignKey { .. }));
    }

    #[rstest]
    fn pool_errors_map_to_connection() {
        let mapped: QuestionRepositoryError = map_pool_error(
            PoolError::checkout("connection refused"),
            QuestionRepositoryError::connection,
        );
        assert!(mapped.to_string().contains("connection refused"));
    }
}
