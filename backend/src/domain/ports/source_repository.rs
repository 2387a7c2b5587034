//! Port for source reference lookups.

use async_trait::async_trait;

use crate::domain::question::Source;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by source repository adapters.
    pub enum SourceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "source repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "source repository query failed: {message}",
    }
}

/// Port for reading source reference data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Load the sources matching `ids`; missing ids are simply absent from
    /// the result (the caller performs the all-or-nothing check).
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Source>, SourceRepositoryError>;
}

/// Fixture implementation returning a configurable source set.
#[derive(Debug, Default, Clone)]
pub struct FixtureSourceRepository {
    sources: Vec<Source>,
}

impl FixtureSourceRepository {
    /// Fixture pre-loaded with the given sources.
    #[must_use]
    pub fn with_sources(sources: Vec<Source>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl SourceRepository for FixtureSourceRepository {
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Source>, SourceRepositoryError> {
        Ok(self
            .sources
            .iter()
            .filter(|source| ids.contains(&source.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_filters_to_requested_ids() {
        let repo = FixtureSourceRepository::with_sources(vec![Source {
            id: 7,
            name: "Decenal".to_owned(),
            year: 2019,
            institution_id: 1,
        }]);
        let found = repo.find_by_ids(&[7, 8]).await.expect("lookup succeeds");
        assert_eq!(found.len(), 1);
    }

    #[rstest]
    fn connection_error_formats_message() {
        let err = SourceRepositoryError::connection("refused");
        assert!(err.to_string().contains("refused"));
    }
}
