//! Port for area reference lookups.

use async_trait::async_trait;

use crate::domain::question::Area;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by area repository adapters.
    pub enum AreaRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "area repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "area repository query failed: {message}",
    }
}

/// Port for reading area reference data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AreaRepository: Send + Sync {
    /// Load the areas matching `ids`; missing ids are simply absent from the
    /// result (the caller performs the all-or-nothing check).
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Area>, AreaRepositoryError>;
}

/// Fixture implementation returning a configurable area set.
#[derive(Debug, Default, Clone)]
pub struct FixtureAreaRepository {
    areas: Vec<Area>,
}

impl FixtureAreaRepository {
    /// Fixture pre-loaded with the given areas.
    #[must_use]
    pub fn with_areas(areas: Vec<Area>) -> Self {
        Self { areas }
    }
}

#[async_trait]
impl AreaRepository for FixtureAreaRepository {
    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Area>, AreaRepositoryError> {
        Ok(self
            .areas
            .iter()
            .filter(|area| ids.contains(&area.id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    fn area(id: i32, code: &str) -> Area {
        Area {
            id,
            code: code.to_owned(),
            name: format!("Area {code}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_filters_to_requested_ids() {
        let repo = FixtureAreaRepository::with_areas(vec![area(1, "A"), area(2, "B")]);
        let found = repo.find_by_ids(&[2, 999]).await.expect("lookup succeeds");
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|a| a.id), Some(2));
    }
}
