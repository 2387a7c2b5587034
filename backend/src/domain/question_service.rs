//! Question aggregate orchestration.
//!
//! Creation runs hash computation, reference validation, invariant
//! validation, and assembly strictly before the single persist call, so a
//! validation failure never touches the store. Reads fetch, then resolve
//! image references, then project.

use std::sync::Arc;

use pagination::{Page, PageRequest};
use tracing::error;

use crate::domain::assembler::assemble;
use crate::domain::error::Error;
use crate::domain::hash::question_fingerprint;
use crate::domain::ports::{
    AreaRepository, AreaRepositoryError, QuestionRepository, QuestionRepositoryError,
    SourceRepository, SourceRepositoryError,
};
use crate::domain::question::{
    Area, NewQuestion, Question, QuestionFieldUpdate, QuestionView, Source,
};
use crate::domain::signing::ImageReferenceResolver;
use crate::domain::validation::{
    ensure_all_found, validate_single_correct_choice, validate_unique_choice_contents,
};

/// Map a repository failure on a write path to its domain kind.
///
/// Constraint violations keep their specific domain meaning; everything else
/// is a technical persistence failure.
pub(crate) fn map_write_error(error: QuestionRepositoryError) -> Error {
    match error {
        QuestionRepositoryError::DuplicateKey { message } => {
            Error::duplicate_value(format!("question already exists: {message}"))
        }
        QuestionRepositoryError::ForeignKey { message } => Error::foreign_key_violation(format!(
            "referenced id does not exist: {message}"
        )),
        QuestionRepositoryError::Connection { message }
        | QuestionRepositoryError::Query { message } => {
            Error::persistence(format!("failed to persist question data: {message}"))
        }
    }
}

/// Map a repository failure on a read path to its domain kind.
pub(crate) fn map_read_error(error: QuestionRepositoryError) -> Error {
    Error::retrieval(format!("failed to read question data: {error}"))
}

fn map_delete_error(error: QuestionRepositoryError) -> Error {
    Error::delete(format!("failed to delete question: {error}"))
}

pub(crate) fn map_area_error(error: AreaRepositoryError) -> Error {
    Error::retrieval(format!("failed to read areas: {error}"))
}

pub(crate) fn map_source_error(error: SourceRepositoryError) -> Error {
    Error::retrieval(format!("failed to read sources: {error}"))
}

/// Orchestrates the question aggregate write and read pipelines.
#[derive(Clone)]
pub struct QuestionService {
    repository: Arc<dyn QuestionRepository>,
    areas: Arc<dyn AreaRepository>,
    sources: Arc<dyn SourceRepository>,
    resolver: ImageReferenceResolver,
}

impl QuestionService {
    /// Compose the service from its collaborators.
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        areas: Arc<dyn AreaRepository>,
        sources: Arc<dyn SourceRepository>,
        resolver: ImageReferenceResolver,
    ) -> Self {
        Self {
            repository,
            areas,
            sources,
            resolver,
        }
    }

    /// Create a question aggregate.
    ///
    /// Pipeline: fingerprint the contents, resolve and validate area and
    /// source references, enforce the choice invariants, assemble the
    /// graph, persist atomically. The store's `question_hash` unique
    /// constraint remains the duplicate check of record.
    pub async fn create_question(&self, payload: NewQuestion) -> Result<Question, Error> {
        let question_hash = question_fingerprint(&payload.contents);

        let areas = self.load_areas(&payload.area_ids).await?;
        let source_ids = cited_source_ids(&payload);
        let sources = self.load_sources(&source_ids).await?;

        validate_single_correct_choice(&payload.choices)?;
        validate_unique_choice_contents(&payload.choices)?;

        let aggregate = assemble(payload, question_hash, areas, sources)?;

        self.repository
            .create_aggregate(&aggregate)
            .await
            .map_err(|err| {
                error!(error = %err, "question aggregate persist failed");
                map_write_error(err)
            })
    }

    /// Read one page of questions, resolving image references per the view.
    pub async fn list_questions(
        &self,
        request: PageRequest,
        view: QuestionView,
    ) -> Result<Page<Question>, Error> {
        let mut page = self
            .repository
            .get_page(request, view)
            .await
            .map_err(map_read_error)?;

        for question in &mut page.items {
            self.resolver.resolve_question(question, view).await?;
        }
        Ok(page)
    }

    /// Read one question by id, resolving image references per the view.
    pub async fn get_question(&self, id: i32, view: QuestionView) -> Result<Question, Error> {
        let mut question = self
            .repository
            .get_by_id(id, view)
            .await
            .map_err(map_read_error)?
            .ok_or_else(|| Error::resource_not_found(format!("question {id} not found")))?;

        self.resolver.resolve_question(&mut question, view).await?;
        Ok(question)
    }

    /// Delete a question and all owned children.
    pub async fn delete_question(&self, id: i32) -> Result<(), Error> {
        let deleted = self.repository.delete(id).await.map_err(|err| {
            error!(question_id = id, error = %err, "question delete failed");
            map_delete_error(err)
        })?;

        if !deleted {
            return Err(Error::resource_not_found(format!(
                "question {id} not found"
            )));
        }
        Ok(())
    }

    /// Point the question at a different question type.
    pub async fn update_question_type(&self, id: i32, question_type_id: i32) -> Result<(), Error> {
        self.update_fields_guarded(
            id,
            QuestionFieldUpdate {
                question_type_id: Some(question_type_id),
                ..QuestionFieldUpdate::default()
            },
        )
        .await
    }

    /// Point the question at a different subtopic.
    pub async fn update_subtopic(&self, id: i32, subtopic_id: i32) -> Result<(), Error> {
        self.update_fields_guarded(
            id,
            QuestionFieldUpdate {
                subtopic_id: Some(subtopic_id),
                ..QuestionFieldUpdate::default()
            },
        )
        .await
    }

    /// Point the question at a different difficulty.
    pub async fn update_difficulty(&self, id: i32, difficulty_id: i32) -> Result<(), Error> {
        self.update_fields_guarded(
            id,
            QuestionFieldUpdate {
                difficulty_id: Some(difficulty_id),
                ..QuestionFieldUpdate::default()
            },
        )
        .await
    }

    /// Replace the question's area association set. All requested areas must
    /// exist; partial matches are rejected as a set.
    pub async fn update_areas(&self, id: i32, area_ids: Vec<i32>) -> Result<(), Error> {
        if area_ids.is_empty() {
            return Err(Error::invalid_request(
                "a question must keep at least one area",
            ));
        }
        let exists = self.repository.exists(id).await.map_err(map_read_error)?;
        if !exists {
            return Err(Error::resource_not_found(format!(
                "question {id} not found"
            )));
        }
        let _resolved = self.load_areas(&area_ids).await?;
        self.update_fields_guarded(
            id,
            QuestionFieldUpdate {
                area_ids: Some(area_ids),
                ..QuestionFieldUpdate::default()
            },
        )
        .await
    }

    /// Fetch-or-fail, delegate the targeted update, and treat a vanished row
    /// as not-found — the question may be deleted concurrently between the
    /// two steps.
    async fn update_fields_guarded(
        &self,
        id: i32,
        update: QuestionFieldUpdate,
    ) -> Result<(), Error> {
        let exists = self.repository.exists(id).await.map_err(map_read_error)?;
        if !exists {
            return Err(Error::resource_not_found(format!(
                "question {id} not found"
            )));
        }

        let found = self
            .repository
            .update_fields(id, update)
            .await
            .map_err(|err| {
                error!(question_id = id, error = %err, "question field update failed");
                map_write_error(err)
            })?;

        if !found {
            return Err(Error::resource_not_found(format!(
                "question {id} not found"
            )));
        }
        Ok(())
    }

    async fn load_areas(&self, area_ids: &[i32]) -> Result<Vec<Area>, Error> {
        if area_ids.is_empty() {
            return Ok(Vec::new());
        }
        let areas = self
            .areas
            .find_by_ids(area_ids)
            .await
            .map_err(map_area_error)?;
        ensure_all_found(area_ids, areas.iter().map(|area| area.id), "area")?;
        Ok(areas)
    }

    async fn load_sources(&self, source_ids: &[i32]) -> Result<Vec<Source>, Error> {
        if source_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sources = self
            .sources
            .find_by_ids(source_ids)
            .await
            .map_err(map_source_error)?;
        ensure_all_found(source_ids, sources.iter().map(|source| source.id), "source")?;
        Ok(sources)
    }
}

fn cited_source_ids(payload: &NewQuestion) -> Vec<i32> {
    let mut ids: Vec<i32> = payload
        .citations
        .iter()
        .map(|citation| citation.source_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::content::{ContentDraft, ContentKind};
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{
        FixtureAreaRepository, FixtureQuestionRepository, FixtureSourceRepository,
        MemoryObjectStorage, MockQuestionRepository,
    };
    use crate::domain::question::{ChoiceDraft, CitationDraft, SolutionDraft};

    fn text(value: &str, order: i32) -> ContentDraft {
        ContentDraft {
            kind: ContentKind::Text,
            value: value.to_owned(),
            order,
            label: None,
        }
    }

    fn payload() -> NewQuestion {
        NewQuestion {
            question_type_id: 1,
            subtopic_id: 2,
            difficulty_id: 3,
            area_ids: vec![1],
            contents: vec![text("2+2=?", 1)],
            choices: vec![
                ChoiceDraft {
                    label: "A".to_owned(),
                    is_correct: true,
                    contents: vec![text("4", 1)],
                },
                ChoiceDraft {
                    label: "B".to_owned(),
                    is_correct: false,
                    contents: vec![text("5", 1)],
                },
            ],
            solutions: vec![SolutionDraft {
                contents: vec![text("count it", 1)],
            }],
            citations: vec![CitationDraft {
                source_id: 7,
                page: 23,
            }],
        }
    }

    fn service_with(repository: Arc<dyn QuestionRepository>) -> QuestionService {
        let areas = FixtureAreaRepository::with_areas(vec![Area {
            id: 1,
            code: "A".to_owned(),
            name: "Area A".to_owned(),
        }]);
        let sources = FixtureSourceRepository::with_sources(vec![Source {
            id: 7,
            name: "Decenal".to_owned(),
            year: 2019,
            institution_id: 1,
        }]);
        QuestionService::new(
            repository,
            Arc::new(areas),
            Arc::new(sources),
            ImageReferenceResolver::new(Arc::new(MemoryObjectStorage::new()), "exams"),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn creation_validates_references_before_touching_the_store() {
        let mut repository = MockQuestionRepository::new();
        repository.expect_create_aggregate().never();
        let service = service_with(Arc::new(repository));

        let mut bad = payload();
        bad.area_ids = vec![1, 999];
        let err = service.create_question(bad).await.expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
        assert!(err.message().contains("{999}"));
    }

    #[rstest]
    #[tokio::test]
    async fn creation_validates_invariants_before_touching_the_store() {
        let mut repository = MockQuestionRepository::new();
        repository.expect_create_aggregate().never();
        let service = service_with(Arc::new(repository));

        let mut bad = payload();
        for choice in &mut bad.choices {
            choice.is_correct = true;
        }
        let err = service.create_question(bad).await.expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::MultipleCorrectChoices);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_key_from_the_store_maps_to_duplicate_value() {
        let mut repository = MockQuestionRepository::new();
        repository.expect_create_aggregate().returning(|_| {
            Err(QuestionRepositoryError::duplicate_key(
                "questions_question_hash_key",
            ))
        });
        let service = service_with(Arc::new(repository));

        let err = service
            .create_question(payload())
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::DuplicateValue);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_question_read_short_circuits_before_signing() {
        let service = service_with(Arc::new(FixtureQuestionRepository));
        let err = service
            .get_question(42, QuestionView::Full)
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_of_missing_question_is_not_found() {
        let service = service_with(Arc::new(FixtureQuestionRepository));
        let err = service.delete_question(42).await.expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn area_update_rejects_missing_area_before_writing() {
        let mut repository = MockQuestionRepository::new();
        repository.expect_exists().returning(|_| Ok(true));
        repository.expect_update_fields().never();
        let service = service_with(Arc::new(repository));

        let err = service
            .update_areas(1, vec![999])
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_delete_during_field_update_is_not_found() {
        let mut repository = MockQuestionRepository::new();
        repository.expect_exists().returning(|_| Ok(true));
        repository.expect_update_fields().returning(|_, _| Ok(false));
        let service = service_with(Arc::new(repository));

        let err = service
            .update_difficulty(1, 5)
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_on_write_surface_as_persistence_errors() {
        let mut repository = MockQuestionRepository::new();
        repository.expect_exists().returning(|_| Ok(true));
        repository
            .expect_update_fields()
            .returning(|_, _| Err(QuestionRepositoryError::query("deadlock detected")));
        let service = service_with(Arc::new(repository));

        let err = service
            .update_question_type(1, 2)
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::PersistenceError);
    }
}
