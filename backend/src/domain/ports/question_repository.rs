//! Port for question aggregate persistence.
//!
//! This is the unit-of-work boundary: every mutating operation executes in
//! one store transaction, and a failure rolls the whole write back before
//! the error surfaces. Sub-collection writes replace wholesale, never diff.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::assembler::QuestionAggregate;
use crate::domain::content::{Content, ContentDraft};
use crate::domain::question::{
    Choice, ChoiceUpdate, CitationUpdate, ContentUpdate, Question, QuestionFieldUpdate,
    QuestionView, Solution, SourceCitation,
};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by question repository adapters.
    ///
    /// Unique and foreign-key constraint violations are distinguished from
    /// generic failures so the service can re-map them to the duplicate /
    /// dangling-reference domain kinds instead of a technical error.
    pub enum QuestionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "question repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "question repository query failed: {message}",
        /// A unique constraint rejected the write.
        DuplicateKey { message: String } =>
            "duplicate key: {message}",
        /// A foreign-key constraint rejected the write.
        ForeignKey { message: String } =>
            "foreign key violation: {message}",
    }
}

/// Port for aggregate writes, eager-loaded reads, and section updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist a fully assembled aggregate in one transaction and return it
    /// as stored. The `question_hash` unique constraint is the duplicate
    /// check of record; collisions surface as
    /// [`QuestionRepositoryError::DuplicateKey`].
    async fn create_aggregate(
        &self,
        aggregate: &QuestionAggregate,
    ) -> Result<Question, QuestionRepositoryError>;

    /// Read one page ordered by id. Under the summary view the choice and
    /// solution collections are not loaded. The collection total may come
    /// from the count cache.
    async fn get_page(
        &self,
        request: PageRequest,
        view: QuestionView,
    ) -> Result<Page<Question>, QuestionRepositoryError>;

    /// Read one aggregate by id, or `None` when absent.
    async fn get_by_id(
        &self,
        id: i32,
        view: QuestionView,
    ) -> Result<Option<Question>, QuestionRepositoryError>;

    /// Cheap existence probe used by the section-update guard.
    async fn exists(&self, id: i32) -> Result<bool, QuestionRepositoryError>;

    /// Apply a targeted root-field update; replaces the area association set
    /// when given. Returns `false` when the question does not exist.
    async fn update_fields(
        &self,
        id: i32,
        update: QuestionFieldUpdate,
    ) -> Result<bool, QuestionRepositoryError>;

    /// Delete the aggregate and all owned children. Returns `false` when the
    /// question does not exist. Referenced areas and sources are untouched.
    async fn delete(&self, id: i32) -> Result<bool, QuestionRepositoryError>;

    /// Read one statement content block of a question.
    async fn find_content(
        &self,
        question_id: i32,
        content_id: i32,
    ) -> Result<Option<Content>, QuestionRepositoryError>;

    /// Read all statement content blocks of a question, ordered.
    async fn list_contents(&self, question_id: i32)
    -> Result<Vec<Content>, QuestionRepositoryError>;

    /// Apply a partial content update together with the recomputed question
    /// hash, in one transaction.
    async fn update_content(
        &self,
        question_id: i32,
        content_id: i32,
        update: ContentUpdate,
        question_hash: &str,
    ) -> Result<Content, QuestionRepositoryError>;

    /// Read one choice of a question with its contents.
    async fn find_choice(
        &self,
        question_id: i32,
        choice_id: i32,
    ) -> Result<Option<Choice>, QuestionRepositoryError>;

    /// Count correct choices of a question, excluding one choice.
    async fn correct_choices_excluding(
        &self,
        question_id: i32,
        exclude_choice_id: i32,
    ) -> Result<i64, QuestionRepositoryError>;

    /// Raw text values of all content blocks of the question's other
    /// choices, for the uniqueness check.
    async fn choice_text_values_excluding(
        &self,
        question_id: i32,
        exclude_choice_id: i32,
    ) -> Result<Vec<String>, QuestionRepositoryError>;

    /// Apply a partial choice update in one transaction. A `Some` contents
    /// list replaces the choice's content collection wholesale; with
    /// `demote_others` every sibling is flipped incorrect first.
    async fn update_choice(
        &self,
        question_id: i32,
        choice_id: i32,
        update: ChoiceUpdate,
        demote_others: bool,
    ) -> Result<Choice, QuestionRepositoryError>;

    /// Read one solution of a question with its contents.
    async fn find_solution(
        &self,
        question_id: i32,
        solution_id: i32,
    ) -> Result<Option<Solution>, QuestionRepositoryError>;

    /// Replace a solution's content collection wholesale, in one
    /// transaction.
    async fn replace_solution_contents(
        &self,
        question_id: i32,
        solution_id: i32,
        contents: &[ContentDraft],
    ) -> Result<Solution, QuestionRepositoryError>;

    /// Read one source citation of a question.
    async fn find_citation(
        &self,
        question_id: i32,
        citation_id: i32,
    ) -> Result<Option<SourceCitation>, QuestionRepositoryError>;

    /// Apply a partial citation update.
    async fn update_citation(
        &self,
        question_id: i32,
        citation_id: i32,
        update: CitationUpdate,
    ) -> Result<(), QuestionRepositoryError>;
}

/// Fixture implementation for boots without a database.
///
/// Reads come back empty and writes succeed without storing anything; the
/// created aggregate is echoed back with zeroed ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureQuestionRepository;

#[async_trait]
impl QuestionRepository for FixtureQuestionRepository {
    async fn create_aggregate(
        &self,
        aggregate: &QuestionAggregate,
    ) -> Result<Question, QuestionRepositoryError> {
        Ok(echo_aggregate(aggregate))
    }

    async fn get_page(
        &self,
        request: PageRequest,
        _view: QuestionView,
    ) -> Result<Page<Question>, QuestionRepositoryError> {
        Ok(Page::new(Vec::new(), 0, request))
    }

    async fn get_by_id(
        &self,
        _id: i32,
        _view: QuestionView,
    ) -> Result<Option<Question>, QuestionRepositoryError> {
        Ok(None)
    }

    async fn exists(&self, _id: i32) -> Result<bool, QuestionRepositoryError> {
        Ok(false)
    }

    async fn update_fields(
        &self,
        _id: i32,
        _update: QuestionFieldUpdate,
    ) -> Result<bool, QuestionRepositoryError> {
        Ok(false)
    }

    async fn delete(&self, _id: i32) -> Result<bool, QuestionRepositoryError> {
        Ok(false)
    }

    async fn find_content(
        &self,
        _question_id: i32,
        _content_id: i32,
    ) -> Result<Option<Content>, QuestionRepositoryError> {
        Ok(None)
    }

    async fn list_contents(
        &self,
        _question_id: i32,
    ) -> Result<Vec<Content>, QuestionRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_content(
        &self,
        _question_id: i32,
        content_id: i32,
        _update: ContentUpdate,
        _question_hash: &str,
    ) -> Result<Content, QuestionRepositoryError> {
        Err(QuestionRepositoryError::query(format!(
            "fixture repository holds no content {content_id}"
        )))
    }

    async fn find_choice(
        &self,
        _question_id: i32,
        _choice_id: i32,
    ) -> Result<Option<Choice>, QuestionRepositoryError> {
        Ok(None)
    }

    async fn correct_choices_excluding(
        &self,
        _question_id: i32,
        _exclude_choice_id: i32,
    ) -> Result<i64, QuestionRepositoryError> {
        Ok(0)
    }

    async fn choice_text_values_excluding(
        &self,
        _question_id: i32,
        _exclude_choice_id: i32,
    ) -> Result<Vec<String>, QuestionRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_choice(
        &self,
        _question_id: i32,
        choice_id: i32,
        _update: ChoiceUpdate,
        _demote_others: bool,
    ) -> Result<Choice, QuestionRepositoryError> {
        Err(QuestionRepositoryError::query(format!(
            "fixture repository holds no choice {choice_id}"
        )))
    }

    async fn find_solution(
        &self,
        _question_id: i32,
        _solution_id: i32,
    ) -> Result<Option<Solution>, QuestionRepositoryError> {
        Ok(None)
    }

    async fn replace_solution_contents(
        &self,
        _question_id: i32,
        solution_id: i32,
        _contents: &[ContentDraft],
    ) -> Result<Solution, QuestionRepositoryError> {
        Err(QuestionRepositoryError::query(format!(
            "fixture repository holds no solution {solution_id}"
        )))
    }

    async fn find_citation(
        &self,
        _question_id: i32,
        _citation_id: i32,
    ) -> Result<Option<SourceCitation>, QuestionRepositoryError> {
        Ok(None)
    }

    async fn update_citation(
        &self,
        _question_id: i32,
        citation_id: i32,
        _update: CitationUpdate,
    ) -> Result<(), QuestionRepositoryError> {
        Err(QuestionRepositoryError::query(format!(
            "fixture repository holds no citation {citation_id}"
        )))
    }
}

fn echo_aggregate(aggregate: &QuestionAggregate) -> Question {
    let materialise = |drafts: &[ContentDraft]| {
        drafts
            .iter()
            .map(|draft| Content {
                id: 0,
                kind: draft.kind,
                value: draft.value.clone(),
                order: draft.order,
                label: draft.label.clone(),
            })
            .collect::<Vec<_>>()
    };

    Question {
        id: 0,
        question_hash: aggregate.question_hash.clone(),
        question_type_id: aggregate.question_type_id,
        subtopic_id: aggregate.subtopic_id,
        difficulty_id: aggregate.difficulty_id,
        contents: materialise(&aggregate.contents),
        choices: aggregate
            .choices
            .iter()
            .map(|choice| Choice {
                id: 0,
                label: choice.label.clone(),
                is_correct: choice.is_correct,
                contents: materialise(&choice.contents),
            })
            .collect(),
        solutions: aggregate
            .solutions
            .iter()
            .map(|solution| Solution {
                id: 0,
                contents: materialise(&solution.contents),
            })
            .collect(),
        citations: aggregate
            .citations
            .iter()
            .filter_map(|citation| {
                aggregate
                    .sources
                    .iter()
                    .find(|source| source.id == citation.source_id)
                    .map(|source| SourceCitation {
                        id: 0,
                        page: citation.page,
                        source: source.clone(),
                    })
            })
            .collect(),
        areas: aggregate.areas.clone(),
    }
}
