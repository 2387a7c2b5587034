//! Section-scoped partial updates on a question's owned sub-entities.
//!
//! Every service here guards on question existence first, validates the
//! section-specific invariants, and delegates a single transactional write.
//! Image contents in the returned sub-resource are signed before projection.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::error;

use crate::domain::content::{Content, ContentDraft, normalize_text};
use crate::domain::error::Error;
use crate::domain::hash::question_fingerprint;
use crate::domain::ports::{QuestionRepository, SourceRepository};
use crate::domain::question::{Choice, ChoiceUpdate, CitationUpdate, ContentUpdate, Solution};
use crate::domain::question_service::{
    map_read_error, map_source_error, map_write_error,
};
use crate::domain::signing::ImageReferenceResolver;
use crate::domain::validation::{
    ensure_all_found, validate_choice_contents_against_siblings,
    validate_remaining_correct_choice, validate_strict_ordering,
};

/// Existence guard shared by the section services.
#[derive(Clone)]
pub struct QuestionGuard {
    repository: Arc<dyn QuestionRepository>,
}

impl QuestionGuard {
    /// Create a guard over the question repository.
    pub fn new(repository: Arc<dyn QuestionRepository>) -> Self {
        Self { repository }
    }

    /// Fail with `resource_not_found` before any section work when the
    /// question is absent.
    pub async fn ensure_exists(&self, question_id: i32) -> Result<(), Error> {
        let exists = self
            .repository
            .exists(question_id)
            .await
            .map_err(map_read_error)?;
        if !exists {
            return Err(Error::resource_not_found(format!(
                "question {question_id} not found"
            )));
        }
        Ok(())
    }
}

/// Partial updates of statement content blocks.
#[derive(Clone)]
pub struct ContentSectionService {
    repository: Arc<dyn QuestionRepository>,
    guard: QuestionGuard,
    resolver: ImageReferenceResolver,
}

impl ContentSectionService {
    /// Compose the service from its collaborators.
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        guard: QuestionGuard,
        resolver: ImageReferenceResolver,
    ) -> Self {
        Self {
            repository,
            guard,
            resolver,
        }
    }

    /// Apply a partial update to one content block.
    ///
    /// The question fingerprint depends on the content list, so it is
    /// recomputed over the post-update list and persisted in the same
    /// transaction as the block itself.
    pub async fn update_content(
        &self,
        question_id: i32,
        content_id: i32,
        update: ContentUpdate,
    ) -> Result<Content, Error> {
        self.guard.ensure_exists(question_id).await?;

        let existing = self
            .repository
            .find_content(question_id, content_id)
            .await
            .map_err(map_read_error)?;
        if existing.is_none() {
            return Err(Error::resource_not_found(format!(
                "content {content_id} not found in question {question_id}"
            )));
        }

        let mut contents = self
            .repository
            .list_contents(question_id)
            .await
            .map_err(map_read_error)?;
        for content in &mut contents {
            if content.id != content_id {
                continue;
            }
            if let Some(kind) = update.kind {
                content.kind = kind;
            }
            if let Some(value) = &update.value {
                content.value = value.clone();
            }
            if let Some(order) = update.order {
                content.order = order;
            }
            if let Some(label) = &update.label {
                content.label = Some(label.clone());
            }
            break;
        }

        let question_hash = question_fingerprint(&contents);

        let mut updated = self
            .repository
            .update_content(question_id, content_id, update, &question_hash)
            .await
            .map_err(|err| {
                error!(question_id, content_id, error = %err, "content update failed");
                map_write_error(err)
            })?;

        self.resolver
            .resolve_contents(std::slice::from_mut(&mut updated))
            .await?;
        Ok(updated)
    }
}

/// Partial updates of choices, preserving the correctness invariants.
#[derive(Clone)]
pub struct ChoiceSectionService {
    repository: Arc<dyn QuestionRepository>,
    guard: QuestionGuard,
    resolver: ImageReferenceResolver,
}

impl ChoiceSectionService {
    /// Compose the service from its collaborators.
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        guard: QuestionGuard,
        resolver: ImageReferenceResolver,
    ) -> Self {
        Self {
            repository,
            guard,
            resolver,
        }
    }

    /// Apply a partial update to one choice.
    ///
    /// Demoting the question's last correct choice is rejected; marking a
    /// choice correct demotes all siblings in the same transaction. The
    /// correctness check is read-then-write within that transaction's
    /// request, with no row lock: two simultaneous updates of the same
    /// question's choices can race (a known, documented limitation).
    pub async fn update_choice(
        &self,
        question_id: i32,
        choice_id: i32,
        update: ChoiceUpdate,
    ) -> Result<Choice, Error> {
        self.guard.ensure_exists(question_id).await?;

        let existing = self
            .repository
            .find_choice(question_id, choice_id)
            .await
            .map_err(map_read_error)?
            .ok_or_else(|| {
                Error::resource_not_found(format!(
                    "choice {choice_id} not found in question {question_id}"
                ))
            })?;

        if let Some(contents) = &update.contents {
            validate_strict_ordering(contents, "choice contents")?;
            let sibling_values = self
                .repository
                .choice_text_values_excluding(question_id, choice_id)
                .await
                .map_err(map_read_error)?;
            let normalised: HashSet<String> = sibling_values
                .iter()
                .map(|value| normalize_text(value))
                .collect();
            validate_choice_contents_against_siblings(contents, &normalised)?;
        }

        if update.is_correct == Some(false) && existing.is_correct {
            let remaining = self
                .repository
                .correct_choices_excluding(question_id, choice_id)
                .await
                .map_err(map_read_error)?;
            validate_remaining_correct_choice(remaining)?;
        }

        let demote_others = update.is_correct == Some(true);
        let mut updated = self
            .repository
            .update_choice(question_id, choice_id, update, demote_others)
            .await
            .map_err(|err| {
                error!(question_id, choice_id, error = %err, "choice update failed");
                map_write_error(err)
            })?;

        self.resolver.resolve_contents(&mut updated.contents).await?;
        Ok(updated)
    }
}

/// Wholesale replacement of a solution's content list.
#[derive(Clone)]
pub struct SolutionSectionService {
    repository: Arc<dyn QuestionRepository>,
    guard: QuestionGuard,
    resolver: ImageReferenceResolver,
}

impl SolutionSectionService {
    /// Compose the service from its collaborators.
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        guard: QuestionGuard,
        resolver: ImageReferenceResolver,
    ) -> Self {
        Self {
            repository,
            guard,
            resolver,
        }
    }

    /// Replace the solution's contents wholesale and return the result with
    /// image references signed.
    pub async fn update_solution(
        &self,
        question_id: i32,
        solution_id: i32,
        contents: Vec<ContentDraft>,
    ) -> Result<Solution, Error> {
        self.guard.ensure_exists(question_id).await?;

        if contents.is_empty() {
            return Err(Error::invalid_request(
                "a solution needs at least one content block",
            ));
        }
        validate_strict_ordering(&contents, "solution contents")?;

        let existing = self
            .repository
            .find_solution(question_id, solution_id)
            .await
            .map_err(map_read_error)?;
        if existing.is_none() {
            return Err(Error::resource_not_found(format!(
                "solution {solution_id} not found in question {question_id}"
            )));
        }

        let mut updated = self
            .repository
            .replace_solution_contents(question_id, solution_id, &contents)
            .await
            .map_err(|err| {
                error!(question_id, solution_id, error = %err, "solution update failed");
                map_write_error(err)
            })?;

        self.resolver.resolve_contents(&mut updated.contents).await?;
        Ok(updated)
    }
}

/// Partial updates of source citations.
#[derive(Clone)]
pub struct CitationSectionService {
    repository: Arc<dyn QuestionRepository>,
    sources: Arc<dyn SourceRepository>,
    guard: QuestionGuard,
}

impl CitationSectionService {
    /// Compose the service from its collaborators.
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        sources: Arc<dyn SourceRepository>,
        guard: QuestionGuard,
    ) -> Self {
        Self {
            repository,
            sources,
            guard,
        }
    }

    /// Apply a partial update to one citation. A new source id must name an
    /// existing source.
    pub async fn update_citation(
        &self,
        question_id: i32,
        citation_id: i32,
        update: CitationUpdate,
    ) -> Result<(), Error> {
        self.guard.ensure_exists(question_id).await?;

        let existing = self
            .repository
            .find_citation(question_id, citation_id)
            .await
            .map_err(map_read_error)?;
        if existing.is_none() {
            return Err(Error::resource_not_found(format!(
                "citation {citation_id} not found in question {question_id}"
            )));
        }

        if let Some(page) = update.page
            && page < 1
        {
            return Err(Error::invalid_request("page must be positive"));
        }

        if let Some(source_id) = update.source_id {
            let found = self
                .sources
                .find_by_ids(&[source_id])
                .await
                .map_err(map_source_error)?;
            ensure_all_found(
                &[source_id],
                found.iter().map(|source| source.id),
                "source",
            )?;
        }

        self.repository
            .update_citation(question_id, citation_id, update)
            .await
            .map_err(|err| {
                error!(question_id, citation_id, error = %err, "citation update failed");
                map_write_error(err)
            })
    }
}
