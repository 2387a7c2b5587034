//! Aggregate assembly for question creation.
//!
//! The assembler turns a validated payload plus resolved reference entities
//! into the object graph handed to the repository in one persist call. It
//! performs no I/O; the only failures are structural (an ordered collection
//! whose `order` values do not form a strict ordering).

use crate::domain::content::ContentDraft;
use crate::domain::error::Error;
use crate::domain::question::{Area, ChoiceDraft, CitationDraft, NewQuestion, SolutionDraft, Source};
use crate::domain::validation::validate_strict_ordering;

/// The fully assembled in-memory aggregate, ready for a single persist call.
///
/// Collections keep the caller's submission order; the repository persists
/// them as given and readers re-sort by each block's `order` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAggregate {
    /// Content fingerprint, unique across questions.
    pub question_hash: String,
    /// Taxonomy reference: question type.
    pub question_type_id: i32,
    /// Taxonomy reference: subtopic.
    pub subtopic_id: i32,
    /// Taxonomy reference: difficulty.
    pub difficulty_id: i32,
    /// Ordered statement content blocks.
    pub contents: Vec<ContentDraft>,
    /// Alternatives with their content blocks.
    pub choices: Vec<ChoiceDraft>,
    /// Worked solutions with their content blocks.
    pub solutions: Vec<SolutionDraft>,
    /// Source citations.
    pub citations: Vec<CitationDraft>,
    /// Resolved area entities to associate.
    pub areas: Vec<Area>,
    /// Resolved source entities backing the citations.
    pub sources: Vec<Source>,
}

/// Build the aggregate from a validated payload and resolved references.
///
/// `areas` and `sources` must already be confirmed to cover every id the
/// payload names (the reference validator guarantees this before assembly).
pub fn assemble(
    payload: NewQuestion,
    question_hash: String,
    areas: Vec<Area>,
    sources: Vec<Source>,
) -> Result<QuestionAggregate, Error> {
    validate_strict_ordering(&payload.contents, "question contents")?;
    for choice in &payload.choices {
        validate_strict_ordering(&choice.contents, "choice contents")?;
    }
    for solution in &payload.solutions {
        validate_strict_ordering(&solution.contents, "solution contents")?;
    }

    let NewQuestion {
        question_type_id,
        subtopic_id,
        difficulty_id,
        area_ids: _,
        contents,
        choices,
        solutions,
        citations,
    } = payload;

    Ok(QuestionAggregate {
        question_hash,
        question_type_id,
        subtopic_id,
        difficulty_id,
        contents,
        choices,
        solutions,
        citations,
        areas,
        sources,
    })
}
