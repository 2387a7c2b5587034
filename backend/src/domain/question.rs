//! The question aggregate and its owned sub-entities.
//!
//! A question owns its contents, choices, solutions, and source citations;
//! deleting the question removes all of them. Areas and sources are
//! independently owned reference data the aggregate only points at.

use crate::domain::content::{Content, ContentDraft};

/// How much of the aggregate a read should materialise.
///
/// The summary view omits the choice and solution sub-collections (and so
/// skips signing their image contents); the full view loads everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionView {
    /// Root fields, contents, areas, and citations only.
    Summary,
    /// Everything, including choices and solutions.
    #[default]
    Full,
}

impl QuestionView {
    /// Parse the query-string representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "summary" => Some(Self::Summary),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// A persisted multiple-choice alternative with its ordered contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Row identity.
    pub id: i32,
    /// Single-letter display label.
    pub label: String,
    /// Whether this alternative answers the question.
    pub is_correct: bool,
    /// Ordered content blocks.
    pub contents: Vec<Content>,
}

/// A persisted worked solution with its ordered contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Row identity.
    pub id: i32,
    /// Ordered content blocks.
    pub contents: Vec<Content>,
}

/// Reference data: an exam source tied to an institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Row identity.
    pub id: i32,
    /// Source name (e.g. an exam booklet title).
    pub name: String,
    /// Publication year.
    pub year: i32,
    /// Owning institution id.
    pub institution_id: i32,
}

/// A citation linking the question to a page of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCitation {
    /// Row identity.
    pub id: i32,
    /// Cited page, positive.
    pub page: i32,
    /// The cited source.
    pub source: Source,
}

/// Reference data: a curricular area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    /// Row identity.
    pub id: i32,
    /// Short area code.
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

/// The question aggregate root as read from the store.
///
/// Under [`QuestionView::Summary`] the `choices` and `solutions` collections
/// are left empty rather than loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Row identity.
    pub id: i32,
    /// SHA-256 fingerprint of the textual stem; unique across questions.
    pub question_hash: String,
    /// Taxonomy reference: question type.
    pub question_type_id: i32,
    /// Taxonomy reference: subtopic.
    pub subtopic_id: i32,
    /// Taxonomy reference: difficulty.
    pub difficulty_id: i32,
    /// Ordered statement content blocks.
    pub contents: Vec<Content>,
    /// Alternatives; empty under the summary view.
    pub choices: Vec<Choice>,
    /// Worked solutions; empty under the summary view.
    pub solutions: Vec<Solution>,
    /// Source citations.
    pub citations: Vec<SourceCitation>,
    /// Associated areas.
    pub areas: Vec<Area>,
}

/// A choice as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDraft {
    /// Single-letter display label.
    pub label: String,
    /// Whether this alternative answers the question.
    pub is_correct: bool,
    /// Ordered content blocks.
    pub contents: Vec<ContentDraft>,
}

/// A solution as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionDraft {
    /// Ordered content blocks.
    pub contents: Vec<ContentDraft>,
}

/// A source citation as submitted by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationDraft {
    /// Cited source id; validated to exist before persist.
    pub source_id: i32,
    /// Cited page, positive.
    pub page: i32,
}

/// The full creation payload after inbound validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    /// Taxonomy reference: question type.
    pub question_type_id: i32,
    /// Taxonomy reference: subtopic.
    pub subtopic_id: i32,
    /// Taxonomy reference: difficulty.
    pub difficulty_id: i32,
    /// Associated area ids; all must exist.
    pub area_ids: Vec<i32>,
    /// Ordered statement content blocks.
    pub contents: Vec<ContentDraft>,
    /// Alternatives; exactly one must be correct.
    pub choices: Vec<ChoiceDraft>,
    /// Worked solutions.
    pub solutions: Vec<SolutionDraft>,
    /// Source citations; all source ids must exist.
    pub citations: Vec<CitationDraft>,
}

/// Targeted root-field update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFieldUpdate {
    /// New question type id, if changing.
    pub question_type_id: Option<i32>,
    /// New subtopic id, if changing.
    pub subtopic_id: Option<i32>,
    /// New difficulty id, if changing.
    pub difficulty_id: Option<i32>,
    /// Replacement area association set, if changing.
    pub area_ids: Option<Vec<i32>>,
}

impl QuestionFieldUpdate {
    /// Whether the update carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.question_type_id.is_none()
            && self.subtopic_id.is_none()
            && self.difficulty_id.is_none()
            && self.area_ids.is_none()
    }
}

/// Partial update of one content block; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentUpdate {
    /// New block kind, if changing.
    pub kind: Option<crate::domain::content::ContentKind>,
    /// New value, if changing.
    pub value: Option<String>,
    /// New order, if changing.
    pub order: Option<i32>,
    /// New label, if changing.
    pub label: Option<String>,
}

/// Partial update of one choice; a `Some` contents list replaces the
/// choice's content collection wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceUpdate {
    /// New display label, if changing.
    pub label: Option<String>,
    /// New correctness flag, if changing.
    pub is_correct: Option<bool>,
    /// Replacement content list, if changing.
    pub contents: Option<Vec<ContentDraft>>,
}

/// Partial update of one source citation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CitationUpdate {
    /// New source id, if changing; validated to exist first.
    pub source_id: Option<i32>,
    /// New page, if changing.
    pub page: Option<i32>,
}
