//! Row structs mapping the Diesel schema to the domain model.

use diesel::prelude::*;

use crate::domain::content::{Content, ContentKind};
use crate::domain::question::{Area, Source};

use super::schema::{
    areas, choice_contents, choices, question_areas, question_contents, question_sources,
    questions, solution_contents, solutions, sources,
};

/// Question root row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = questions, check_for_backend(diesel::pg::Pg))]
pub struct QuestionRow {
    /// Primary key.
    pub id: i32,
    /// Content fingerprint.
    pub question_hash: String,
    /// Taxonomy reference.
    pub question_type_id: i32,
    /// Taxonomy reference.
    pub subtopic_id: i32,
    /// Taxonomy reference.
    pub difficulty_id: i32,
}

/// Insertable question root row.
#[derive(Debug, Insertable)]
#[diesel(table_name = questions)]
pub struct NewQuestionRow<'a> {
    /// Content fingerprint.
    pub question_hash: &'a str,
    /// Taxonomy reference.
    pub question_type_id: i32,
    /// Taxonomy reference.
    pub subtopic_id: i32,
    /// Taxonomy reference.
    pub difficulty_id: i32,
}

/// Targeted root-field changeset; `None` columns stay untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = questions)]
pub struct QuestionChanges {
    /// New question type, if changing.
    pub question_type_id: Option<i32>,
    /// New subtopic, if changing.
    pub subtopic_id: Option<i32>,
    /// New difficulty, if changing.
    pub difficulty_id: Option<i32>,
}

/// Statement content block row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = question_contents, check_for_backend(diesel::pg::Pg))]
pub struct QuestionContentRow {
    /// Primary key.
    pub id: i32,
    /// Owning question.
    pub question_id: i32,
    /// Stored kind discriminant.
    pub kind: String,
    /// Text body or object key.
    pub value: String,
    /// Display and hashing order.
    pub position: i32,
    /// Optional display label.
    pub label: Option<String>,
}

/// Insertable statement content block row.
#[derive(Debug, Insertable)]
#[diesel(table_name = question_contents)]
pub struct NewQuestionContentRow<'a> {
    /// Owning question.
    pub question_id: i32,
    /// Stored kind discriminant.
    pub kind: &'a str,
    /// Text body or object key.
    pub value: &'a str,
    /// Display and hashing order.
    pub position: i32,
    /// Optional display label.
    pub label: Option<&'a str>,
}

/// Partial content changeset; `None` columns stay untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = question_contents)]
pub struct ContentChanges<'a> {
    /// New kind discriminant, if changing.
    pub kind: Option<&'a str>,
    /// New value, if changing.
    pub value: Option<&'a str>,
    /// New order, if changing.
    pub position: Option<i32>,
    /// New label, if changing.
    pub label: Option<&'a str>,
}

/// Choice row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = choices, check_for_backend(diesel::pg::Pg))]
pub struct ChoiceRow {
    /// Primary key.
    pub id: i32,
    /// Owning question.
    pub question_id: i32,
    /// Single-letter display label.
    pub label: String,
    /// Correctness flag.
    pub is_correct: bool,
}

/// Insertable choice row.
#[derive(Debug, Insertable)]
#[diesel(table_name = choices)]
pub struct NewChoiceRow<'a> {
    /// Owning question.
    pub question_id: i32,
    /// Single-letter display label.
    pub label: &'a str,
    /// Correctness flag.
    pub is_correct: bool,
}

/// Partial choice changeset; `None` columns stay untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = choices)]
pub struct ChoiceChanges<'a> {
    /// New label, if changing.
    pub label: Option<&'a str>,
    /// New correctness flag, if changing.
    pub is_correct: Option<bool>,
}

/// Choice content block row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = choice_contents, check_for_backend(diesel::pg::Pg))]
pub struct ChoiceContentRow {
    /// Primary key.
    pub id: i32,
    /// Owning choice.
    pub choice_id: i32,
    /// Stored kind discriminant.
    pub kind: String,
    /// Text body or object key.
    pub value: String,
    /// Display and hashing order.
    pub position: i32,
    /// Optional display label.
    pub label: Option<String>,
}

/// Insertable choice content block row.
#[derive(Debug, Insertable)]
#[diesel(table_name = choice_contents)]
pub struct NewChoiceContentRow<'a> {
    /// Owning choice.
    pub choice_id: i32,
    /// Stored kind discriminant.
    pub kind: &'a str,
    /// Text body or object key.
    pub value: &'a str,
    /// Display and hashing order.
    pub position: i32,
    /// Optional display label.
    pub label: Option<&'a str>,
}

/// Solution row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = solutions, check_for_backend(diesel::pg::Pg))]
pub struct SolutionRow {
    /// Primary key.
    pub id: i32,
    /// Owning question.
    pub question_id: i32,
}

/// Insertable solution row.
#[derive(Debug, Insertable)]
#[diesel(table_name = solutions)]
pub struct NewSolutionRow {
    /// Owning question.
    pub question_id: i32,
}

/// Solution content block row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = solution_contents, check_for_backend(diesel::pg::Pg))]
pub struct SolutionContentRow {
    /// Primary key.
    pub id: i32,
    /// Owning solution.
    pub solution_id: i32,
    /// Stored kind discriminant.
    pub kind: String,
    /// Text body or object key.
    pub value: String,
    /// Display and hashing order.
    pub position: i32,
    /// Optional display label.
    pub label: Option<String>,
}

/// Insertable solution content block row.
#[derive(Debug, Insertable)]
#[diesel(table_name = solution_contents)]
pub struct NewSolutionContentRow<'a> {
    /// Owning solution.
    pub solution_id: i32,
    /// Stored kind discriminant.
    pub kind: &'a str,
    /// Text body or object key.
    pub value: &'a str,
    /// Display and hashing order.
    pub position: i32,
    /// Optional display label.
    pub label: Option<&'a str>,
}

/// Source citation row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = question_sources, check_for_backend(diesel::pg::Pg))]
pub struct QuestionSourceRow {
    /// Primary key.
    pub id: i32,
    /// Owning question.
    pub question_id: i32,
    /// Cited source.
    pub source_id: i32,
    /// Cited page.
    pub page: i32,
}

/// Insertable source citation row.
#[derive(Debug, Insertable)]
#[diesel(table_name = question_sources)]
pub struct NewQuestionSourceRow {
    /// Owning question.
    pub question_id: i32,
    /// Cited source.
    pub source_id: i32,
    /// Cited page.
    pub page: i32,
}

/// Partial citation changeset; `None` columns stay untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = question_sources)]
pub struct CitationChanges {
    /// New source, if changing.
    pub source_id: Option<i32>,
    /// New page, if changing.
    pub page: Option<i32>,
}

/// Area row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = areas, check_for_backend(diesel::pg::Pg))]
pub struct AreaRow {
    /// Primary key.
    pub id: i32,
    /// Short area code.
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

impl From<AreaRow> for Area {
    fn from(row: AreaRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
        }
    }
}

/// Question-to-area association row.
#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = question_areas)]
pub struct QuestionAreaRow {
    /// Associated question.
    pub question_id: i32,
    /// Associated area.
    pub area_id: i32,
}

/// Source row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sources, check_for_backend(diesel::pg::Pg))]
pub struct SourceRow {
    /// Primary key.
    pub id: i32,
    /// Source name.
    pub name: String,
    /// Publication year.
    pub year: i32,
    /// Owning institution.
    pub institution_id: i32,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            year: row.year,
            institution_id: row.institution_id,
        }
    }
}

/// Convert stored content parts to the domain block, rejecting unknown kind
/// discriminants (they indicate schema drift, not caller error).
pub fn content_from_parts(
    id: i32,
    kind: &str,
    value: String,
    position: i32,
    label: Option<String>,
) -> Result<Content, String> {
    let kind = ContentKind::parse(kind)
        .ok_or_else(|| format!("unknown content kind '{kind}' on content row {id}"))?;
    Ok(Content {
        id,
        kind,
        value,
        order: position,
        label,
    })
}

impl QuestionContentRow {
    /// Convert to the domain content block.
    pub fn into_domain(self) -> Result<Content, String> {
        content_from_parts(self.id, &self.kind, self.value, self.position, self.label)
    }
}

impl ChoiceContentRow {
    /// Convert to the domain content block.
    pub fn into_domain(self) -> Result<Content, String> {
        content_from_parts(self.id, &self.kind, self.value, self.position, self.label)
    }
}

impl SolutionContentRow {
    /// Convert to the domain content block.
    pub fn into_domain(self) -> Result<Content, String> {
        content_from_parts(self.id, &self.kind, self.value, self.position, self.label)
    }
}
