//! Request/response DTOs and the response envelopes.
//!
//! Success payloads are wrapped as `{"data": ...}` (with a `meta` block on
//! paginated lists); errors as `{"error": {"code", "message"}}`. Structural
//! field validation happens here when bodies are parsed into domain drafts,
//! mirroring where the cross-entity validators pick up afterwards.

use pagination::PageMeta;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Area, Choice, ChoiceDraft, ChoiceUpdate, CitationDraft, CitationUpdate, Content, ContentDraft,
    ContentKind, ContentUpdate, Error, NewQuestion, Question, QuestionView, Solution,
    SourceCitation,
};

/// Bounds on the number of choices a question carries, matching the exam
/// format the bank stores.
const CHOICE_COUNT: std::ops::RangeInclusive<usize> = 4..=5;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// One content block in a request payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContentBody {
    /// Block kind.
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Text body, or an object-storage key for image blocks.
    pub value: String,
    /// Display and hashing order, starting at 1.
    pub order: i32,
    /// Optional single-character display label.
    #[serde(default)]
    pub label: Option<String>,
}

/// One choice in a creation payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChoiceBody {
    /// Single-letter display label.
    pub label: String,
    /// Whether this alternative answers the question.
    pub is_correct: bool,
    /// Ordered content blocks, at least one.
    pub contents: Vec<ContentBody>,
}

/// One solution in a creation payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SolutionBody {
    /// Ordered content blocks, at least one.
    pub contents: Vec<ContentBody>,
}

/// One source citation in a creation payload.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct CitationBody {
    /// Cited source id.
    pub source_id: i32,
    /// Cited page, positive.
    pub page: i32,
}

/// Full question creation payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateQuestionBody {
    /// Taxonomy reference: question type.
    pub question_type_id: i32,
    /// Taxonomy reference: subtopic.
    pub subtopic_id: i32,
    /// Taxonomy reference: difficulty.
    pub difficulty_id: i32,
    /// Associated area ids, at least one.
    pub area_ids: Vec<i32>,
    /// Statement content blocks, at least one.
    pub contents: Vec<ContentBody>,
    /// Alternatives, four or five of them.
    pub choices: Vec<ChoiceBody>,
    /// Worked solutions, at least one.
    pub solutions: Vec<SolutionBody>,
    /// Source citations; may be empty.
    #[serde(default)]
    pub sources: Vec<CitationBody>,
}

/// Body for the question-type section update.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct QuestionTypeBody {
    /// New question type id.
    pub question_type_id: i32,
}

/// Body for the subtopic section update.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct SubtopicBody {
    /// New subtopic id.
    pub subtopic_id: i32,
}

/// Body for the difficulty section update.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct DifficultyBody {
    /// New difficulty id.
    pub difficulty_id: i32,
}

/// Body for the areas section update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AreasBody {
    /// Replacement area association set, at least one.
    pub area_ids: Vec<i32>,
}

/// Partial update of one content block.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ContentUpdateBody {
    /// New block kind, if changing.
    #[serde(rename = "type", default)]
    pub kind: Option<ContentKind>,
    /// New value, if changing.
    #[serde(default)]
    pub value: Option<String>,
    /// New order, if changing.
    #[serde(default)]
    pub order: Option<i32>,
    /// New label, if changing.
    #[serde(default)]
    pub label: Option<String>,
}

/// Partial update of one choice.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ChoiceUpdateBody {
    /// New display label, if changing.
    #[serde(default)]
    pub label: Option<String>,
    /// New correctness flag, if changing.
    #[serde(default)]
    pub is_correct: Option<bool>,
    /// Replacement content list, if changing.
    #[serde(default)]
    pub contents: Option<Vec<ContentBody>>,
}

/// Wholesale replacement of a solution's contents.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SolutionUpdateBody {
    /// Replacement content list, at least one block.
    pub contents: Vec<ContentBody>,
}

/// Partial update of one source citation.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct CitationUpdateBody {
    /// New source id, if changing.
    #[serde(default)]
    pub source_id: Option<i32>,
    /// New page, if changing.
    #[serde(default)]
    pub page: Option<i32>,
}

// ---------------------------------------------------------------------------
// Body -> domain draft conversion with structural validation
// ---------------------------------------------------------------------------

fn parse_label(label: Option<String>, owner: &str) -> Result<Option<String>, Error> {
    match label {
        None => Ok(None),
        Some(label) => {
            if label.chars().count() != 1 {
                return Err(Error::invalid_request(format!(
                    "{owner}: label must be a single character"
                )));
            }
            Ok(Some(label))
        }
    }
}

fn parse_content(body: ContentBody, owner: &str) -> Result<ContentDraft, Error> {
    if body.value.trim().is_empty() {
        return Err(Error::invalid_request(format!(
            "{owner}: content value must not be empty"
        )));
    }
    if body.order < 1 {
        return Err(Error::invalid_request(format!(
            "{owner}: order must be positive"
        )));
    }
    Ok(ContentDraft {
        kind: body.kind,
        value: body.value,
        order: body.order,
        label: parse_label(body.label, owner)?,
    })
}

fn parse_contents(
    bodies: Vec<ContentBody>,
    owner: &str,
    require_non_empty: bool,
) -> Result<Vec<ContentDraft>, Error> {
    if require_non_empty && bodies.is_empty() {
        return Err(Error::invalid_request(format!(
            "{owner}: at least one content block is required"
        )));
    }
    bodies
        .into_iter()
        .map(|body| parse_content(body, owner))
        .collect()
}

fn parse_choice(body: ChoiceBody) -> Result<ChoiceDraft, Error> {
    let label = parse_label(Some(body.label), "choice")?
        .unwrap_or_default();
    Ok(ChoiceDraft {
        label,
        is_correct: body.is_correct,
        contents: parse_contents(body.contents, "choice contents", true)?,
    })
}

impl CreateQuestionBody {
    /// Validate field structure and convert to the domain creation payload.
    pub fn into_domain(self) -> Result<NewQuestion, Error> {
        if self.area_ids.is_empty() {
            return Err(Error::invalid_request("at least one area id is required"));
        }
        if !CHOICE_COUNT.contains(&self.choices.len()) {
            return Err(Error::invalid_request(format!(
                "a question carries {} to {} choices",
                CHOICE_COUNT.start(),
                CHOICE_COUNT.end()
            )));
        }
        if self.solutions.is_empty() {
            return Err(Error::invalid_request("at least one solution is required"));
        }
        for citation in &self.sources {
            if citation.page < 1 {
                return Err(Error::invalid_request("citation page must be positive"));
            }
        }

        Ok(NewQuestion {
            question_type_id: self.question_type_id,
            subtopic_id: self.subtopic_id,
            difficulty_id: self.difficulty_id,
            area_ids: self.area_ids,
            contents: parse_contents(self.contents, "question contents", true)?,
            choices: self
                .choices
                .into_iter()
                .map(parse_choice)
                .collect::<Result<Vec<_>, _>>()?,
            solutions: self
                .solutions
                .into_iter()
                .map(|solution| {
                    Ok(crate::domain::SolutionDraft {
                        contents: parse_contents(solution.contents, "solution contents", true)?,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?,
            citations: self
                .sources
                .iter()
                .map(|citation| CitationDraft {
                    source_id: citation.source_id,
                    page: citation.page,
                })
                .collect(),
        })
    }
}

impl ContentUpdateBody {
    /// Validate field structure and convert to the domain update.
    pub fn into_domain(self) -> Result<ContentUpdate, Error> {
        if let Some(value) = &self.value
            && value.trim().is_empty()
        {
            return Err(Error::invalid_request("content value must not be empty"));
        }
        if let Some(order) = self.order
            && order < 1
        {
            return Err(Error::invalid_request("order must be positive"));
        }
        Ok(ContentUpdate {
            kind: self.kind,
            value: self.value,
            order: self.order,
            label: parse_label(self.label, "content")?,
        })
    }
}

impl ChoiceUpdateBody {
    /// Validate field structure and convert to the domain update.
    pub fn into_domain(self) -> Result<ChoiceUpdate, Error> {
        let label = match self.label {
            None => None,
            Some(label) => parse_label(Some(label), "choice")?,
        };
        let contents = match self.contents {
            None => None,
            Some(bodies) => Some(parse_contents(bodies, "choice contents", true)?),
        };
        Ok(ChoiceUpdate {
            label,
            is_correct: self.is_correct,
            contents,
        })
    }
}

impl SolutionUpdateBody {
    /// Validate field structure and convert to the replacement content list.
    pub fn into_domain(self) -> Result<Vec<ContentDraft>, Error> {
        parse_contents(self.contents, "solution contents", true)
    }
}

impl From<CitationUpdateBody> for CitationUpdate {
    fn from(body: CitationUpdateBody) -> Self {
        Self {
            source_id: body.source_id,
            page: body.page,
        }
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// One content block in a response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContentResponse {
    /// Row identity.
    pub id: i32,
    /// Block kind.
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Text body, or a signed URL for image blocks.
    pub value: String,
    /// Display order.
    pub order: i32,
    /// Optional display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<Content> for ContentResponse {
    fn from(content: Content) -> Self {
        Self {
            id: content.id,
            kind: content.kind,
            value: content.value,
            order: content.order,
            label: content.label,
        }
    }
}

/// One choice in a response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChoiceResponse {
    /// Row identity.
    pub id: i32,
    /// Single-letter display label.
    pub label: String,
    /// Whether this alternative answers the question.
    pub is_correct: bool,
    /// Ordered content blocks.
    pub contents: Vec<ContentResponse>,
}

impl From<Choice> for ChoiceResponse {
    fn from(choice: Choice) -> Self {
        Self {
            id: choice.id,
            label: choice.label,
            is_correct: choice.is_correct,
            contents: choice.contents.into_iter().map(Into::into).collect(),
        }
    }
}

/// One solution in a response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SolutionResponse {
    /// Row identity.
    pub id: i32,
    /// Ordered content blocks.
    pub contents: Vec<ContentResponse>,
}

impl From<Solution> for SolutionResponse {
    fn from(solution: Solution) -> Self {
        Self {
            id: solution.id,
            contents: solution.contents.into_iter().map(Into::into).collect(),
        }
    }
}

/// The cited source embedded in a citation response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SourceResponse {
    /// Row identity.
    pub id: i32,
    /// Source name.
    pub name: String,
    /// Publication year.
    pub year: i32,
}

/// One source citation in a response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CitationResponse {
    /// Row identity.
    pub id: i32,
    /// Cited page.
    pub page: i32,
    /// The cited source.
    pub source: SourceResponse,
}

impl From<SourceCitation> for CitationResponse {
    fn from(citation: SourceCitation) -> Self {
        Self {
            id: citation.id,
            page: citation.page,
            source: SourceResponse {
                id: citation.source.id,
                name: citation.source.name,
                year: citation.source.year,
            },
        }
    }
}

/// One area in a response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AreaResponse {
    /// Row identity.
    pub id: i32,
    /// Short area code.
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

impl From<Area> for AreaResponse {
    fn from(area: Area) -> Self {
        Self {
            id: area.id,
            code: area.code,
            name: area.name,
        }
    }
}

/// The question aggregate projection.
///
/// `choices` and `solutions` are omitted under the summary view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionResponse {
    /// Row identity.
    pub id: i32,
    /// Content fingerprint.
    pub question_hash: String,
    /// Taxonomy reference.
    pub question_type_id: i32,
    /// Taxonomy reference.
    pub subtopic_id: i32,
    /// Taxonomy reference.
    pub difficulty_id: i32,
    /// Statement content blocks.
    pub contents: Vec<ContentResponse>,
    /// Associated areas.
    pub areas: Vec<AreaResponse>,
    /// Source citations.
    pub sources: Vec<CitationResponse>,
    /// Alternatives; absent under the summary view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceResponse>>,
    /// Worked solutions; absent under the summary view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solutions: Option<Vec<SolutionResponse>>,
}

impl QuestionResponse {
    /// Project a question under the given view.
    #[must_use]
    pub fn project(question: Question, view: QuestionView) -> Self {
        let Question {
            id,
            question_hash,
            question_type_id,
            subtopic_id,
            difficulty_id,
            contents,
            choices,
            solutions,
            citations,
            areas,
        } = question;

        let (choices, solutions) = match view {
            QuestionView::Summary => (None, None),
            QuestionView::Full => (
                Some(choices.into_iter().map(Into::into).collect()),
                Some(solutions.into_iter().map(Into::into).collect()),
            ),
        };

        Self {
            id,
            question_hash,
            question_type_id,
            subtopic_id,
            difficulty_id,
            contents: contents.into_iter().map(Into::into).collect(),
            areas: areas.into_iter().map(Into::into).collect(),
            sources: citations.into_iter().map(Into::into).collect(),
            choices,
            solutions,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// `{"data": question}` envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionEnvelope {
    /// Wrapped payload.
    pub data: QuestionResponse,
}

/// `{"data": [...], "meta": {...}}` envelope for paginated lists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionListEnvelope {
    /// Page items.
    pub data: Vec<QuestionResponse>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// `{"data": content}` envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContentEnvelope {
    /// Wrapped payload.
    pub data: ContentResponse,
}

/// `{"data": choice}` envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChoiceEnvelope {
    /// Wrapped payload.
    pub data: ChoiceResponse,
}

/// `{"data": solution}` envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SolutionEnvelope {
    /// Wrapped payload.
    pub data: SolutionResponse,
}

/// Stored-path payload returned by the image upload endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImagePathResponse {
    /// Opaque object key of the stored image.
    pub path: String,
}

/// `{"data": {"path": ...}}` envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageEnvelope {
    /// Wrapped payload.
    pub data: ImagePathResponse,
}

/// Error envelope documented for every endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorSchema {
    /// The error body.
    pub error: ErrorBodySchema,
}

/// `{"code", "message"}` error body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBodySchema {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}
