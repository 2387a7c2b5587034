//! Question HTTP handlers.
//!
//! ```text
//! POST   /api/v1/questions
//! GET    /api/v1/questions?page&limit&view=summary|full
//! GET    /api/v1/questions/{id}?view=summary|full
//! PATCH  /api/v1/questions/{id}/question-type
//! PATCH  /api/v1/questions/{id}/subtopic
//! PATCH  /api/v1/questions/{id}/difficulty
//! PATCH  /api/v1/questions/{id}/areas
//! DELETE /api/v1/questions/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::PageRequest;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, QuestionView};
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::schemas::{
    AreasBody, CreateQuestionBody, DifficultyBody, ErrorSchema, QuestionEnvelope,
    QuestionListEnvelope, QuestionResponse, QuestionTypeBody, SubtopicBody,
};
use crate::inbound::http::state::HttpState;

/// Query parameters for the list endpoint.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ListQuestionsParams {
    /// 1-based page index; defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size; defaults to 20, capped at 100.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Read view, `summary` or `full`; defaults to `full`.
    #[serde(default)]
    pub view: Option<String>,
}

/// Query parameters carrying only the read view.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ViewParams {
    /// Read view, `summary` or `full`; defaults to `full`.
    #[serde(default)]
    pub view: Option<String>,
}

pub(crate) fn parse_view(view: Option<&str>) -> Result<QuestionView, Error> {
    match view {
        None => Ok(QuestionView::Full),
        Some(raw) => QuestionView::parse(raw).ok_or_else(|| {
            Error::invalid_request(format!("view must be 'summary' or 'full', got '{raw}'"))
        }),
    }
}

/// Create a question aggregate.
#[utoipa::path(
    post,
    path = "/api/v1/questions",
    request_body = CreateQuestionBody,
    responses(
        (status = 201, description = "Question created", body = QuestionEnvelope),
        (status = 400, description = "Invalid payload or choice invariant violation", body = ErrorSchema),
        (status = 404, description = "Referenced area or source missing", body = ErrorSchema),
        (status = 409, description = "Duplicate question hash", body = ErrorSchema),
        (status = 500, description = "Persistence failure", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "createQuestion"
)]
#[post("/questions")]
pub async fn create_question(
    state: web::Data<HttpState>,
    payload: web::Json<CreateQuestionBody>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner().into_domain()?;
    let created = state.questions.create_question(payload).await?;

    Ok(HttpResponse::Created().json(QuestionEnvelope {
        data: QuestionResponse::project(created, QuestionView::Full),
    }))
}

/// List questions with pagination.
#[utoipa::path(
    get,
    path = "/api/v1/questions",
    params(ListQuestionsParams),
    responses(
        (status = 200, description = "One page of questions", body = QuestionListEnvelope),
        (status = 400, description = "Invalid view", body = ErrorSchema),
        (status = 500, description = "Retrieval failure", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "listQuestions"
)]
#[get("/questions")]
pub async fn list_questions(
    state: web::Data<HttpState>,
    params: web::Query<ListQuestionsParams>,
) -> ApiResult<HttpResponse> {
    let params = params.into_inner();
    let view = parse_view(params.view.as_deref())?;
    let request = PageRequest::new(params.page.unwrap_or(1), params.limit.unwrap_or(20));

    let page = state.questions.list_questions(request, view).await?;
    let meta = page.meta();

    Ok(HttpResponse::Ok().json(QuestionListEnvelope {
        data: page
            .items
            .into_iter()
            .map(|question| QuestionResponse::project(question, view))
            .collect(),
        meta,
    }))
}

/// Read one question by id.
#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    params(
        ("id" = i32, Path, description = "Question id"),
        ViewParams
    ),
    responses(
        (status = 200, description = "The question", body = QuestionEnvelope),
        (status = 404, description = "Question not found", body = ErrorSchema),
        (status = 500, description = "Retrieval or signing failure", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "getQuestion"
)]
#[get("/questions/{id}")]
pub async fn get_question(
    state: web::Data<HttpState>,
    id: web::Path<i32>,
    params: web::Query<ViewParams>,
) -> ApiResult<HttpResponse> {
    let view = parse_view(params.view.as_deref())?;
    let question = state.questions.get_question(id.into_inner(), view).await?;

    Ok(HttpResponse::Ok().json(QuestionEnvelope {
        data: QuestionResponse::project(question, view),
    }))
}

/// Delete a question and all owned children.
#[utoipa::path(
    delete,
    path = "/api/v1/questions/{id}",
    params(("id" = i32, Path, description = "Question id")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 404, description = "Question not found", body = ErrorSchema),
        (status = 500, description = "Delete failure", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "deleteQuestion"
)]
#[delete("/questions/{id}")]
pub async fn delete_question(
    state: web::Data<HttpState>,
    id: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    state.questions.delete_question(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Point the question at a different question type.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{id}/question-type",
    params(("id" = i32, Path, description = "Question id")),
    request_body = QuestionTypeBody,
    responses(
        (status = 204, description = "Question type updated"),
        (status = 400, description = "Unknown question type id", body = ErrorSchema),
        (status = 404, description = "Question not found", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "updateQuestionType"
)]
#[patch("/questions/{id}/question-type")]
pub async fn update_question_type(
    state: web::Data<HttpState>,
    id: web::Path<i32>,
    payload: web::Json<QuestionTypeBody>,
) -> ApiResult<HttpResponse> {
    state
        .questions
        .update_question_type(id.into_inner(), payload.question_type_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Point the question at a different subtopic.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{id}/subtopic",
    params(("id" = i32, Path, description = "Question id")),
    request_body = SubtopicBody,
    responses(
        (status = 204, description = "Subtopic updated"),
        (status = 400, description = "Unknown subtopic id", body = ErrorSchema),
        (status = 404, description = "Question not found", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "updateSubtopic"
)]
#[patch("/questions/{id}/subtopic")]
pub async fn update_subtopic(
    state: web::Data<HttpState>,
    id: web::Path<i32>,
    payload: web::Json<SubtopicBody>,
) -> ApiResult<HttpResponse> {
    state
        .questions
        .update_subtopic(id.into_inner(), payload.subtopic_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Point the question at a different difficulty.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{id}/difficulty",
    params(("id" = i32, Path, description = "Question id")),
    request_body = DifficultyBody,
    responses(
        (status = 204, description = "Difficulty updated"),
        (status = 400, description = "Unknown difficulty id", body = ErrorSchema),
        (status = 404, description = "Question not found", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "updateDifficulty"
)]
#[patch("/questions/{id}/difficulty")]
pub async fn update_difficulty(
    state: web::Data<HttpState>,
    id: web::Path<i32>,
    payload: web::Json<DifficultyBody>,
) -> ApiResult<HttpResponse> {
    state
        .questions
        .update_difficulty(id.into_inner(), payload.difficulty_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Replace the question's area association set.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{id}/areas",
    params(("id" = i32, Path, description = "Question id")),
    request_body = AreasBody,
    responses(
        (status = 204, description = "Areas replaced"),
        (status = 404, description = "Question or any requested area missing", body = ErrorSchema)
    ),
    tags = ["questions"],
    operation_id = "updateAreas"
)]
#[patch("/questions/{id}/areas")]
pub async fn update_areas(
    state: web::Data<HttpState>,
    id: web::Path<i32>,
    payload: web::Json<AreasBody>,
) -> ApiResult<HttpResponse> {
    state
        .questions
        .update_areas(id.into_inner(), payload.into_inner().area_ids)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[rstest]
    fn view_defaults_to_full() {
        assert_eq!(parse_view(None).expect("parses"), QuestionView::Full);
    }

    #[rstest]
    fn view_parses_both_variants() {
        assert_eq!(
            parse_view(Some("summary")).expect("parses"),
            QuestionView::Summary
        );
        assert_eq!(parse_view(Some("full")).expect("parses"), QuestionView::Full);
    }

    #[rstest]
    fn unknown_view_is_invalid_request() {
        let err = parse_view(Some("deep")).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
