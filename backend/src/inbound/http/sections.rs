//! Section-scoped partial update handlers.
//!
//! ```text
//! PATCH /api/v1/questions/{question_id}/contents/{content_id}
//! PATCH /api/v1/questions/{question_id}/choices/{choice_id}
//! PATCH /api/v1/questions/{question_id}/solutions/{solution_id}
//! PATCH /api/v1/questions/{question_id}/sources/{citation_id}
//! ```

use actix_web::{HttpResponse, patch, web};

use crate::inbound::http::error::ApiResult;
use crate::inbound::http::schemas::{
    ChoiceEnvelope, ChoiceUpdateBody, ContentEnvelope, ContentUpdateBody, ErrorSchema,
    SolutionEnvelope, SolutionUpdateBody, CitationUpdateBody,
};
use crate::inbound::http::state::HttpState;

/// Apply a partial update to one statement content block.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{question_id}/contents/{content_id}",
    params(
        ("question_id" = i32, Path, description = "Question id"),
        ("content_id" = i32, Path, description = "Content block id")
    ),
    request_body = ContentUpdateBody,
    responses(
        (status = 200, description = "Updated content block", body = ContentEnvelope),
        (status = 404, description = "Question or content missing", body = ErrorSchema),
        (status = 409, description = "Recomputed hash collides with another question", body = ErrorSchema)
    ),
    tags = ["question-sections"],
    operation_id = "updateQuestionContent"
)]
#[patch("/questions/{question_id}/contents/{content_id}")]
pub async fn update_question_content(
    state: web::Data<HttpState>,
    path: web::Path<(i32, i32)>,
    payload: web::Json<ContentUpdateBody>,
) -> ApiResult<HttpResponse> {
    let (question_id, content_id) = path.into_inner();
    let update = payload.into_inner().into_domain()?;

    let content = state
        .contents
        .update_content(question_id, content_id, update)
        .await?;

    Ok(HttpResponse::Ok().json(ContentEnvelope {
        data: content.into(),
    }))
}

/// Apply a partial update to one choice.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{question_id}/choices/{choice_id}",
    params(
        ("question_id" = i32, Path, description = "Question id"),
        ("choice_id" = i32, Path, description = "Choice id")
    ),
    request_body = ChoiceUpdateBody,
    responses(
        (status = 200, description = "Updated choice", body = ChoiceEnvelope),
        (status = 400, description = "Choice invariant violation", body = ErrorSchema),
        (status = 404, description = "Question or choice missing", body = ErrorSchema)
    ),
    tags = ["question-sections"],
    operation_id = "updateChoice"
)]
#[patch("/questions/{question_id}/choices/{choice_id}")]
pub async fn update_choice(
    state: web::Data<HttpState>,
    path: web::Path<(i32, i32)>,
    payload: web::Json<ChoiceUpdateBody>,
) -> ApiResult<HttpResponse> {
    let (question_id, choice_id) = path.into_inner();
    let update = payload.into_inner().into_domain()?;

    let choice = state
        .choices
        .update_choice(question_id, choice_id, update)
        .await?;

    Ok(HttpResponse::Ok().json(ChoiceEnvelope {
        data: choice.into(),
    }))
}

/// Replace one solution's contents wholesale.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{question_id}/solutions/{solution_id}",
    params(
        ("question_id" = i32, Path, description = "Question id"),
        ("solution_id" = i32, Path, description = "Solution id")
    ),
    request_body = SolutionUpdateBody,
    responses(
        (status = 200, description = "Updated solution", body = SolutionEnvelope),
        (status = 404, description = "Question or solution missing", body = ErrorSchema)
    ),
    tags = ["question-sections"],
    operation_id = "updateSolution"
)]
#[patch("/questions/{question_id}/solutions/{solution_id}")]
pub async fn update_solution(
    state: web::Data<HttpState>,
    path: web::Path<(i32, i32)>,
    payload: web::Json<SolutionUpdateBody>,
) -> ApiResult<HttpResponse> {
    let (question_id, solution_id) = path.into_inner();
    let contents = payload.into_inner().into_domain()?;

    let solution = state
        .solutions
        .update_solution(question_id, solution_id, contents)
        .await?;

    Ok(HttpResponse::Ok().json(SolutionEnvelope {
        data: solution.into(),
    }))
}

/// Apply a partial update to one source citation.
#[utoipa::path(
    patch,
    path = "/api/v1/questions/{question_id}/sources/{citation_id}",
    params(
        ("question_id" = i32, Path, description = "Question id"),
        ("citation_id" = i32, Path, description = "Citation id")
    ),
    request_body = CitationUpdateBody,
    responses(
        (status = 204, description = "Citation updated"),
        (status = 404, description = "Question, citation, or new source missing", body = ErrorSchema)
    ),
    tags = ["question-sections"],
    operation_id = "updateQuestionSource"
)]
#[patch("/questions/{question_id}/sources/{citation_id}")]
pub async fn update_question_source(
    state: web::Data<HttpState>,
    path: web::Path<(i32, i32)>,
    payload: web::Json<CitationUpdateBody>,
) -> ApiResult<HttpResponse> {
    let (question_id, citation_id) = path.into_inner();

    state
        .citations
        .update_citation(question_id, citation_id, payload.into_inner().into())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
