//! OpenAPI document assembled from the HTTP adapter's annotations.

use utoipa::OpenApi;

use crate::inbound::http::schemas::{
    AreaResponse, AreasBody, ChoiceBody, ChoiceEnvelope, ChoiceResponse, ChoiceUpdateBody,
    CitationBody, CitationResponse, CitationUpdateBody, ContentBody, ContentEnvelope,
    ContentResponse, ContentUpdateBody, CreateQuestionBody, DifficultyBody, ErrorBodySchema,
    ErrorSchema, ImageEnvelope, ImagePathResponse, QuestionEnvelope, QuestionListEnvelope,
    QuestionResponse, QuestionTypeBody, SolutionBody, SolutionEnvelope, SolutionResponse,
    SolutionUpdateBody, SourceResponse, SubtopicBody,
};

/// Public OpenAPI surface used by Swagger UI and tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "qbank",
        description = "Question bank management API: exam question aggregates \
                       with typed content blocks, choices, solutions, source \
                       citations, and signed image URLs."
    ),
    paths(
        crate::inbound::http::questions::create_question,
        crate::inbound::http::questions::list_questions,
        crate::inbound::http::questions::get_question,
        crate::inbound::http::questions::delete_question,
        crate::inbound::http::questions::update_question_type,
        crate::inbound::http::questions::update_subtopic,
        crate::inbound::http::questions::update_difficulty,
        crate::inbound::http::questions::update_areas,
        crate::inbound::http::sections::update_question_content,
        crate::inbound::http::sections::update_choice,
        crate::inbound::http::sections::update_solution,
        crate::inbound::http::sections::update_question_source,
        crate::inbound::http::images::upload_image,
    ),
    components(schemas(
        AreaResponse,
        AreasBody,
        ChoiceBody,
        ChoiceEnvelope,
        ChoiceResponse,
        ChoiceUpdateBody,
        CitationBody,
        CitationResponse,
        CitationUpdateBody,
        ContentBody,
        ContentEnvelope,
        ContentResponse,
        ContentUpdateBody,
        CreateQuestionBody,
        DifficultyBody,
        ErrorBodySchema,
        ErrorSchema,
        ImageEnvelope,
        ImagePathResponse,
        QuestionEnvelope,
        QuestionListEnvelope,
        QuestionResponse,
        QuestionTypeBody,
        SolutionBody,
        SolutionEnvelope,
        SolutionResponse,
        SolutionUpdateBody,
        SourceResponse,
        SubtopicBody,
    )),
    tags(
        (name = "questions", description = "Question aggregate lifecycle"),
        (name = "question-sections", description = "Section-scoped partial updates"),
        (name = "images", description = "Image intake")
    )
)]
pub struct ApiDoc;
