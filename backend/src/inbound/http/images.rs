//! Image upload handler.
//!
//! ```text
//! POST /api/v1/images?course&section&filename
//! ```
//!
//! The body is the raw image bytes; the MIME type comes from the
//! `Content-Type` header and is validated against the allowed set.

use actix_web::{HttpMessage, HttpRequest, HttpResponse, post, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, ImageSection};
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, ImageEnvelope, ImagePathResponse};
use crate::inbound::http::state::HttpState;

/// Query parameters for the upload endpoint.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct UploadImageParams {
    /// Course the image belongs to.
    pub course: String,
    /// Destination section: `statements`, `choices`, or `solutions`.
    pub section: String,
    /// Stored file name.
    pub filename: String,
}

/// Upload one image and return its opaque object key.
#[utoipa::path(
    post,
    path = "/api/v1/images",
    params(UploadImageParams),
    request_body(content = Vec<u8>, description = "Raw image bytes"),
    responses(
        (status = 201, description = "Image stored", body = ImageEnvelope),
        (status = 400, description = "Disallowed MIME type or hostile name", body = ErrorSchema),
        (status = 500, description = "Storage failure", body = ErrorSchema)
    ),
    tags = ["images"],
    operation_id = "uploadImage"
)]
#[post("/images")]
pub async fn upload_image(
    state: web::Data<HttpState>,
    request: HttpRequest,
    params: web::Query<UploadImageParams>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let params = params.into_inner();
    let section = ImageSection::parse(&params.section).ok_or_else(|| {
        Error::invalid_request(format!(
            "section must be 'statements', 'choices', or 'solutions', got '{}'",
            params.section
        ))
    })?;
    let content_type = request.content_type().to_owned();

    let path = state
        .images
        .upload_image(
            &params.course,
            section,
            &params.filename,
            &content_type,
            body.to_vec(),
        )
        .await?;

    Ok(HttpResponse::Created().json(ImageEnvelope {
        data: ImagePathResponse { path },
    }))
}
