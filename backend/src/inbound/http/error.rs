//! HTTP adapter mapping for domain errors.
//!
//! Keeps the domain error type HTTP-agnostic while letting Actix handlers
//! turn failures into the `{"error": {"code", "message"}}` envelope with a
//! status fixed per error kind.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::domain::{Error, ErrorCode};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest
        | ErrorCode::ForeignKeyViolation
        | ErrorCode::NoCorrectChoice
        | ErrorCode::MultipleCorrectChoices
        | ErrorCode::DuplicateChoiceContent
        | ErrorCode::ContentTypeError => StatusCode::BAD_REQUEST,
        ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
        ErrorCode::DuplicateValue => StatusCode::CONFLICT,
        ErrorCode::PersistenceError
        | ErrorCode::RetrievalError
        | ErrorCode::DeleteError
        | ErrorCode::StorageError
        | ErrorCode::StorageBucketNotFound
        | ErrorCode::StoragePermissionDenied => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Technical failure details stay in the logs; clients get a stable code
/// and a generic phrase.
fn public_message(error: &Error) -> String {
    if error.code().is_domain() {
        return error.message().to_owned();
    }
    match error.code() {
        ErrorCode::RetrievalError => "failed to read from the data store".to_owned(),
        ErrorCode::DeleteError => "failed to delete from the data store".to_owned(),
        ErrorCode::StorageError
        | ErrorCode::StorageBucketNotFound
        | ErrorCode::StoragePermissionDenied => "object storage request failed".to_owned(),
        _ => "failed to write to the data store".to_owned(),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if !self.code().is_domain() {
            error!(code = self.code().as_str(), detail = self.message(), "technical error");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": {
                "code": self.code().as_str(),
                "message": public_message(self),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::not_found(Error::resource_not_found("question 7 not found"), StatusCode::NOT_FOUND)]
    #[case::duplicate(Error::duplicate_value("hash collision"), StatusCode::CONFLICT)]
    #[case::foreign_key(Error::foreign_key_violation("bad ref"), StatusCode::BAD_REQUEST)]
    #[case::no_correct(Error::no_correct_choice("none"), StatusCode::BAD_REQUEST)]
    #[case::content_type(Error::content_type("gif"), StatusCode::BAD_REQUEST)]
    #[case::persistence(Error::persistence("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case::storage(Error::storage_bucket_not_found("gone"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn statuses_are_fixed_per_kind(#[case] error: Error, #[case] status: StatusCode) {
        assert_eq!(error.status_code(), status);
    }

    #[rstest]
    fn domain_messages_reach_the_client() {
        let error = Error::resource_not_found("question 7 not found");
        assert_eq!(public_message(&error), "question 7 not found");
    }

    #[rstest]
    fn technical_details_are_redacted() {
        let error = Error::persistence("diesel: connection reset by peer");
        let message = public_message(&error);
        assert!(!message.contains("diesel"));
    }

    #[rstest]
    fn envelope_carries_the_stable_code() {
        let error = Error::duplicate_choice_content("duplicate content: 'lima'");
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
