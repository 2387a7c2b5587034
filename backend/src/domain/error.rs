//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP inbound adapter maps them to
//! response envelopes and status codes; nothing in this module knows about
//! HTTP.

/// Stable machine-readable error code describing the failure category.
///
/// Codes split into two families: domain codes describe client-correctable
/// failures, technical codes describe infrastructure failures. The split
/// drives the status-class mapping in the inbound adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The request is malformed or fails payload validation.
    InvalidRequest,
    /// A referenced question, area, source, or sub-entity does not exist.
    ResourceNotFound,
    /// A unique constraint was violated (e.g. a question-hash collision).
    DuplicateValue,
    /// A referenced id does not exist at the store level.
    ForeignKeyViolation,
    /// No choice in the set is marked correct.
    NoCorrectChoice,
    /// More than one choice in the set is marked correct.
    MultipleCorrectChoices,
    /// Two choices carry the same normalised text content.
    DuplicateChoiceContent,
    /// An uploaded image carries a disallowed MIME type.
    ContentTypeError,
    /// The store failed while writing.
    PersistenceError,
    /// The store failed while reading.
    RetrievalError,
    /// The store failed while deleting.
    DeleteError,
    /// The object-storage backend failed.
    StorageError,
    /// The object-storage container does not exist.
    StorageBucketNotFound,
    /// The object-storage backend denied access.
    StoragePermissionDenied,
}

impl ErrorCode {
    /// The wire representation of this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::ResourceNotFound => "resource_not_found",
            Self::DuplicateValue => "duplicate_value",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::NoCorrectChoice => "no_correct_choice",
            Self::MultipleCorrectChoices => "multiple_correct_choices",
            Self::DuplicateChoiceContent => "duplicate_choice_content",
            Self::ContentTypeError => "content_type_error",
            Self::PersistenceError => "persistence_error",
            Self::RetrievalError => "retrieval_error",
            Self::DeleteError => "delete_error",
            Self::StorageError => "storage_error",
            Self::StorageBucketNotFound => "storage_bucket_not_found",
            Self::StoragePermissionDenied => "storage_permission_denied",
        }
    }

    /// Whether this code describes a client-correctable failure.
    #[must_use]
    pub fn is_domain(self) -> bool {
        !matches!(
            self,
            Self::PersistenceError
                | Self::RetrievalError
                | Self::DeleteError
                | Self::StorageError
                | Self::StorageBucketNotFound
                | Self::StoragePermissionDenied
        )
    }
}

/// Domain error carrying a stable code and a human-readable message.
///
/// # Examples
/// ```
/// use qbank::domain::{Error, ErrorCode};
///
/// let err = Error::resource_not_found("question 42 not found");
/// assert_eq!(err.code(), ErrorCode::ResourceNotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Create an error with an explicit code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::ResourceNotFound`].
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateValue`].
    pub fn duplicate_value(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateValue, message)
    }

    /// Convenience constructor for [`ErrorCode::ForeignKeyViolation`].
    pub fn foreign_key_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ForeignKeyViolation, message)
    }

    /// Convenience constructor for [`ErrorCode::NoCorrectChoice`].
    pub fn no_correct_choice(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoCorrectChoice, message)
    }

    /// Convenience constructor for [`ErrorCode::MultipleCorrectChoices`].
    pub fn multiple_correct_choices(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MultipleCorrectChoices, message)
    }

    /// Convenience constructor for [`ErrorCode::DuplicateChoiceContent`].
    pub fn duplicate_choice_content(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateChoiceContent, message)
    }

    /// Convenience constructor for [`ErrorCode::ContentTypeError`].
    pub fn content_type(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ContentTypeError, message)
    }

    /// Convenience constructor for [`ErrorCode::PersistenceError`].
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceError, message)
    }

    /// Convenience constructor for [`ErrorCode::RetrievalError`].
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RetrievalError, message)
    }

    /// Convenience constructor for [`ErrorCode::DeleteError`].
    pub fn delete(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeleteError, message)
    }

    /// Convenience constructor for [`ErrorCode::StorageError`].
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Convenience constructor for [`ErrorCode::StorageBucketNotFound`].
    pub fn storage_bucket_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageBucketNotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::StoragePermissionDenied`].
    pub fn storage_permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoragePermissionDenied, message)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::not_found(Error::resource_not_found("x"), "resource_not_found", true)]
    #[case::duplicate(Error::duplicate_value("x"), "duplicate_value", true)]
    #[case::foreign_key(Error::foreign_key_violation("x"), "foreign_key_violation", true)]
    #[case::no_correct(Error::no_correct_choice("x"), "no_correct_choice", true)]
    #[case::persistence(Error::persistence("x"), "persistence_error", false)]
    #[case::retrieval(Error::retrieval("x"), "retrieval_error", false)]
    #[case::storage(Error::storage_permission_denied("x"), "storage_permission_denied", false)]
    fn codes_are_stable_and_classified(
        #[case] error: Error,
        #[case] code: &str,
        #[case] is_domain: bool,
    ) {
        assert_eq!(error.code().as_str(), code);
        assert_eq!(error.code().is_domain(), is_domain);
    }

    #[rstest]
    fn display_uses_message() {
        let err = Error::duplicate_choice_content("duplicate content: 'lima'");
        assert_eq!(err.to_string(), "duplicate content: 'lima'");
    }
}
