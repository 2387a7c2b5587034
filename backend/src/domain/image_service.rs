//! Image intake: MIME validation and upload through the storage port.
//!
//! Stored object keys follow the original bank layout,
//! `courses/{course}/{section}/{filename}`. Keys are opaque to clients;
//! reads only ever see signed URLs.

use std::sync::Arc;

use crate::domain::error::Error;
use crate::domain::ports::ObjectStorage;
use crate::domain::signing::map_storage_error;

/// MIME types accepted for uploaded images.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// Destination section within a course's image tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSection {
    /// Question statement figures.
    Statements,
    /// Choice figures.
    Choices,
    /// Solution figures.
    Solutions,
}

impl ImageSection {
    /// Parse the query-string representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "statements" => Some(Self::Statements),
            "choices" => Some(Self::Choices),
            "solutions" => Some(Self::Solutions),
            _ => None,
        }
    }

    /// Path segment used in object keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Statements => "statements",
            Self::Choices => "choices",
            Self::Solutions => "solutions",
        }
    }
}

/// Uploads images into the configured storage container.
#[derive(Clone)]
pub struct ImageService {
    storage: Arc<dyn ObjectStorage>,
    container: String,
}

impl ImageService {
    /// Create a service uploading into `container`.
    pub fn new(storage: Arc<dyn ObjectStorage>, container: impl Into<String>) -> Self {
        Self {
            storage,
            container: container.into(),
        }
    }

    /// Validate and store one image; returns the opaque object key.
    pub async fn upload_image(
        &self,
        course: &str,
        section: ImageSection,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, Error> {
        if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
            return Err(Error::content_type(format!(
                "content type '{content_type}' is not allowed; expected one of: {}",
                ALLOWED_IMAGE_TYPES.join(", ")
            )));
        }
        if bytes.is_empty() {
            return Err(Error::invalid_request("image payload is empty"));
        }
        let course = validate_path_segment(course, "course")?;
        let filename = validate_path_segment(filename, "filename")?;

        let destination = format!("courses/{course}/{}/{filename}", section.as_str());

        self.storage
            .upload(&self.container, bytes, &destination, Some(content_type))
            .await
            .map_err(map_storage_error)
    }
}

/// Object keys are built from caller input; reject separators and dot
/// segments so a crafted name cannot escape its course directory.
fn validate_path_segment<'a>(value: &'a str, field: &str) -> Result<&'a str, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_request(format!("{field} must not be empty")));
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed == "." || trimmed == ".." {
        return Err(Error::invalid_request(format!(
            "{field} must not contain path separators"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::MemoryObjectStorage;

    fn service() -> ImageService {
        ImageService::new(Arc::new(MemoryObjectStorage::new()), "exams")
    }

    #[rstest]
    #[tokio::test]
    async fn upload_builds_the_course_scoped_key() {
        let key = service()
            .upload_image(
                "algebra",
                ImageSection::Statements,
                "fig1.webp",
                "image/webp",
                vec![1, 2, 3],
            )
            .await
            .expect("upload succeeds");
        assert_eq!(key, "courses/algebra/statements/fig1.webp");
    }

    #[rstest]
    #[case::gif("image/gif")]
    #[case::svg("image/svg+xml")]
    #[case::pdf("application/pdf")]
    #[tokio::test]
    async fn disallowed_mime_types_are_rejected(#[case] content_type: &str) {
        let err = service()
            .upload_image(
                "algebra",
                ImageSection::Choices,
                "fig.bin",
                content_type,
                vec![1],
            )
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::ContentTypeError);
    }

    #[rstest]
    #[case::traversal("..")]
    #[case::separator("a/b")]
    #[case::blank("  ")]
    #[tokio::test]
    async fn hostile_course_names_are_rejected(#[case] course: &str) {
        let err = service()
            .upload_image(
                course,
                ImageSection::Solutions,
                "fig.webp",
                "image/webp",
                vec![1],
            )
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn sections_parse_and_print_consistently() {
        for section in [
            ImageSection::Statements,
            ImageSection::Choices,
            ImageSection::Solutions,
        ] {
            assert_eq!(ImageSection::parse(section.as_str()), Some(section));
        }
        assert_eq!(ImageSection::parse("exams"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let err = service()
            .upload_image(
                "algebra",
                ImageSection::Statements,
                "fig.webp",
                "image/webp",
                Vec::new(),
            )
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
