//! Image reference resolution at read time.
//!
//! Persisted image blocks hold opaque storage keys. Before serialisation the
//! resolver swaps each key for a freshly minted signed URL from the storage
//! port. Only the in-memory copy is touched; the stored value is never
//! rewritten. Signing is all-or-nothing: one failure fails the whole read.

use std::sync::Arc;

use crate::domain::content::{Content, ContentKind};
use crate::domain::error::Error;
use crate::domain::ports::{ObjectStorage, ObjectStorageError};
use crate::domain::question::{Question, QuestionView};

/// Walks content lists and replaces image storage keys with signed URLs.
#[derive(Clone)]
pub struct ImageReferenceResolver {
    storage: Arc<dyn ObjectStorage>,
    container: String,
}

impl ImageReferenceResolver {
    /// Create a resolver signing against `container`.
    pub fn new(storage: Arc<dyn ObjectStorage>, container: impl Into<String>) -> Self {
        Self {
            storage,
            container: container.into(),
        }
    }

    /// Replace every image block's key with a fresh signed URL. Text blocks
    /// pass through untouched.
    pub async fn resolve_contents(&self, contents: &mut [Content]) -> Result<(), Error> {
        for content in contents {
            if content.kind != ContentKind::Image {
                continue;
            }
            content.value = self
                .storage
                .sign_for_read(&self.container, &content.value)
                .await
                .map_err(map_storage_error)?;
        }
        Ok(())
    }

    /// Resolve a whole question for the given read view.
    ///
    /// Statement contents are always resolved; choice and solution contents
    /// only under the full view, since the summary projection does not
    /// serialise them.
    pub async fn resolve_question(
        &self,
        question: &mut Question,
        view: QuestionView,
    ) -> Result<(), Error> {
        self.resolve_contents(&mut question.contents).await?;

        if view == QuestionView::Summary {
            return Ok(());
        }

        for choice in &mut question.choices {
            self.resolve_contents(&mut choice.contents).await?;
        }
        for solution in &mut question.solutions {
            self.resolve_contents(&mut solution.contents).await?;
        }
        Ok(())
    }
}

pub(crate) fn map_storage_error(error: ObjectStorageError) -> Error {
    match error {
        ObjectStorageError::NotFound { message } => Error::storage_bucket_not_found(message),
        ObjectStorageError::PermissionDenied { message } => {
            Error::storage_permission_denied(message)
        }
        ObjectStorageError::BadRequest { message } | ObjectStorageError::Backend { message } => {
            Error::storage(message)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MemoryObjectStorage, MockObjectStorage};

    fn text_block(value: &str) -> Content {
        Content {
            id: 1,
            kind: ContentKind::Text,
            value: value.to_owned(),
            order: 1,
            label: None,
        }
    }

    fn image_block(key: &str, order: i32) -> Content {
        Content {
            id: 2,
            kind: ContentKind::Image,
            value: key.to_owned(),
            order,
            label: None,
        }
    }

    fn resolver() -> ImageReferenceResolver {
        ImageReferenceResolver::new(Arc::new(MemoryObjectStorage::new()), "exams")
    }

    fn question_with_nested_images() -> Question {
        Question {
            id: 1,
            question_hash: "h".to_owned(),
            question_type_id: 1,
            subtopic_id: 1,
            difficulty_id: 1,
            contents: vec![image_block("stem.webp", 1)],
            choices: vec![crate::domain::question::Choice {
                id: 1,
                label: "A".to_owned(),
                is_correct: true,
                contents: vec![image_block("choice.webp", 1)],
            }],
            solutions: vec![crate::domain::question::Solution {
                id: 1,
                contents: vec![image_block("solution.webp", 1)],
            }],
            citations: Vec::new(),
            areas: Vec::new(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn text_blocks_pass_through_byte_identical() {
        let resolver = resolver();
        let mut contents = vec![text_block("2+2=?")];

        resolver
            .resolve_contents(&mut contents)
            .await
            .expect("resolution succeeds");
        resolver
            .resolve_contents(&mut contents)
            .await
            .expect("resolution succeeds");

        assert_eq!(contents.first().map(|c| c.value.as_str()), Some("2+2=?"));
    }

    #[rstest]
    #[tokio::test]
    async fn image_blocks_get_a_fresh_url_every_resolution() {
        let resolver = resolver();
        let mut first = vec![image_block("k.webp", 1)];
        let mut second = vec![image_block("k.webp", 1)];

        resolver
            .resolve_contents(&mut first)
            .await
            .expect("resolution succeeds");
        resolver
            .resolve_contents(&mut second)
            .await
            .expect("resolution succeeds");

        let first_url = first.first().map(|c| c.value.clone()).unwrap_or_default();
        let second_url = second.first().map(|c| c.value.clone()).unwrap_or_default();
        assert_ne!(first_url, "k.webp", "key must be replaced");
        assert_ne!(first_url, second_url, "URLs are never cached");
    }

    #[rstest]
    #[tokio::test]
    async fn summary_view_skips_choice_and_solution_contents() {
        let resolver = resolver();
        let mut question = question_with_nested_images();

        resolver
            .resolve_question(&mut question, QuestionView::Summary)
            .await
            .expect("resolution succeeds");

        let stem = question.contents.first().map(|c| c.value.clone());
        assert_ne!(stem.as_deref(), Some("stem.webp"), "stem is signed");
        let choice_value = question
            .choices
            .first()
            .and_then(|c| c.contents.first())
            .map(|c| c.value.clone());
        assert_eq!(
            choice_value.as_deref(),
            Some("choice.webp"),
            "summary view leaves nested keys untouched"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn full_view_signs_nested_contents() {
        let resolver = resolver();
        let mut question = question_with_nested_images();

        resolver
            .resolve_question(&mut question, QuestionView::Full)
            .await
            .expect("resolution succeeds");

        let choice_value = question
            .choices
            .first()
            .and_then(|c| c.contents.first())
            .map(|c| c.value.clone());
        let solution_value = question
            .solutions
            .first()
            .and_then(|c| c.contents.first())
            .map(|c| c.value.clone());
        assert_ne!(choice_value.as_deref(), Some("choice.webp"));
        assert_ne!(solution_value.as_deref(), Some("solution.webp"));
    }

    #[rstest]
    #[tokio::test]
    async fn signing_failure_fails_the_whole_read() {
        let mut storage = MockObjectStorage::new();
        storage
            .expect_sign_for_read()
            .returning(|_, _| Err(ObjectStorageError::permission_denied("no signer key")));
        let resolver = ImageReferenceResolver::new(Arc::new(storage), "exams");

        let mut contents = vec![image_block("k.webp", 1)];
        let err = resolver
            .resolve_contents(&mut contents)
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::StoragePermissionDenied);
    }
}
