//! Content fingerprinting for duplicate detection.
//!
//! A question's fingerprint is the SHA-256 of the lower-cased, trimmed text
//! of its statement blocks taken in `order`, stopping at the first image
//! block. Trailing content after the first image never contributes, so the
//! fingerprint identifies the textual stem regardless of attached figures.

use sha2::{Digest, Sha256};

use crate::domain::content::{Content, ContentDraft, ContentKind};

/// A content block's contribution to the fingerprint.
pub trait FingerprintSource {
    /// Block kind; image blocks terminate the fingerprint input.
    fn kind(&self) -> ContentKind;
    /// Raw text value.
    fn value(&self) -> &str;
    /// Position within the owning list.
    fn order(&self) -> i32;
}

impl FingerprintSource for ContentDraft {
    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn order(&self) -> i32 {
        self.order
    }
}

impl FingerprintSource for Content {
    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn order(&self) -> i32 {
        self.order
    }
}

/// Compute the hex-encoded SHA-256 fingerprint of a content list.
///
/// The input sequence order is irrelevant: blocks are sorted by their
/// `order` field first. A list whose first block is an image fingerprints
/// the empty string; by consequence any two such questions collide, which
/// the duplicate check then rejects (see DESIGN.md).
#[must_use]
pub fn question_fingerprint<T: FingerprintSource>(contents: &[T]) -> String {
    let mut sorted: Vec<&T> = contents.iter().collect();
    sorted.sort_by_key(|content| content.order());

    let mut base = String::new();
    for content in sorted {
        if content.kind() == ContentKind::Image {
            break;
        }
        base.push_str(&crate::domain::content::normalize_text(content.value()));
    }

    let digest = Sha256::digest(base.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    fn text(value: &str, order: i32) -> ContentDraft {
        ContentDraft {
            kind: ContentKind::Text,
            value: value.to_owned(),
            order,
            label: None,
        }
    }

    fn image(key: &str, order: i32) -> ContentDraft {
        ContentDraft {
            kind: ContentKind::Image,
            value: key.to_owned(),
            order,
            label: None,
        }
    }

    #[rstest]
    fn fingerprint_is_a_function_of_value_order_pairs_not_sequence_order() {
        let in_order = vec![text("first", 1), text("second", 2), text("third", 3)];
        let shuffled = vec![text("third", 3), text("first", 1), text("second", 2)];

        assert_eq!(
            question_fingerprint(&in_order),
            question_fingerprint(&shuffled)
        );
    }

    #[rstest]
    fn fingerprint_stops_at_first_image() {
        let with_trailing_text = vec![text("abc", 1), image("k", 2), text("xyz", 3)];
        let different_image_key = vec![text("abc", 1), image("k2", 2)];

        assert_eq!(
            question_fingerprint(&with_trailing_text),
            question_fingerprint(&different_image_key)
        );
    }

    #[rstest]
    fn fingerprint_ignores_whitespace_and_case() {
        let noisy = vec![text("  2+2=? ", 1)];
        let clean = vec![text("2+2=?", 1)];

        assert_eq!(question_fingerprint(&noisy), question_fingerprint(&clean));
    }

    #[rstest]
    fn distinct_text_produces_distinct_fingerprints() {
        let a = vec![text("2+2=?", 1)];
        let b = vec![text("2+3=?", 1)];

        assert_ne!(question_fingerprint(&a), question_fingerprint(&b));
    }

    #[rstest]
    fn image_only_question_fingerprints_the_empty_string() {
        let image_only = vec![image("diagram.webp", 1)];
        let empty: Vec<ContentDraft> = Vec::new();

        assert_eq!(
            question_fingerprint(&image_only),
            question_fingerprint(&empty)
        );
        // SHA-256 of the empty string, fixed by the algorithm.
        assert_eq!(
            question_fingerprint(&empty),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[rstest]
    fn fingerprint_is_sixty_four_hex_characters() {
        let fingerprint = question_fingerprint(&[text("stem", 1)]);
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
