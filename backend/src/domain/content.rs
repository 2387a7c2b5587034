//! Content blocks owned by questions, choices, and solutions.
//!
//! A content block is either raw text or an image reference. At rest an image
//! block's `value` holds an opaque object-storage key; it is only swapped for
//! a signed URL in memory at read time, never in the store.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of content block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Raw display text.
    Text,
    /// Reference to an object in storage.
    Image,
}

impl ContentKind {
    /// The stored string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }

    /// Parse the stored representation back into the kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// A persisted content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Row identity.
    pub id: i32,
    /// Block kind; drives hashing and signing behaviour.
    pub kind: ContentKind,
    /// Text body, or an object-storage key when `kind` is image.
    pub value: String,
    /// Display and hashing order within the owning entity, starting at 1.
    pub order: i32,
    /// Optional single-character display label.
    pub label: Option<String>,
}

/// A content block as submitted by a caller, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDraft {
    /// Block kind.
    pub kind: ContentKind,
    /// Text body, or an object-storage key when `kind` is image.
    pub value: String,
    /// Display and hashing order within the owning entity, starting at 1.
    pub order: i32,
    /// Optional single-character display label.
    pub label: Option<String>,
}

/// Normalise a text value for comparison and fingerprinting: surrounding
/// whitespace is trimmed and the result lower-cased.
#[must_use]
pub fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}
