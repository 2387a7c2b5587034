//! Domain entities, invariants, services, and ports.
//!
//! Everything here is transport and storage agnostic: the inbound HTTP
//! adapter and the outbound persistence/storage/cache adapters depend on
//! this module, never the other way around.

pub mod assembler;
pub mod content;
pub mod error;
pub mod hash;
pub mod image_service;
pub mod ports;
pub mod question;
pub mod question_service;
pub mod section_services;
pub mod signing;
pub mod validation;

pub use self::assembler::QuestionAggregate;
pub use self::content::{Content, ContentDraft, ContentKind};
pub use self::error::{Error, ErrorCode};
pub use self::image_service::{ALLOWED_IMAGE_TYPES, ImageSection, ImageService};
pub use self::question::{
    Area, Choice, ChoiceDraft, ChoiceUpdate, CitationDraft, CitationUpdate, ContentUpdate,
    NewQuestion, Question, QuestionFieldUpdate, QuestionView, Solution, SolutionDraft, Source,
    SourceCitation,
};
pub use self::question_service::QuestionService;
pub use self::section_services::{
    ChoiceSectionService, CitationSectionService, ContentSectionService, QuestionGuard,
    SolutionSectionService,
};
pub use self::signing::ImageReferenceResolver;

/// Convenient result alias for domain operations.
pub type ApiResult<T> = Result<T, Error>;
