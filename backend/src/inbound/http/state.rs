//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle via `actix_web::web::Data`, so they depend
//! only on domain services and stay testable without real infrastructure.

use crate::domain::{
    ChoiceSectionService, CitationSectionService, ContentSectionService, ImageService,
    QuestionService, SolutionSectionService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Question aggregate orchestration.
    pub questions: QuestionService,
    /// Statement content section updates.
    pub contents: ContentSectionService,
    /// Choice section updates.
    pub choices: ChoiceSectionService,
    /// Solution section updates.
    pub solutions: SolutionSectionService,
    /// Source citation section updates.
    pub citations: CitationSectionService,
    /// Image intake.
    pub images: ImageService,
}
