//! Domain ports: the traits outbound adapters implement.
//!
//! Each port ships its own error enum (generated by `define_port_error!`)
//! and a fixture implementation for tests and infrastructure-less boots.

mod area_repository;
mod count_cache;
mod macros;
mod object_storage;
mod question_repository;
mod source_repository;

pub use area_repository::{AreaRepository, AreaRepositoryError, FixtureAreaRepository};
pub use count_cache::{
    COUNT_TTL, CountCache, CountCacheError, NoOpCountCache, QUESTIONS_TOTAL_COUNT,
};
pub use object_storage::{MemoryObjectStorage, ObjectStorage, ObjectStorageError};
pub use question_repository::{
    FixtureQuestionRepository, QuestionRepository, QuestionRepositoryError,
};
pub use source_repository::{FixtureSourceRepository, SourceRepository, SourceRepositoryError};

#[cfg(test)]
pub use area_repository::MockAreaRepository;
#[cfg(test)]
pub use count_cache::MockCountCache;
#[cfg(test)]
pub use object_storage::MockObjectStorage;
#[cfg(test)]
pub use question_repository::MockQuestionRepository;
#[cfg(test)]
pub use source_repository::MockSourceRepository;
