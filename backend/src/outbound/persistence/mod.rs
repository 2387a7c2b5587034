//! Diesel-backed persistence adapters.

mod diesel_area_repository;
mod diesel_question_repository;
mod diesel_source_repository;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_area_repository::DieselAreaRepository;
pub use diesel_question_repository::DieselQuestionRepository;
pub use diesel_source_repository::DieselSourceRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
