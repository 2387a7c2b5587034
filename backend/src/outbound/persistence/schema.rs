//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly; Diesel uses
//! them for compile-time query validation and type-safe SQL generation.

diesel::table! {
    /// Question aggregate roots.
    questions (id) {
        /// Primary key.
        id -> Int4,
        /// SHA-256 fingerprint of the textual stem; unique.
        question_hash -> Varchar,
        /// Taxonomy reference: question type.
        question_type_id -> Int4,
        /// Taxonomy reference: subtopic.
        subtopic_id -> Int4,
        /// Taxonomy reference: difficulty.
        difficulty_id -> Int4,
    }
}

diesel::table! {
    /// Statement content blocks owned by a question.
    question_contents (id) {
        /// Primary key.
        id -> Int4,
        /// Owning question.
        question_id -> Int4,
        /// Block kind: `text` or `image`.
        kind -> Varchar,
        /// Text body, or an object-storage key for image blocks.
        value -> Text,
        /// Display and hashing order, starting at 1.
        position -> Int4,
        /// Optional single-character display label.
        label -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Multiple-choice alternatives owned by a question.
    choices (id) {
        /// Primary key.
        id -> Int4,
        /// Owning question.
        question_id -> Int4,
        /// Single-letter display label.
        label -> Varchar,
        /// Whether this alternative answers the question.
        is_correct -> Bool,
    }
}

diesel::table! {
    /// Content blocks owned by a choice.
    choice_contents (id) {
        /// Primary key.
        id -> Int4,
        /// Owning choice.
        choice_id -> Int4,
        /// Block kind: `text` or `image`.
        kind -> Varchar,
        /// Text body, or an object-storage key for image blocks.
        value -> Text,
        /// Display and hashing order, starting at 1.
        position -> Int4,
        /// Optional single-character display label.
        label -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Worked solutions owned by a question.
    solutions (id) {
        /// Primary key.
        id -> Int4,
        /// Owning question.
        question_id -> Int4,
    }
}

diesel::table! {
    /// Content blocks owned by a solution.
    solution_contents (id) {
        /// Primary key.
        id -> Int4,
        /// Owning solution.
        solution_id -> Int4,
        /// Block kind: `text` or `image`.
        kind -> Varchar,
        /// Text body, or an object-storage key for image blocks.
        value -> Text,
        /// Display and hashing order, starting at 1.
        position -> Int4,
        /// Optional single-character display label.
        label -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Source citations owned by a question.
    question_sources (id) {
        /// Primary key.
        id -> Int4,
        /// Owning question.
        question_id -> Int4,
        /// Cited source.
        source_id -> Int4,
        /// Cited page, positive.
        page -> Int4,
    }
}

diesel::table! {
    /// Curricular areas (reference data).
    areas (id) {
        /// Primary key.
        id -> Int4,
        /// Short area code, unique.
        code -> Varchar,
        /// Human-readable name.
        name -> Varchar,
    }
}

diesel::table! {
    /// Question-to-area association.
    question_areas (question_id, area_id) {
        /// Associated question.
        question_id -> Int4,
        /// Associated area.
        area_id -> Int4,
    }
}

diesel::table! {
    /// Exam sources (reference data).
    sources (id) {
        /// Primary key.
        id -> Int4,
        /// Source name.
        name -> Varchar,
        /// Publication year.
        year -> Int4,
        /// Owning institution.
        institution_id -> Int4,
    }
}

diesel::table! {
    /// Institutions owning sources (reference data).
    institutions (id) {
        /// Primary key.
        id -> Int4,
        /// Institution name.
        name -> Varchar,
    }
}

diesel::joinable!(question_contents -> questions (question_id));
diesel::joinable!(choices -> questions (question_id));
diesel::joinable!(choice_contents -> choices (choice_id));
diesel::joinable!(solutions -> questions (question_id));
diesel::joinable!(solution_contents -> solutions (solution_id));
diesel::joinable!(question_sources -> questions (question_id));
diesel::joinable!(question_sources -> sources (source_id));
diesel::joinable!(question_areas -> questions (question_id));
diesel::joinable!(question_areas -> areas (area_id));
diesel::joinable!(sources -> institutions (institution_id));

diesel::allow_tables_to_appear_in_same_query!(
    questions,
    question_contents,
    choices,
    choice_contents,
    solutions,
    solution_contents,
    question_sources,
    areas,
    question_areas,
    sources,
    institutions,
);
