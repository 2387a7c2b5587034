//! PostgreSQL-backed `QuestionRepository` implementation using Diesel ORM.
//!
//! Every mutating operation runs in a single transaction; a failure rolls
//! back the whole write before the error surfaces, so readers never observe
//! a partially applied aggregate. Cascade deletes are issued explicitly,
//! children before the root, rather than relying on store-side cascades.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::{Page, PageRequest};
use tracing::warn;

use crate::domain::assembler::QuestionAggregate;
use crate::domain::content::{Content, ContentDraft};
use crate::domain::ports::{
    COUNT_TTL, CountCache, QUESTIONS_TOTAL_COUNT, QuestionRepository, QuestionRepositoryError,
};
use crate::domain::question::{
    Choice, ChoiceUpdate, CitationUpdate, ContentUpdate, Question, QuestionFieldUpdate,
    QuestionView, Solution, SourceCitation,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    AreaRow, ChoiceChanges, ChoiceContentRow, ChoiceRow, CitationChanges, ContentChanges,
    NewChoiceContentRow, NewChoiceRow, NewQuestionContentRow, NewQuestionRow, NewQuestionSourceRow,
    NewSolutionContentRow, NewSolutionRow, QuestionAreaRow, QuestionChanges, QuestionContentRow,
    QuestionRow, QuestionSourceRow, SolutionContentRow, SolutionRow, SourceRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{
    areas, choice_contents, choices, question_areas, question_contents, question_sources,
    questions, solution_contents, solutions, sources,
};

/// Diesel-backed implementation of the question repository port.
///
/// The injected count cache serves the pagination total with a short TTL;
/// create and delete invalidate it best effort after commit.
#[derive(Clone)]
pub struct DieselQuestionRepository {
    pool: DbPool,
    cache: Arc<dyn CountCache>,
}

impl DieselQuestionRepository {
    /// Create a new repository over the given pool and count cache.
    pub fn new(pool: DbPool, cache: Arc<dyn CountCache>) -> Self {
        Self { pool, cache }
    }

    async fn invalidate_count(&self) {
        // Best effort: a failure here only extends staleness until TTL expiry.
        if let Err(err) = self.cache.invalidate(QUESTIONS_TOTAL_COUNT).await {
            warn!(error = %err, "question count cache invalidation failed");
        }
    }

    async fn total_count(&self) -> Result<u64, QuestionRepositoryError> {
        match self.cache.get(QUESTIONS_TOTAL_COUNT).await {
            Ok(Some(total)) => return Ok(total),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "count cache read failed, querying the store"),
        }

        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let total: i64 = questions::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        let total = u64::try_from(total).unwrap_or(0);

        if let Err(err) = self.cache.set(QUESTIONS_TOTAL_COUNT, total, COUNT_TTL).await {
            warn!(error = %err, "count cache write failed");
        }
        Ok(total)
    }
}

fn map_pool(error: PoolError) -> QuestionRepositoryError {
    map_pool_error(error, QuestionRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> QuestionRepositoryError {
    map_diesel_error(
        error,
        QuestionRepositoryError::query,
        QuestionRepositoryError::connection,
        QuestionRepositoryError::duplicate_key,
        QuestionRepositoryError::foreign_key,
    )
}

/// Lift a row-to-domain conversion failure into the Diesel error channel so
/// it can cross a transaction boundary.
fn conversion_error(message: String) -> diesel::result::Error {
    diesel::result::Error::DeserializationError(message.into())
}

async fn insert_content_blocks(
    conn: &mut AsyncPgConnection,
    question_id: i32,
    drafts: &[ContentDraft],
) -> Result<Vec<Content>, diesel::result::Error> {
    if drafts.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<NewQuestionContentRow<'_>> = drafts
        .iter()
        .map(|draft| NewQuestionContentRow {
            question_id,
            kind: draft.kind.as_str(),
            value: &draft.value,
            position: draft.order,
            label: draft.label.as_deref(),
        })
        .collect();
    let stored: Vec<QuestionContentRow> = diesel::insert_into(question_contents::table)
        .values(&rows)
        .returning(QuestionContentRow::as_returning())
        .get_results(conn)
        .await?;
    stored
        .into_iter()
        .map(|row| row.into_domain().map_err(conversion_error))
        .collect()
}

async fn insert_choice_contents(
    conn: &mut AsyncPgConnection,
    choice_id: i32,
    drafts: &[ContentDraft],
) -> Result<Vec<Content>, diesel::result::Error> {
    if drafts.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<NewChoiceContentRow<'_>> = drafts
        .iter()
        .map(|draft| NewChoiceContentRow {
            choice_id,
            kind: draft.kind.as_str(),
            value: &draft.value,
            position: draft.order,
            label: draft.label.as_deref(),
        })
        .collect();
    let stored: Vec<ChoiceContentRow> = diesel::insert_into(choice_contents::table)
        .values(&rows)
        .returning(ChoiceContentRow::as_returning())
        .get_results(conn)
        .await?;
    stored
        .into_iter()
        .map(|row| row.into_domain().map_err(conversion_error))
        .collect()
}

async fn insert_solution_contents(
    conn: &mut AsyncPgConnection,
    solution_id: i32,
    drafts: &[ContentDraft],
) -> Result<Vec<Content>, diesel::result::Error> {
    if drafts.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<NewSolutionContentRow<'_>> = drafts
        .iter()
        .map(|draft| NewSolutionContentRow {
            solution_id,
            kind: draft.kind.as_str(),
            value: &draft.value,
            position: draft.order,
            label: draft.label.as_deref(),
        })
        .collect();
    let stored: Vec<SolutionContentRow> = diesel::insert_into(solution_contents::table)
        .values(&rows)
        .returning(SolutionContentRow::as_returning())
        .get_results(conn)
        .await?;
    stored
        .into_iter()
        .map(|row| row.into_domain().map_err(conversion_error))
        .collect()
}

async fn insert_aggregate(
    conn: &mut AsyncPgConnection,
    aggregate: &QuestionAggregate,
) -> Result<Question, diesel::result::Error> {
    let root: QuestionRow = diesel::insert_into(questions::table)
        .values(&NewQuestionRow {
            question_hash: &aggregate.question_hash,
            question_type_id: aggregate.question_type_id,
            subtopic_id: aggregate.subtopic_id,
            difficulty_id: aggregate.difficulty_id,
        })
        .returning(QuestionRow::as_returning())
        .get_result(conn)
        .await?;

    let contents = insert_content_blocks(conn, root.id, &aggregate.contents).await?;

    let mut stored_choices = Vec::with_capacity(aggregate.choices.len());
    for choice in &aggregate.choices {
        let row: ChoiceRow = diesel::insert_into(choices::table)
            .values(&NewChoiceRow {
                question_id: root.id,
                label: &choice.label,
                is_correct: choice.is_correct,
            })
            .returning(ChoiceRow::as_returning())
            .get_result(conn)
            .await?;
        let choice_contents = insert_choice_contents(conn, row.id, &choice.contents).await?;
        stored_choices.push(Choice {
            id: row.id,
            label: row.label,
            is_correct: row.is_correct,
            contents: choice_contents,
        });
    }

    let mut stored_solutions = Vec::with_capacity(aggregate.solutions.len());
    for solution in &aggregate.solutions {
        let row: SolutionRow = diesel::insert_into(solutions::table)
            .values(&NewSolutionRow {
                question_id: root.id,
            })
            .returning(SolutionRow::as_returning())
            .get_result(conn)
            .await?;
        let solution_contents = insert_solution_contents(conn, row.id, &solution.contents).await?;
        stored_solutions.push(Solution {
            id: row.id,
            contents: solution_contents,
        });
    }

    let mut stored_citations = Vec::with_capacity(aggregate.citations.len());
    for citation in &aggregate.citations {
        let row: QuestionSourceRow = diesel::insert_into(question_sources::table)
            .values(&NewQuestionSourceRow {
                question_id: root.id,
                source_id: citation.source_id,
                page: citation.page,
            })
            .returning(QuestionSourceRow::as_returning())
            .get_result(conn)
            .await?;
        let source = aggregate
            .sources
            .iter()
            .find(|source| source.id == citation.source_id)
            .cloned()
            .ok_or_else(|| {
                conversion_error(format!("source {} missing from aggregate", citation.source_id))
            })?;
        stored_citations.push(SourceCitation {
            id: row.id,
            page: row.page,
            source,
        });
    }

    if !aggregate.areas.is_empty() {
        let links: Vec<QuestionAreaRow> = aggregate
            .areas
            .iter()
            .map(|area| QuestionAreaRow {
                question_id: root.id,
                area_id: area.id,
            })
            .collect();
        diesel::insert_into(question_areas::table)
            .values(&links)
            .execute(conn)
            .await?;
    }

    Ok(Question {
        id: root.id,
        question_hash: root.question_hash,
        question_type_id: root.question_type_id,
        subtopic_id: root.subtopic_id,
        difficulty_id: root.difficulty_id,
        contents,
        choices: stored_choices,
        solutions: stored_solutions,
        citations: stored_citations,
        areas: aggregate.areas.clone(),
    })
}

/// Load the sub-collections for a batch of roots and assemble the domain
/// aggregates, preserving root order.
async fn load_aggregates(
    conn: &mut AsyncPgConnection,
    roots: Vec<QuestionRow>,
    view: QuestionView,
) -> Result<Vec<Question>, diesel::result::Error> {
    if roots.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = roots.iter().map(|row| row.id).collect();

    let content_rows: Vec<QuestionContentRow> = question_contents::table
        .filter(question_contents::question_id.eq_any(&ids))
        .order_by((
            question_contents::question_id,
            question_contents::position,
        ))
        .select(QuestionContentRow::as_select())
        .load(conn)
        .await?;
    let mut contents_by_question: HashMap<i32, Vec<Content>> = HashMap::new();
    for row in content_rows {
        let question_id = row.question_id;
        let content = row.into_domain().map_err(conversion_error)?;
        contents_by_question
            .entry(question_id)
            .or_default()
            .push(content);
    }

    let citation_rows: Vec<(QuestionSourceRow, SourceRow)> = question_sources::table
        .inner_join(sources::table)
        .filter(question_sources::question_id.eq_any(&ids))
        .order_by(question_sources::id)
        .select((QuestionSourceRow::as_select(), SourceRow::as_select()))
        .load(conn)
        .await?;
    let mut citations_by_question: HashMap<i32, Vec<SourceCitation>> = HashMap::new();
    for (row, source) in citation_rows {
        citations_by_question
            .entry(row.question_id)
            .or_default()
            .push(SourceCitation {
                id: row.id,
                page: row.page,
                source: source.into(),
            });
    }

    let area_rows: Vec<(i32, AreaRow)> = question_areas::table
        .inner_join(areas::table)
        .filter(question_areas::question_id.eq_any(&ids))
        .order_by(question_areas::area_id)
        .select((question_areas::question_id, AreaRow::as_select()))
        .load(conn)
        .await?;
    let mut areas_by_question: HashMap<i32, Vec<crate::domain::question::Area>> = HashMap::new();
    for (question_id, row) in area_rows {
        areas_by_question
            .entry(question_id)
            .or_default()
            .push(row.into());
    }

    let mut choices_by_question: HashMap<i32, Vec<Choice>> = HashMap::new();
    let mut solutions_by_question: HashMap<i32, Vec<Solution>> = HashMap::new();
    if view == QuestionView::Full {
        let choice_rows: Vec<ChoiceRow> = choices::table
            .filter(choices::question_id.eq_any(&ids))
            .order_by((choices::question_id, choices::id))
            .select(ChoiceRow::as_select())
            .load(conn)
            .await?;
        let choice_ids: Vec<i32> = choice_rows.iter().map(|row| row.id).collect();
        let mut choice_contents_by_choice: HashMap<i32, Vec<Content>> = HashMap::new();
        if !choice_ids.is_empty() {
            let rows: Vec<ChoiceContentRow> = choice_contents::table
                .filter(choice_contents::choice_id.eq_any(&choice_ids))
                .order_by((choice_contents::choice_id, choice_contents::position))
                .select(ChoiceContentRow::as_select())
                .load(conn)
                .await?;
            for row in rows {
                let choice_id = row.choice_id;
                let content = row.into_domain().map_err(conversion_error)?;
                choice_contents_by_choice
                    .entry(choice_id)
                    .or_default()
                    .push(content);
            }
        }
        for row in choice_rows {
            let contents = choice_contents_by_choice.remove(&row.id).unwrap_or_default();
            choices_by_question
                .entry(row.question_id)
                .or_default()
                .push(Choice {
                    id: row.id,
                    label: row.label,
                    is_correct: row.is_correct,
                    contents,
                });
        }

        let solution_rows: Vec<SolutionRow> = solutions::table
            .filter(solutions::question_id.eq_any(&ids))
            .order_by((solutions::question_id, solutions::id))
            .select(SolutionRow::as_select())
            .load(conn)
            .await?;
        let solution_ids: Vec<i32> = solution_rows.iter().map(|row| row.id).collect();
        let mut solution_contents_by_solution: HashMap<i32, Vec<Content>> = HashMap::new();
        if !solution_ids.is_empty() {
            let rows: Vec<SolutionContentRow> = solution_contents::table
                .filter(solution_contents::solution_id.eq_any(&solution_ids))
                .order_by((
                    solution_contents::solution_id,
                    solution_contents::position,
                ))
                .select(SolutionContentRow::as_select())
                .load(conn)
                .await?;
            for row in rows {
                let solution_id = row.solution_id;
                let content = row.into_domain().map_err(conversion_error)?;
                solution_contents_by_solution
                    .entry(solution_id)
                    .or_default()
                    .push(content);
            }
        }
        for row in solution_rows {
            let contents = solution_contents_by_solution
                .remove(&row.id)
                .unwrap_or_default();
            solutions_by_question
                .entry(row.question_id)
                .or_default()
                .push(Solution {
                    id: row.id,
                    contents,
                });
        }
    }

    Ok(roots
        .into_iter()
        .map(|root| Question {
            id: root.id,
            question_hash: root.question_hash,
            question_type_id: root.question_type_id,
            subtopic_id: root.subtopic_id,
            difficulty_id: root.difficulty_id,
            contents: contents_by_question.remove(&root.id).unwrap_or_default(),
            choices: choices_by_question.remove(&root.id).unwrap_or_default(),
            solutions: solutions_by_question.remove(&root.id).unwrap_or_default(),
            citations: citations_by_question.remove(&root.id).unwrap_or_default(),
            areas: areas_by_question.remove(&root.id).unwrap_or_default(),
        })
        .collect())
}

async fn load_choice(
    conn: &mut AsyncPgConnection,
    question_id: i32,
    choice_id: i32,
) -> Result<Option<Choice>, diesel::result::Error> {
    let row: Option<ChoiceRow> = choices::table
        .filter(choices::question_id.eq(question_id))
        .filter(choices::id.eq(choice_id))
        .select(ChoiceRow::as_select())
        .first(conn)
        .await
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let content_rows: Vec<ChoiceContentRow> = choice_contents::table
        .filter(choice_contents::choice_id.eq(row.id))
        .order_by(choice_contents::position)
        .select(ChoiceContentRow::as_select())
        .load(conn)
        .await?;
    let contents = content_rows
        .into_iter()
        .map(|content_row| content_row.into_domain().map_err(conversion_error))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Choice {
        id: row.id,
        label: row.label,
        is_correct: row.is_correct,
        contents,
    }))
}

async fn load_solution(
    conn: &mut AsyncPgConnection,
    question_id: i32,
    solution_id: i32,
) -> Result<Option<Solution>, diesel::result::Error> {
    let row: Option<SolutionRow> = solutions::table
        .filter(solutions::question_id.eq(question_id))
        .filter(solutions::id.eq(solution_id))
        .select(SolutionRow::as_select())
        .first(conn)
        .await
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let content_rows: Vec<SolutionContentRow> = solution_contents::table
        .filter(solution_contents::solution_id.eq(row.id))
        .order_by(solution_contents::position)
        .select(SolutionContentRow::as_select())
        .load(conn)
        .await?;
    let contents = content_rows
        .into_iter()
        .map(|content_row| content_row.into_domain().map_err(conversion_error))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Solution {
        id: row.id,
        contents,
    }))
}

#[async_trait]
impl QuestionRepository for DieselQuestionRepository {
    async fn create_aggregate(
        &self,
        aggregate: &QuestionAggregate,
    ) -> Result<Question, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let created = conn
            .transaction(|conn| insert_aggregate(conn, aggregate).scope_boxed())
            .await
            .map_err(map_diesel)?;

        self.invalidate_count().await;
        Ok(created)
    }

    async fn get_page(
        &self,
        request: PageRequest,
        view: QuestionView,
    ) -> Result<Page<Question>, QuestionRepositoryError> {
        let total = self.total_count().await?;

        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let limit = i64::from(request.limit());
        let offset = request.offset();

        // One transaction so roots and sub-collections observe a consistent
        // snapshot.
        let items = conn
            .transaction(|conn| {
                async move {
                    let roots: Vec<QuestionRow> = questions::table
                        .order_by(questions::id)
                        .limit(limit)
                        .offset(offset)
                        .select(QuestionRow::as_select())
                        .load(conn)
                        .await?;
                    load_aggregates(conn, roots, view).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        Ok(Page::new(items, total, request))
    }

    async fn get_by_id(
        &self,
        id: i32,
        view: QuestionView,
    ) -> Result<Option<Question>, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut loaded = conn
            .transaction(|conn| {
                async move {
                    let root: Option<QuestionRow> = questions::table
                        .find(id)
                        .select(QuestionRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    match root {
                        Some(root) => load_aggregates(conn, vec![root], view).await,
                        None => Ok(Vec::new()),
                    }
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        Ok(loaded.pop())
    }

    async fn exists(&self, id: i32) -> Result<bool, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let found: Option<i32> = questions::table
            .find(id)
            .select(questions::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        Ok(found.is_some())
    }

    async fn update_fields(
        &self,
        id: i32,
        update: QuestionFieldUpdate,
    ) -> Result<bool, QuestionRepositoryError> {
        if update.is_empty() {
            return self.exists(id).await;
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        conn.transaction(|conn| {
            async move {
                let changes = QuestionChanges {
                    question_type_id: update.question_type_id,
                    subtopic_id: update.subtopic_id,
                    difficulty_id: update.difficulty_id,
                };

                let found = if update.question_type_id.is_some()
                    || update.subtopic_id.is_some()
                    || update.difficulty_id.is_some()
                {
                    diesel::update(questions::table.find(id))
                        .set(&changes)
                        .execute(conn)
                        .await?
                        > 0
                } else {
                    questions::table
                        .find(id)
                        .select(questions::id)
                        .first::<i32>(conn)
                        .await
                        .optional()?
                        .is_some()
                };

                if !found {
                    return Ok(false);
                }

                if let Some(area_ids) = &update.area_ids {
                    diesel::delete(
                        question_areas::table.filter(question_areas::question_id.eq(id)),
                    )
                    .execute(conn)
                    .await?;
                    let links: Vec<QuestionAreaRow> = area_ids
                        .iter()
                        .map(|area_id| QuestionAreaRow {
                            question_id: id,
                            area_id: *area_id,
                        })
                        .collect();
                    if !links.is_empty() {
                        diesel::insert_into(question_areas::table)
                            .values(&links)
                            .execute(conn)
                            .await?;
                    }
                }

                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn delete(&self, id: i32) -> Result<bool, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let deleted = conn
            .transaction(|conn| {
                async move {
                    let choice_ids: Vec<i32> = choices::table
                        .filter(choices::question_id.eq(id))
                        .select(choices::id)
                        .load(conn)
                        .await?;
                    if !choice_ids.is_empty() {
                        diesel::delete(
                            choice_contents::table
                                .filter(choice_contents::choice_id.eq_any(&choice_ids)),
                        )
                        .execute(conn)
                        .await?;
                    }
                    diesel::delete(choices::table.filter(choices::question_id.eq(id)))
                        .execute(conn)
                        .await?;

                    let solution_ids: Vec<i32> = solutions::table
                        .filter(solutions::question_id.eq(id))
                        .select(solutions::id)
                        .load(conn)
                        .await?;
                    if !solution_ids.is_empty() {
                        diesel::delete(
                            solution_contents::table
                                .filter(solution_contents::solution_id.eq_any(&solution_ids)),
                        )
                        .execute(conn)
                        .await?;
                    }
                    diesel::delete(solutions::table.filter(solutions::question_id.eq(id)))
                        .execute(conn)
                        .await?;

                    diesel::delete(
                        question_contents::table.filter(question_contents::question_id.eq(id)),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(
                        question_sources::table.filter(question_sources::question_id.eq(id)),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(
                        question_areas::table.filter(question_areas::question_id.eq(id)),
                    )
                    .execute(conn)
                    .await?;

                    let removed = diesel::delete(questions::table.find(id))
                        .execute(conn)
                        .await?;
                    Ok(removed > 0)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        if deleted {
            self.invalidate_count().await;
        }
        Ok(deleted)
    }

    async fn find_content(
        &self,
        question_id: i32,
        content_id: i32,
    ) -> Result<Option<Content>, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: Option<QuestionContentRow> = question_contents::table
            .filter(question_contents::question_id.eq(question_id))
            .filter(question_contents::id.eq(content_id))
            .select(QuestionContentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(|row| row.into_domain().map_err(QuestionRepositoryError::query))
            .transpose()
    }

    async fn list_contents(
        &self,
        question_id: i32,
    ) -> Result<Vec<Content>, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let rows: Vec<QuestionContentRow> = question_contents::table
            .filter(question_contents::question_id.eq(question_id))
            .order_by(question_contents::position)
            .select(QuestionContentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        rows.into_iter()
            .map(|row| row.into_domain().map_err(QuestionRepositoryError::query))
            .collect()
    }

    async fn update_content(
        &self,
        question_id: i32,
        content_id: i32,
        update: ContentUpdate,
        question_hash: &str,
    ) -> Result<Content, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = conn
            .transaction(|conn| {
                async move {
                    let changes = ContentChanges {
                        kind: update.kind.map(|kind| kind.as_str()),
                        value: update.value.as_deref(),
                        position: update.order,
                        label: update.label.as_deref(),
                    };
                    let has_changes = changes.kind.is_some()
                        || changes.value.is_some()
                        || changes.position.is_some()
                        || changes.label.is_some();

                    let row: QuestionContentRow = if has_changes {
                        diesel::update(
                            question_contents::table
                                .filter(question_contents::question_id.eq(question_id))
                                .filter(question_contents::id.eq(content_id)),
                        )
                        .set(&changes)
                        .returning(QuestionContentRow::as_returning())
                        .get_result(conn)
                        .await?
                    } else {
                        question_contents::table
                            .filter(question_contents::question_id.eq(question_id))
                            .filter(question_contents::id.eq(content_id))
                            .select(QuestionContentRow::as_select())
                            .first(conn)
                            .await?
                    };

                    // The fingerprint depends on the content list, so it is
                    // persisted in the same transaction as the block.
                    diesel::update(questions::table.find(question_id))
                        .set(questions::question_hash.eq(question_hash))
                        .execute(conn)
                        .await?;

                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        row.into_domain().map_err(QuestionRepositoryError::query)
    }

    async fn find_choice(
        &self,
        question_id: i32,
        choice_id: i32,
    ) -> Result<Option<Choice>, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        load_choice(&mut conn, question_id, choice_id)
            .await
            .map_err(map_diesel)
    }

    async fn correct_choices_excluding(
        &self,
        question_id: i32,
        exclude_choice_id: i32,
    ) -> Result<i64, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        choices::table
            .filter(choices::question_id.eq(question_id))
            .filter(choices::id.ne(exclude_choice_id))
            .filter(choices::is_correct.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn choice_text_values_excluding(
        &self,
        question_id: i32,
        exclude_choice_id: i32,
    ) -> Result<Vec<String>, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        choice_contents::table
            .inner_join(choices::table)
            .filter(choices::question_id.eq(question_id))
            .filter(choices::id.ne(exclude_choice_id))
            .filter(choice_contents::kind.eq("text"))
            .select(choice_contents::value)
            .load(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn update_choice(
        &self,
        question_id: i32,
        choice_id: i32,
        update: ChoiceUpdate,
        demote_others: bool,
    ) -> Result<Choice, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let update_ref = &update;
        conn.transaction(|conn| {
            async move {
                if demote_others {
                    diesel::update(
                        choices::table
                            .filter(choices::question_id.eq(question_id))
                            .filter(choices::id.ne(choice_id)),
                    )
                    .set(choices::is_correct.eq(false))
                    .execute(conn)
                    .await?;
                }

                let changes = ChoiceChanges {
                    label: update_ref.label.as_deref(),
                    is_correct: update_ref.is_correct,
                };
                if changes.label.is_some() || changes.is_correct.is_some() {
                    diesel::update(
                        choices::table
                            .filter(choices::question_id.eq(question_id))
                            .filter(choices::id.eq(choice_id)),
                    )
                    .set(&changes)
                    .execute(conn)
                    .await?;
                }

                if let Some(contents) = &update_ref.contents {
                    diesel::delete(
                        choice_contents::table.filter(choice_contents::choice_id.eq(choice_id)),
                    )
                    .execute(conn)
                    .await?;
                    insert_choice_contents(conn, choice_id, contents).await?;
                }

                load_choice(conn, question_id, choice_id)
                    .await?
                    .ok_or(diesel::result::Error::NotFound)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn find_solution(
        &self,
        question_id: i32,
        solution_id: i32,
    ) -> Result<Option<Solution>, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        load_solution(&mut conn, question_id, solution_id)
            .await
            .map_err(map_diesel)
    }

    async fn replace_solution_contents(
        &self,
        question_id: i32,
        solution_id: i32,
        contents: &[ContentDraft],
    ) -> Result<Solution, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        conn.transaction(|conn| {
            async move {
                diesel::delete(
                    solution_contents::table
                        .filter(solution_contents::solution_id.eq(solution_id)),
                )
                .execute(conn)
                .await?;
                insert_solution_contents(conn, solution_id, contents).await?;

                load_solution(conn, question_id, solution_id)
                    .await?
                    .ok_or(diesel::result::Error::NotFound)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn find_citation(
        &self,
        question_id: i32,
        citation_id: i32,
    ) -> Result<Option<SourceCitation>, QuestionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: Option<(QuestionSourceRow, SourceRow)> = question_sources::table
            .inner_join(sources::table)
            .filter(question_sources::question_id.eq(question_id))
            .filter(question_sources::id.eq(citation_id))
            .select((QuestionSourceRow::as_select(), SourceRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        Ok(row.map(|(citation, source)| SourceCitation {
            id: citation.id,
            page: citation.page,
            source: source.into(),
        }))
    }

    async fn update_citation(
        &self,
        question_id: i32,
        citation_id: i32,
        update: CitationUpdate,
    ) -> Result<(), QuestionRepositoryError> {
        let changes = CitationChanges {
            source_id: update.source_id,
            page: update.page,
        };
        if changes.source_id.is_none() && changes.page.is_none() {
            return Ok(());
        }

        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let updated = diesel::update(
            question_sources::table
                .filter(question_sources::question_id.eq(question_id))
                .filter(question_sources::id.eq(citation_id)),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        if updated == 0 {
            return Err(QuestionRepositoryError::query(format!(
                "citation {citation_id} vanished from question {question_id}"
            )));
        }
        Ok(())
    }
}
