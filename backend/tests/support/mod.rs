//! Shared test doubles and payload builders for the integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use qbank::domain::ports::{QuestionRepository, QuestionRepositoryError};
use qbank::domain::{
    Area, Choice, ChoiceDraft, ChoiceUpdate, CitationDraft, CitationUpdate, Content, ContentDraft,
    ContentKind, ContentUpdate, NewQuestion, Question, QuestionAggregate, QuestionFieldUpdate,
    QuestionView, Solution, SolutionDraft, Source, SourceCitation,
};

/// In-memory implementation of the question repository port.
///
/// Mirrors the store contract the Diesel adapter provides: id assignment,
/// hash uniqueness enforced at write time, wholesale sub-collection
/// replacement, and cascade delete of owned children.
#[derive(Default)]
pub struct InMemoryQuestionBank {
    state: Mutex<BankState>,
}

#[derive(Default)]
struct BankState {
    questions: Vec<Question>,
    next_question_id: i32,
    next_child_id: i32,
}

impl BankState {
    fn question_id(&mut self) -> i32 {
        self.next_question_id += 1;
        self.next_question_id
    }

    fn child_id(&mut self) -> i32 {
        self.next_child_id += 1;
        self.next_child_id
    }

    fn materialise(&mut self, drafts: &[ContentDraft]) -> Vec<Content> {
        drafts
            .iter()
            .map(|draft| Content {
                id: self.child_id(),
                kind: draft.kind,
                value: draft.value.clone(),
                order: draft.order,
                label: draft.label.clone(),
            })
            .collect()
    }
}

fn strip_for_view(mut question: Question, view: QuestionView) -> Question {
    if view == QuestionView::Summary {
        question.choices = Vec::new();
        question.solutions = Vec::new();
    }
    question
}

fn placeholder_area(id: i32) -> Area {
    Area {
        id,
        code: format!("A{id}"),
        name: format!("Area {id}"),
    }
}

fn placeholder_source(id: i32) -> Source {
    Source {
        id,
        name: format!("Source {id}"),
        year: 2020,
        institution_id: 1,
    }
}

impl InMemoryQuestionBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BankState>, QuestionRepositoryError> {
        self.state
            .lock()
            .map_err(|_| QuestionRepositoryError::connection("bank lock poisoned"))
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionBank {
    async fn create_aggregate(
        &self,
        aggregate: &QuestionAggregate,
    ) -> Result<Question, QuestionRepositoryError> {
        let mut state = self.lock()?;

        if state
            .questions
            .iter()
            .any(|question| question.question_hash == aggregate.question_hash)
        {
            return Err(QuestionRepositoryError::duplicate_key(
                "questions_question_hash_key",
            ));
        }

        let id = state.question_id();
        let contents = state.materialise(&aggregate.contents);
        let choices = aggregate
            .choices
            .iter()
            .map(|choice| {
                let choice_contents = state.materialise(&choice.contents);
                Choice {
                    id: state.child_id(),
                    label: choice.label.clone(),
                    is_correct: choice.is_correct,
                    contents: choice_contents,
                }
            })
            .collect();
        let solutions = aggregate
            .solutions
            .iter()
            .map(|solution| {
                let solution_contents = state.materialise(&solution.contents);
                Solution {
                    id: state.child_id(),
                    contents: solution_contents,
                }
            })
            .collect();
        let citations = aggregate
            .citations
            .iter()
            .map(|citation| {
                let source = aggregate
                    .sources
                    .iter()
                    .find(|source| source.id == citation.source_id)
                    .cloned()
                    .unwrap_or_else(|| placeholder_source(citation.source_id));
                SourceCitation {
                    id: state.child_id(),
                    page: citation.page,
                    source,
                }
            })
            .collect();

        let question = Question {
            id,
            question_hash: aggregate.question_hash.clone(),
            question_type_id: aggregate.question_type_id,
            subtopic_id: aggregate.subtopic_id,
            difficulty_id: aggregate.difficulty_id,
            contents,
            choices,
            solutions,
            citations,
            areas: aggregate.areas.clone(),
        };
        state.questions.push(question.clone());
        Ok(question)
    }

    async fn get_page(
        &self,
        request: PageRequest,
        view: QuestionView,
    ) -> Result<Page<Question>, QuestionRepositoryError> {
        let state = self.lock()?;
        let total = state.questions.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(0);
        let items = state
            .questions
            .iter()
            .skip(offset)
            .take(request.limit() as usize)
            .cloned()
            .map(|question| strip_for_view(question, view))
            .collect();
        Ok(Page::new(items, total, request))
    }

    async fn get_by_id(
        &self,
        id: i32,
        view: QuestionView,
    ) -> Result<Option<Question>, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == id)
            .cloned()
            .map(|question| strip_for_view(question, view)))
    }

    async fn exists(&self, id: i32) -> Result<bool, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state.questions.iter().any(|question| question.id == id))
    }

    async fn update_fields(
        &self,
        id: i32,
        update: QuestionFieldUpdate,
    ) -> Result<bool, QuestionRepositoryError> {
        let mut state = self.lock()?;
        let Some(question) = state.questions.iter_mut().find(|question| question.id == id) else {
            return Ok(false);
        };
        if let Some(question_type_id) = update.question_type_id {
            question.question_type_id = question_type_id;
        }
        if let Some(subtopic_id) = update.subtopic_id {
            question.subtopic_id = subtopic_id;
        }
        if let Some(difficulty_id) = update.difficulty_id {
            question.difficulty_id = difficulty_id;
        }
        if let Some(area_ids) = update.area_ids {
            question.areas = area_ids.into_iter().map(placeholder_area).collect();
        }
        Ok(true)
    }

    async fn delete(&self, id: i32) -> Result<bool, QuestionRepositoryError> {
        let mut state = self.lock()?;
        let before = state.questions.len();
        state.questions.retain(|question| question.id != id);
        Ok(state.questions.len() < before)
    }

    async fn find_content(
        &self,
        question_id: i32,
        content_id: i32,
    ) -> Result<Option<Content>, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .and_then(|question| {
                question
                    .contents
                    .iter()
                    .find(|content| content.id == content_id)
                    .cloned()
            }))
    }

    async fn list_contents(
        &self,
        question_id: i32,
    ) -> Result<Vec<Content>, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .map(|question| question.contents.clone())
            .unwrap_or_default())
    }

    async fn update_content(
        &self,
        question_id: i32,
        content_id: i32,
        update: ContentUpdate,
        question_hash: &str,
    ) -> Result<Content, QuestionRepositoryError> {
        let mut state = self.lock()?;
        let question = state
            .questions
            .iter_mut()
            .find(|question| question.id == question_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;

        question.question_hash = question_hash.to_owned();
        let content = question
            .contents
            .iter_mut()
            .find(|content| content.id == content_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;

        if let Some(kind) = update.kind {
            content.kind = kind;
        }
        if let Some(value) = update.value {
            content.value = value;
        }
        if let Some(order) = update.order {
            content.order = order;
        }
        if let Some(label) = update.label {
            content.label = Some(label);
        }
        Ok(content.clone())
    }

    async fn find_choice(
        &self,
        question_id: i32,
        choice_id: i32,
    ) -> Result<Option<Choice>, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .and_then(|question| {
                question
                    .choices
                    .iter()
                    .find(|choice| choice.id == choice_id)
                    .cloned()
            }))
    }

    async fn correct_choices_excluding(
        &self,
        question_id: i32,
        exclude_choice_id: i32,
    ) -> Result<i64, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .map(|question| {
                question
                    .choices
                    .iter()
                    .filter(|choice| choice.id != exclude_choice_id && choice.is_correct)
                    .count() as i64
            })
            .unwrap_or(0))
    }

    async fn choice_text_values_excluding(
        &self,
        question_id: i32,
        exclude_choice_id: i32,
    ) -> Result<Vec<String>, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .map(|question| {
                question
                    .choices
                    .iter()
                    .filter(|choice| choice.id != exclude_choice_id)
                    .flat_map(|choice| &choice.contents)
                    .filter(|content| content.kind == ContentKind::Text)
                    .map(|content| content.value.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_choice(
        &self,
        question_id: i32,
        choice_id: i32,
        update: ChoiceUpdate,
        demote_others: bool,
    ) -> Result<Choice, QuestionRepositoryError> {
        let mut state = self.lock()?;
        let question = state
            .questions
            .iter_mut()
            .find(|question| question.id == question_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;

        if demote_others {
            for choice in &mut question.choices {
                if choice.id != choice_id {
                    choice.is_correct = false;
                }
            }
        }

        let choice = question
            .choices
            .iter_mut()
            .find(|choice| choice.id == choice_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;

        if let Some(label) = update.label {
            choice.label = label;
        }
        if let Some(is_correct) = update.is_correct {
            choice.is_correct = is_correct;
        }
        if let Some(contents) = update.contents {
            choice.contents = contents
                .into_iter()
                .enumerate()
                .map(|(index, draft)| Content {
                    id: (index as i32) + 1_000,
                    kind: draft.kind,
                    value: draft.value,
                    order: draft.order,
                    label: draft.label,
                })
                .collect();
        }
        Ok(choice.clone())
    }

    async fn find_solution(
        &self,
        question_id: i32,
        solution_id: i32,
    ) -> Result<Option<Solution>, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .and_then(|question| {
                question
                    .solutions
                    .iter()
                    .find(|solution| solution.id == solution_id)
                    .cloned()
            }))
    }

    async fn replace_solution_contents(
        &self,
        question_id: i32,
        solution_id: i32,
        contents: &[ContentDraft],
    ) -> Result<Solution, QuestionRepositoryError> {
        let mut state = self.lock()?;
        let replacement: Vec<Content> = contents
            .iter()
            .enumerate()
            .map(|(index, draft)| Content {
                id: (index as i32) + 2_000,
                kind: draft.kind,
                value: draft.value.clone(),
                order: draft.order,
                label: draft.label.clone(),
            })
            .collect();

        let question = state
            .questions
            .iter_mut()
            .find(|question| question.id == question_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;
        let solution = question
            .solutions
            .iter_mut()
            .find(|solution| solution.id == solution_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;

        solution.contents = replacement;
        Ok(solution.clone())
    }

    async fn find_citation(
        &self,
        question_id: i32,
        citation_id: i32,
    ) -> Result<Option<SourceCitation>, QuestionRepositoryError> {
        let state = self.lock()?;
        Ok(state
            .questions
            .iter()
            .find(|question| question.id == question_id)
            .and_then(|question| {
                question
                    .citations
                    .iter()
                    .find(|citation| citation.id == citation_id)
                    .cloned()
            }))
    }

    async fn update_citation(
        &self,
        question_id: i32,
        citation_id: i32,
        update: CitationUpdate,
    ) -> Result<(), QuestionRepositoryError> {
        let mut state = self.lock()?;
        let question = state
            .questions
            .iter_mut()
            .find(|question| question.id == question_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;
        let citation = question
            .citations
            .iter_mut()
            .find(|citation| citation.id == citation_id)
            .ok_or_else(|| QuestionRepositoryError::query("record not found"))?;

        if let Some(source_id) = update.source_id {
            citation.source = placeholder_source(source_id);
        }
        if let Some(page) = update.page {
            citation.page = page;
        }
        Ok(())
    }
}

/// Text content draft helper.
pub fn text(value: &str, order: i32) -> ContentDraft {
    ContentDraft {
        kind: ContentKind::Text,
        value: value.to_owned(),
        order,
        label: None,
    }
}

/// Image content draft helper.
pub fn image(key: &str, order: i32) -> ContentDraft {
    ContentDraft {
        kind: ContentKind::Image,
        value: key.to_owned(),
        order,
        label: None,
    }
}

/// A well-formed creation payload with four choices, one solution, one
/// citation, and the given stem text.
pub fn question_payload(stem: &str) -> NewQuestion {
    NewQuestion {
        question_type_id: 1,
        subtopic_id: 2,
        difficulty_id: 3,
        area_ids: vec![1],
        contents: vec![text(stem, 1)],
        choices: vec![
            ChoiceDraft {
                label: "A".to_owned(),
                is_correct: true,
                contents: vec![text(&format!("{stem} right"), 1)],
            },
            ChoiceDraft {
                label: "B".to_owned(),
                is_correct: false,
                contents: vec![text(&format!("{stem} wrong one"), 1)],
            },
            ChoiceDraft {
                label: "C".to_owned(),
                is_correct: false,
                contents: vec![text(&format!("{stem} wrong two"), 1)],
            },
            ChoiceDraft {
                label: "D".to_owned(),
                is_correct: false,
                contents: vec![text(&format!("{stem} wrong three"), 1)],
            },
        ],
        solutions: vec![SolutionDraft {
            contents: vec![text(&format!("{stem} explained"), 1)],
        }],
        citations: vec![CitationDraft {
            source_id: 7,
            page: 23,
        }],
    }
}
