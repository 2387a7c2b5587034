//! Cross-entity invariants spanning the sub-entities of a question payload.
//!
//! These checks run before assembly and persistence, so a validation failure
//! never touches the store. All functions are pure; reference-existence
//! checks take the already-fetched id sets.

use std::collections::BTreeSet;
use std::collections::HashSet;

use crate::domain::content::{ContentDraft, normalize_text};
use crate::domain::error::Error;
use crate::domain::question::ChoiceDraft;

/// Require exactly one correct choice in a creation payload.
pub fn validate_single_correct_choice(choices: &[ChoiceDraft]) -> Result<(), Error> {
    let correct = choices.iter().filter(|choice| choice.is_correct).count();
    match correct {
        0 => Err(Error::no_correct_choice(
            "exactly one choice must be marked correct; none is",
        )),
        1 => Ok(()),
        n => Err(Error::multiple_correct_choices(format!(
            "exactly one choice must be marked correct; found {n}"
        ))),
    }
}

/// Require that flipping a choice to incorrect leaves at least one correct
/// sibling. `correct_siblings` is the correct count among the question's
/// other choices.
pub fn validate_remaining_correct_choice(correct_siblings: i64) -> Result<(), Error> {
    if correct_siblings == 0 {
        return Err(Error::no_correct_choice(
            "at least one choice must remain correct",
        ));
    }
    Ok(())
}

/// Require normalised text uniqueness across every text block of every
/// choice in the payload.
pub fn validate_unique_choice_contents(choices: &[ChoiceDraft]) -> Result<(), Error> {
    let mut seen: HashSet<String> = HashSet::new();
    for choice in choices {
        check_blocks_against(&choice.contents, &mut seen)?;
    }
    Ok(())
}

/// Require that a replacement content list for one choice is internally
/// unique and does not collide with `other_values`, the normalised text
/// values already persisted for the question's other choices.
pub fn validate_choice_contents_against_siblings(
    contents: &[ContentDraft],
    other_values: &HashSet<String>,
) -> Result<(), Error> {
    let mut seen = other_values.clone();
    check_blocks_against(contents, &mut seen)
}

fn check_blocks_against(
    contents: &[ContentDraft],
    seen: &mut HashSet<String>,
) -> Result<(), Error> {
    for content in contents {
        if content.kind != crate::domain::content::ContentKind::Text {
            continue;
        }
        let normalized = normalize_text(&content.value);
        if !seen.insert(normalized.clone()) {
            return Err(Error::duplicate_choice_content(format!(
                "choice contents must be unique; duplicate content: '{normalized}'"
            )));
        }
    }
    Ok(())
}

/// `order` values must be positive and pairwise distinct within one owning
/// list, otherwise neither display order nor the fingerprint input is
/// well defined.
pub fn validate_strict_ordering(contents: &[ContentDraft], owner: &str) -> Result<(), Error> {
    let mut seen: HashSet<i32> = HashSet::with_capacity(contents.len());
    for content in contents {
        if content.order < 1 {
            return Err(Error::invalid_request(format!(
                "{owner}: order values must be positive, got {}",
                content.order
            )));
        }
        if !seen.insert(content.order) {
            return Err(Error::invalid_request(format!(
                "{owner}: order value {} appears more than once",
                content.order
            )));
        }
    }
    Ok(())
}

/// All-or-nothing existence check: fail with the full missing id set when
/// any requested id was not found.
pub fn ensure_all_found(
    requested: &[i32],
    found: impl IntoIterator<Item = i32>,
    entity: &str,
) -> Result<(), Error> {
    let found: BTreeSet<i32> = found.into_iter().collect();
    let missing: Vec<i32> = requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let ids = missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(Error::resource_not_found(format!(
        "{entity} ids not found: {{{ids}}}"
    )))
}
