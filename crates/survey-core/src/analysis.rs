//! Helpers shared by analyses: grouping one question by another and
//! contingency tables.

use indexmap::{IndexMap, IndexSet};
use polars::prelude::*;
use tracing::debug;

use survey_model::{AnswerFilter, AnswerGroup, GivenAnswer, Identifiable, LanguageCode, Question};

use crate::{ContainerError, Result};

/// Filtered answers of one question per answer group of another.
pub type GroupedAnswers<'a> = IndexMap<AnswerGroup<'a>, IndexMap<&'a str, &'a GivenAnswer>>;

/// Groups participants by their answer to `group_question` and applies
/// `filter` to their answers of `filter_question`.
///
/// Every participant of `group_question` must have answered it.
pub fn filter_and_group<'a>(
    filter_question: &'a Question,
    filter: &AnswerFilter,
    group_question: &'a Question,
) -> Result<GroupedAnswers<'a>> {
    let groups = group_question.grouped_by_answer();
    if let Some(missing) = groups.get(&AnswerGroup::Missing) {
        return Err(ContainerError::GroupingWithMissing {
            question: group_question.full_id().to_string(),
            missing: missing.len(),
        });
    }

    let mut results = GroupedAnswers::new();
    for (group, participants) in groups {
        let selected: Vec<String> = participants
            .into_iter()
            .filter(|participant| {
                filter
                    .participants
                    .as_ref()
                    .is_none_or(|wanted| wanted.iter().any(|w| w == participant))
            })
            .map(str::to_string)
            .collect();
        let group_filter = AnswerFilter {
            participants: Some(selected),
            ..filter.clone()
        };
        let answers = filter_question.filter_given_answers(&group_filter)?;
        results.insert(group, answers);
    }
    debug!(
        filter_question = %filter_question.full_id(),
        group_question = %group_question.full_id(),
        groups = results.len(),
        "answers grouped"
    );
    Ok(results)
}

/// Counts participants per pair of answer labels.
///
/// The first column holds the labels of `rows`, named by its full id; every
/// further column is one label of `columns`. Participants without a valid
/// answer to both questions are not counted.
pub fn cross_tabulate(
    rows: &Question,
    columns: &Question,
    language: LanguageCode,
) -> Result<DataFrame> {
    let column_labels: IndexMap<&str, String> = columns
        .as_series()
        .labels(language)
        .filter_map(|(participant, label)| label.map(|label| (participant, label)))
        .collect();

    let mut row_keys: IndexSet<String> = IndexSet::new();
    let mut column_keys: IndexSet<String> = IndexSet::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (participant, row_label) in rows.as_series().labels(language) {
        let (Some(row_label), Some(column_label)) = (row_label, column_labels.get(participant))
        else {
            continue;
        };
        let (row, _) = row_keys.insert_full(row_label);
        let (column, _) = column_keys.insert_full(column_label.clone());
        pairs.push((row, column));
    }

    let mut counts = vec![vec![0u64; row_keys.len()]; column_keys.len()];
    for (row, column) in pairs {
        counts[column][row] += 1;
    }

    let mut frame_columns: Vec<Column> = Vec::with_capacity(column_keys.len() + 1);
    frame_columns.push(Column::new(
        rows.full_id().as_str().into(),
        row_keys.iter().map(String::as_str).collect::<Vec<_>>(),
    ));
    for (label, values) in column_keys.iter().zip(counts) {
        frame_columns.push(Column::new(label.as_str().into(), values));
    }
    DataFrame::new(frame_columns).map_err(ContainerError::from)
}
