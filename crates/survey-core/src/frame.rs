//! Tabular projections of answers as polars frames.

use indexmap::IndexSet;
use polars::prelude::*;

use survey_model::{
    AnswerValue, Identifiable, LanguageCode, Question, QuestionCollection, QuestionNode,
    ValueType,
};

/// Name of the participant id column in every answer frame.
pub const ID_COLUMN: &str = "id";

/// What heads the answer columns of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnNames {
    /// Full question id, e.g. `Q001/SQ001`.
    #[default]
    FullId,
    /// Question text in this language, else the first translation.
    Text(LanguageCode),
}

impl ColumnNames {
    fn column_name(self, question: &Question) -> PlSmallStr {
        match self {
            ColumnNames::FullId => question.full_id().as_str().into(),
            ColumnNames::Text(language) => question.text().get_or_fallback(language).into(),
        }
    }
}

/// Participant × question table.
pub trait AsDataFrame {
    /// Projects answers into a frame, leaving out questions whose short id is
    /// in `exclude`. Columns are headed as `names` says; two questions with
    /// the same heading make the frame fail.
    fn as_named_data_frame(&self, exclude: &[&str], names: ColumnNames)
    -> PolarsResult<DataFrame>;

    /// Same as [`AsDataFrame::as_named_data_frame`] with full-id headings.
    fn as_data_frame(&self, exclude: &[&str]) -> PolarsResult<DataFrame> {
        self.as_named_data_frame(exclude, ColumnNames::FullId)
    }
}

impl AsDataFrame for QuestionCollection {
    fn as_named_data_frame(
        &self,
        exclude: &[&str],
        names: ColumnNames,
    ) -> PolarsResult<DataFrame> {
        let questions: Vec<&Question> = self.included_questions(exclude).collect();
        named_answers_frame(&questions, names)
    }
}

impl AsDataFrame for Question {
    fn as_named_data_frame(
        &self,
        exclude: &[&str],
        names: ColumnNames,
    ) -> PolarsResult<DataFrame> {
        if exclude.contains(&self.short_id().as_str()) {
            return named_answers_frame(&[], names);
        }
        named_answers_frame(&[self], names)
    }
}

impl AsDataFrame for QuestionNode<'_> {
    fn as_named_data_frame(
        &self,
        exclude: &[&str],
        names: ColumnNames,
    ) -> PolarsResult<DataFrame> {
        match self {
            QuestionNode::Leaf(question) => question.as_named_data_frame(exclude, names),
            QuestionNode::Group(collection) => collection.as_named_data_frame(exclude, names),
        }
    }
}

/// Outer join of the given questions: one row per participant who answered
/// any of them, one typed column per question named by its full id.
pub fn answers_frame(questions: &[&Question]) -> PolarsResult<DataFrame> {
    named_answers_frame(questions, ColumnNames::FullId)
}

pub fn named_answers_frame(
    questions: &[&Question],
    names: ColumnNames,
) -> PolarsResult<DataFrame> {
    let participants: IndexSet<&str> = questions
        .iter()
        .flat_map(|question| question.given_answers().keys().map(String::as_str))
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(questions.len() + 1);
    columns.push(Column::new(
        ID_COLUMN.into(),
        participants.iter().copied().collect::<Vec<_>>(),
    ));
    for question in questions {
        columns.push(answer_column(question, names.column_name(question), &participants));
    }
    DataFrame::new(columns)
}

fn answer_column(question: &Question, name: PlSmallStr, participants: &IndexSet<&str>) -> Column {
    let series = question.as_series();
    let values = participants
        .iter()
        .map(|participant| series.get(participant).flatten());
    match question.value_type() {
        ValueType::Bool => {
            let values: Vec<Option<bool>> =
                values.map(|v| v.and_then(AnswerValue::as_bool)).collect();
            Series::new(name, values).into_column()
        }
        ValueType::Int => {
            let values: Vec<Option<i64>> =
                values.map(|v| v.and_then(AnswerValue::as_int)).collect();
            Series::new(name, values).into_column()
        }
        ValueType::Float => {
            let values: Vec<Option<f64>> =
                values.map(|v| v.and_then(AnswerValue::as_float)).collect();
            Series::new(name, values).into_column()
        }
        ValueType::Str => {
            let values: Vec<Option<&str>> =
                values.map(|v| v.and_then(AnswerValue::as_str)).collect();
            Series::new(name, values).into_column()
        }
    }
}

/// Counts per distinct answer of `question` as an `answer`/`count` frame.
///
/// Missing answers are counted under a null answer unless `filter_invalid`.
pub fn value_counts_frame(question: &Question, filter_invalid: bool) -> PolarsResult<DataFrame> {
    let counts = question.value_counts(filter_invalid);
    let answers: Vec<Option<String>> = counts
        .iter()
        .map(|entry| entry.value.map(ToString::to_string))
        .collect();
    let totals: Vec<u64> = counts.iter().map(|entry| entry.count as u64).collect();
    DataFrame::new(vec![
        Column::new("answer".into(), answers),
        Column::new("count".into(), totals),
    ])
}
