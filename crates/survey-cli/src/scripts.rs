//! Built-in analyses and the table that names them.
//!
//! An analysis is a plain function over a fully loaded [`DataContainer`]. The
//! registry runs the selected ones in order; a failing analysis is logged
//! and reported without stopping the others.

use std::time::Instant;

use anyhow::{Context, Result, bail};
use polars::prelude::*;
use tracing::{error, info, info_span};

use survey_core::{AsDataFrame, DataContainer, value_counts_frame};
use survey_model::{AnswerFilter, Identifiable, Question, QuestionCollection, ValueType};

pub type ScriptFn = fn(&DataContainer) -> Result<Vec<ScriptOutput>>;

/// One titled table produced by an analysis.
#[derive(Debug)]
pub struct ScriptOutput {
    pub title: String,
    pub frame: DataFrame,
}

#[derive(Debug, Clone, Copy)]
pub struct Script {
    pub name: &'static str,
    pub description: &'static str,
    run: ScriptFn,
}

impl Script {
    pub fn new(name: &'static str, description: &'static str, run: ScriptFn) -> Self {
        Self {
            name,
            description,
            run,
        }
    }

    /// Runs the analysis; failures end up in the returned record.
    pub fn execute(&self, container: &DataContainer) -> ScriptRun {
        let span = info_span!("script", name = self.name);
        let _guard = span.enter();
        let start = Instant::now();
        let result = (self.run)(container);
        let duration_ms = start.elapsed().as_millis();
        match result {
            Ok(outputs) => {
                info!(tables = outputs.len(), duration_ms, "analysis finished");
                ScriptRun {
                    name: self.name,
                    outputs,
                    error: None,
                    duration_ms,
                }
            }
            Err(err) => {
                error!(duration_ms, "analysis failed: {err:#}");
                ScriptRun {
                    name: self.name,
                    outputs: Vec::new(),
                    error: Some(format!("{err:#}")),
                    duration_ms,
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct ScriptRun {
    pub name: &'static str,
    pub outputs: Vec<ScriptOutput>,
    pub error: Option<String>,
    pub duration_ms: u128,
}

impl ScriptRun {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Name-keyed table of analyses, in registration order.
#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    scripts: Vec<Script>,
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScriptRegistry {
    pub fn empty() -> Self {
        Self {
            scripts: Vec::new(),
        }
    }

    pub fn builtin() -> Self {
        Self {
            scripts: vec![
                Script::new(
                    "collection-overview",
                    "Questions and respondents per collection",
                    collection_overview,
                ),
                Script::new(
                    "value-counts",
                    "Answer frequencies of every choice and yes/no question",
                    value_counts,
                ),
                Script::new(
                    "descriptive-statistics",
                    "Count, mean, spread and range of numeric questions",
                    descriptive_statistics,
                ),
                Script::new(
                    "answer-sources",
                    "Predefined versus free-text answers per choice question",
                    answer_sources,
                ),
                Script::new(
                    "multiple-choice",
                    "Checkbox collections folded into one question, counted per selection",
                    multiple_choice,
                ),
            ],
        }
    }

    pub fn register(&mut self, script: Script) -> Result<()> {
        if self.get(script.name).is_some() {
            bail!("analysis {} is already registered", script.name);
        }
        self.scripts.push(script);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts.iter().find(|script| script.name == name)
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    /// Resolves names to analyses; no names selects all of them.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Script>> {
        if names.is_empty() {
            return Ok(self.scripts.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).with_context(|| {
                    let known: Vec<&str> = self.scripts.iter().map(|script| script.name).collect();
                    format!("unknown analysis {name} (known: {})", known.join(", "))
                })
            })
            .collect()
    }

    /// Runs the selected analyses one after another.
    pub fn run<S: AsRef<str>>(
        &self,
        container: &DataContainer,
        names: &[S],
    ) -> Result<Vec<ScriptRun>> {
        let selected = self.select(names)?;
        Ok(selected
            .into_iter()
            .map(|script| script.execute(container))
            .collect())
    }
}

fn question_title(container: &DataContainer, question: &Question) -> String {
    let language = container.settings().language;
    format!(
        "{}: {}",
        question.full_id(),
        question.text().get_or_fallback(language)
    )
}

fn collection_overview(container: &DataContainer) -> Result<Vec<ScriptOutput>> {
    let mut ids: Vec<String> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut questions: Vec<u64> = Vec::new();
    let mut respondents: Vec<u64> = Vec::new();
    for collection in container.collections() {
        let answered = container
            .participants()
            .iter()
            .filter(|participant| {
                collection.questions().any(|question| {
                    question
                        .as_series()
                        .get(participant.as_str())
                        .flatten()
                        .is_some()
                })
            })
            .count();
        ids.push(collection.full_id().to_string());
        labels.push(collection.label().to_string());
        questions.push(collection.len() as u64);
        respondents.push(answered as u64);
    }
    let frame = DataFrame::new(vec![
        Column::new("collection".into(), ids),
        Column::new("label".into(), labels),
        Column::new("questions".into(), questions),
        Column::new("respondents".into(), respondents),
    ])?;
    Ok(vec![ScriptOutput {
        title: format!("Collections ({} participants)", container.participants().len()),
        frame,
    }])
}

fn value_counts(container: &DataContainer) -> Result<Vec<ScriptOutput>> {
    container
        .questions()
        .filter(|question| {
            question.value_type() == ValueType::Bool || question.answer_options().next().is_some()
        })
        .map(|question| {
            let frame = value_counts_frame(question, false)
                .with_context(|| format!("count answers of {}", question.full_id()))?;
            Ok(ScriptOutput {
                title: question_title(container, question),
                frame,
            })
        })
        .collect()
}

fn descriptive_statistics(container: &DataContainer) -> Result<Vec<ScriptOutput>> {
    let numeric: Vec<&Question> = container
        .questions()
        .filter(|question| matches!(question.value_type(), ValueType::Int | ValueType::Float))
        .collect();
    if numeric.is_empty() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = Vec::with_capacity(numeric.len());
    let mut answers: Vec<u64> = Vec::with_capacity(numeric.len());
    let mut missing: Vec<u64> = Vec::with_capacity(numeric.len());
    let mut means: Vec<Option<f64>> = Vec::with_capacity(numeric.len());
    let mut deviations: Vec<Option<f64>> = Vec::with_capacity(numeric.len());
    let mut minima: Vec<Option<f64>> = Vec::with_capacity(numeric.len());
    let mut maxima: Vec<Option<f64>> = Vec::with_capacity(numeric.len());
    for question in numeric {
        let name = question.full_id().as_str();
        let frame = question.as_data_frame(&[])?;
        let values = frame
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let nulls = values.null_count();
        names.push(name.to_string());
        answers.push((values.len() - nulls) as u64);
        missing.push(nulls as u64);
        means.push(values.mean());
        deviations.push(values.std(1));
        minima.push(values.min::<f64>()?);
        maxima.push(values.max::<f64>()?);
    }
    let frame = DataFrame::new(vec![
        Column::new("question".into(), names),
        Column::new("answers".into(), answers),
        Column::new("missing".into(), missing),
        Column::new("mean".into(), means),
        Column::new("std".into(), deviations),
        Column::new("min".into(), minima),
        Column::new("max".into(), maxima),
    ])?;
    Ok(vec![ScriptOutput {
        title: "Numeric questions".to_string(),
        frame,
    }])
}

fn answer_sources(container: &DataContainer) -> Result<Vec<ScriptOutput>> {
    let mut names: Vec<String> = Vec::new();
    let mut predefined: Vec<u64> = Vec::new();
    let mut free_text: Vec<u64> = Vec::new();
    for question in container.questions() {
        if question.answer_options().next().is_none() {
            continue;
        }
        let chosen = question.filter_given_answers(&AnswerFilter::predefined_only())?;
        let written = question.filter_given_answers(&AnswerFilter::free_text_only())?;
        names.push(question.full_id().to_string());
        predefined.push(chosen.len() as u64);
        free_text.push(written.len() as u64);
    }
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let frame = DataFrame::new(vec![
        Column::new("question".into(), names),
        Column::new("predefined".into(), predefined),
        Column::new("free_text".into(), free_text),
    ])?;
    Ok(vec![ScriptOutput {
        title: "Answer sources".to_string(),
        frame,
    }])
}

/// A collection reads as multiple choice when it has several sub-questions
/// and at least one of them is a checkbox.
fn is_multiple_choice(collection: &QuestionCollection) -> bool {
    collection.len() > 1
        && collection
            .questions()
            .any(|question| question.value_type() == ValueType::Bool)
}

fn multiple_choice(container: &DataContainer) -> Result<Vec<ScriptOutput>> {
    let language = container.settings().language;
    let mut outputs = Vec::new();
    for collection in container.collections().filter(|c| is_multiple_choice(c)) {
        let collapsed = collection
            .collapse(language)
            .with_context(|| format!("collapse {}", collection.full_id()))?;
        let counts = collapsed.value_counts();
        let answers: Vec<String> = counts
            .iter()
            .map(|entry| entry.value.map(ToString::to_string).unwrap_or_default())
            .collect();
        let totals: Vec<u64> = counts.iter().map(|entry| entry.count as u64).collect();
        let frame = DataFrame::new(vec![
            Column::new("answer".into(), answers),
            Column::new("count".into(), totals),
        ])?;
        outputs.push(ScriptOutput {
            title: question_title(container, collapsed.question()),
            frame,
        });
    }
    Ok(outputs)
}
