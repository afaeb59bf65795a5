//! Leaf questions and the answers participants gave to them.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::trace;

use crate::{
    AnswerOption, AnswerValue, FullId, Identifiable, LanguageCode, ModelError, Result, ShortId,
    Translated, ValueTokens, ValueType,
};

/// A coerced answer of one participant.
///
/// `value` is `None` for "no answer". `option` names the predefined answer
/// option the value was matched to, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GivenAnswer {
    pub value: Option<AnswerValue>,
    pub option: Option<ShortId>,
}

impl GivenAnswer {
    pub fn missing() -> Self {
        Self {
            value: None,
            option: None,
        }
    }

    pub fn is_predefined(&self) -> bool {
        self.option.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Question {
    short_id: ShortId,
    full_id: FullId,
    text: Translated,
    mandatory: bool,
    value_type: ValueType,
    options: IndexMap<ShortId, AnswerOption>,
    answers: IndexMap<String, GivenAnswer>,
}

impl Question {
    /// Creates a mandatory question without answer options.
    pub fn new(
        short_id: ShortId,
        full_id: FullId,
        text: Translated,
        value_type: ValueType,
    ) -> Self {
        Self {
            short_id,
            full_id,
            text,
            mandatory: true,
            value_type,
            options: IndexMap::new(),
            answers: IndexMap::new(),
        }
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn text(&self) -> &Translated {
        &self.text
    }

    pub fn mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn answer_options(&self) -> impl Iterator<Item = &AnswerOption> {
        self.options.values()
    }

    pub fn answer_option(&self, short_id: &str) -> Option<&AnswerOption> {
        self.options.get(short_id)
    }

    pub fn given_answers(&self) -> &IndexMap<String, GivenAnswer> {
        &self.answers
    }

    pub fn answer_for(&self, participant: &str) -> Option<&GivenAnswer> {
        self.answers.get(participant)
    }

    /// Adds a predefined answer option. Its value must match the question type.
    pub fn add_answer_option(&mut self, option: AnswerOption) -> Result<()> {
        let actual = option.value().value_type();
        if actual != self.value_type {
            return Err(ModelError::OptionTypeMismatch {
                option: option.full_id().to_string(),
                actual,
                expected: self.value_type,
            });
        }
        if self.options.contains_key(option.short_id()) {
            return Err(ModelError::DuplicateId {
                id: option.full_id().to_string(),
            });
        }
        self.options.insert(option.short_id().clone(), option);
        Ok(())
    }

    /// Coerces a raw cell without storing it.
    ///
    /// The text is parsed as the question type and matched against option
    /// values. Only when that finds no option is the text looked up as an
    /// option id. Anything else that parses is kept as a free answer.
    pub fn resolve_answer(
        &self,
        participant: &str,
        raw: &str,
        tokens: &ValueTokens,
    ) -> Result<GivenAnswer> {
        if tokens.is_null(raw) {
            return self.missing_answer(participant);
        }
        let trimmed = raw.trim();
        let parsed = tokens
            .parse(trimmed, self.value_type)
            .map(|value| self.match_option(value));
        if let Some(answer) = parsed.as_ref().filter(|answer| answer.is_predefined()) {
            return Ok(answer.clone());
        }
        if let Some(option) = self.options.get(trimmed) {
            return Ok(GivenAnswer {
                value: Some(option.value().clone()),
                option: Some(option.short_id().clone()),
            });
        }
        parsed.ok_or_else(|| ModelError::InvalidAnswer {
            question: self.full_id.to_string(),
            participant: participant.to_string(),
            raw: raw.to_string(),
            expected: self.value_type,
        })
    }

    /// Coerces an already typed value without storing it.
    pub fn resolve_value(
        &self,
        participant: &str,
        value: Option<AnswerValue>,
        tokens: &ValueTokens,
    ) -> Result<GivenAnswer> {
        let Some(value) = value else {
            return self.missing_answer(participant);
        };
        let raw = value.to_string();
        let value = tokens
            .convert(value, self.value_type)
            .map_err(|_| ModelError::InvalidAnswer {
                question: self.full_id.to_string(),
                participant: participant.to_string(),
                raw,
                expected: self.value_type,
            })?;
        Ok(self.match_option(value))
    }

    /// Stores a resolved answer. Each participant answers at most once.
    pub fn commit_answer(&mut self, participant: &str, answer: GivenAnswer) -> Result<()> {
        if self.answers.contains_key(participant) {
            return Err(ModelError::DuplicateAnswer {
                question: self.full_id.to_string(),
                participant: participant.to_string(),
            });
        }
        trace!(question = %self.full_id, participant, value = ?answer.value, "answer stored");
        self.answers.insert(participant.to_string(), answer);
        Ok(())
    }

    pub fn add_answer(
        &mut self,
        participant: &str,
        raw: &str,
        tokens: &ValueTokens,
    ) -> Result<()> {
        let answer = self.resolve_answer(participant, raw, tokens)?;
        self.commit_answer(participant, answer)
    }

    pub fn add_value(
        &mut self,
        participant: &str,
        value: Option<AnswerValue>,
        tokens: &ValueTokens,
    ) -> Result<()> {
        let answer = self.resolve_value(participant, value, tokens)?;
        self.commit_answer(participant, answer)
    }

    pub fn as_series(&self) -> AnswerSeries<'_> {
        AnswerSeries { question: self }
    }

    /// Given answers that pass `filter`, keyed by participant.
    ///
    /// Participants without an answer never match.
    pub fn filter_given_answers(
        &self,
        filter: &AnswerFilter,
    ) -> Result<IndexMap<&str, &GivenAnswer>> {
        if !filter.include_predefined && !filter.include_free_text {
            return Err(ModelError::EmptyFilter);
        }
        let needle = filter.contains_text.as_deref().map(str::to_lowercase);

        let selected = self
            .answers
            .iter()
            .filter(|(participant, _)| {
                filter
                    .participants
                    .as_ref()
                    .is_none_or(|wanted| wanted.iter().any(|p| p == *participant))
            })
            .filter(|(_, answer)| answer.value.is_some())
            .filter(|(_, answer)| {
                if answer.is_predefined() {
                    filter.include_predefined
                } else {
                    filter.include_free_text
                }
            })
            .filter(|(_, answer)| match needle.as_deref() {
                None => true,
                Some(needle) => self.answer_mentions(answer, needle),
            })
            .map(|(participant, answer)| (participant.as_str(), answer))
            .collect();
        Ok(selected)
    }

    /// Participants grouped by the answer they gave, in order of first use.
    pub fn grouped_by_answer(&self) -> IndexMap<AnswerGroup<'_>, Vec<&str>> {
        let mut groups: IndexMap<AnswerGroup<'_>, Vec<&str>> = IndexMap::new();
        for (participant, answer) in &self.answers {
            let group = match (&answer.option, &answer.value) {
                (Some(option), _) => self
                    .options
                    .get(option)
                    .map_or(AnswerGroup::Missing, AnswerGroup::Option),
                (None, Some(value)) => AnswerGroup::FreeText(value),
                (None, None) => AnswerGroup::Missing,
            };
            groups.entry(group).or_default().push(participant.as_str());
        }
        groups
    }

    /// Occurrences per distinct answer, most frequent first.
    ///
    /// With `filter_invalid` unset, "no answer" is counted as well.
    pub fn value_counts(&self, filter_invalid: bool) -> Vec<ValueCount<'_>> {
        let mut counts: Vec<ValueCount<'_>> = Vec::new();
        for (_, value) in self.as_series().iter() {
            if filter_invalid && value.is_none() {
                continue;
            }
            match counts.iter_mut().find(|entry| entry.value == value) {
                Some(entry) => entry.count += 1,
                None => counts.push(ValueCount { value, count: 1 }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    /// Like [`Question::value_counts`], normalized to fractions of the total.
    pub fn relative_value_counts(
        &self,
        filter_invalid: bool,
    ) -> Vec<(Option<&AnswerValue>, f64)> {
        let counts = self.value_counts(filter_invalid);
        let total: usize = counts.iter().map(|entry| entry.count).sum();
        counts
            .into_iter()
            .map(|entry| (entry.value, entry.count as f64 / total as f64))
            .collect()
    }

    fn missing_answer(&self, participant: &str) -> Result<GivenAnswer> {
        if self.mandatory {
            return Err(ModelError::MissingMandatoryAnswer {
                question: self.full_id.to_string(),
                participant: participant.to_string(),
            });
        }
        Ok(GivenAnswer::missing())
    }

    fn match_option(&self, value: AnswerValue) -> GivenAnswer {
        let option = self
            .options
            .values()
            .find(|option| *option.value() == value)
            .map(|option| option.short_id().clone());
        GivenAnswer {
            value: Some(value),
            option,
        }
    }

    fn answer_mentions(&self, answer: &GivenAnswer, needle_lower: &str) -> bool {
        let by_value = answer
            .value
            .as_ref()
            .is_some_and(|value| value.to_string().to_lowercase().contains(needle_lower));
        let by_option = answer
            .option
            .as_ref()
            .and_then(|id| self.options.get(id))
            .is_some_and(|option| option.mentions(needle_lower));
        by_value || by_option
    }
}

impl Identifiable for Question {
    fn short_id(&self) -> &ShortId {
        &self.short_id
    }

    fn full_id(&self) -> &FullId {
        &self.full_id
    }
}

/// Read-only view over the given answers of one question, in ingestion order.
#[derive(Debug, Clone, Copy)]
pub struct AnswerSeries<'a> {
    question: &'a Question,
}

impl<'a> AnswerSeries<'a> {
    pub fn name(&self) -> &'a FullId {
        &self.question.full_id
    }

    pub fn value_type(&self) -> ValueType {
        self.question.value_type
    }

    pub fn len(&self) -> usize {
        self.question.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question.answers.is_empty()
    }

    pub fn iter(self) -> impl Iterator<Item = (&'a str, Option<&'a AnswerValue>)> + 'a {
        self.question
            .answers
            .iter()
            .map(|(participant, answer)| (participant.as_str(), answer.value.as_ref()))
    }

    /// Answers that carry a value.
    pub fn valid(self) -> impl Iterator<Item = (&'a str, &'a AnswerValue)> + 'a {
        self.iter()
            .filter_map(|(participant, value)| value.map(|value| (participant, value)))
    }

    /// `None` if the participant is unknown, `Some(None)` for "no answer".
    pub fn get(&self, participant: &str) -> Option<Option<&'a AnswerValue>> {
        self.question
            .answers
            .get(participant)
            .map(|answer| answer.value.as_ref())
    }

    /// Display labels: the option's short label when an option was chosen,
    /// the value itself otherwise.
    pub fn labels(
        self,
        language: LanguageCode,
    ) -> impl Iterator<Item = (&'a str, Option<String>)> + 'a {
        let question = self.question;
        question.answers.iter().map(move |(participant, answer)| {
            let label = match (&answer.option, &answer.value) {
                (Some(option), _) => question
                    .options
                    .get(option)
                    .map(|option| option.label(language).to_string()),
                (None, value) => value.as_ref().map(ToString::to_string),
            };
            (participant.as_str(), label)
        })
    }

    pub fn to_map(self, filter_invalid: bool) -> IndexMap<&'a str, Option<&'a AnswerValue>> {
        self.iter()
            .filter(|(_, value)| !filter_invalid || value.is_some())
            .collect()
    }
}

/// Options for [`Question::filter_given_answers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFilter {
    pub include_predefined: bool,
    pub include_free_text: bool,
    pub participants: Option<Vec<String>>,
    pub contains_text: Option<String>,
}

impl Default for AnswerFilter {
    fn default() -> Self {
        Self {
            include_predefined: true,
            include_free_text: true,
            participants: None,
            contains_text: None,
        }
    }
}

impl AnswerFilter {
    pub fn predefined_only() -> Self {
        Self {
            include_free_text: false,
            ..Self::default()
        }
    }

    pub fn free_text_only() -> Self {
        Self {
            include_predefined: false,
            ..Self::default()
        }
    }

    pub fn for_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants = Some(participants.into_iter().map(Into::into).collect());
        self
    }

    pub fn containing(mut self, text: impl Into<String>) -> Self {
        self.contains_text = Some(text.into());
        self
    }
}

/// Bucket key of [`Question::grouped_by_answer`].
#[derive(Debug, Clone, Copy)]
pub enum AnswerGroup<'a> {
    Option(&'a AnswerOption),
    FreeText(&'a AnswerValue),
    Missing,
}

impl PartialEq for AnswerGroup<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AnswerGroup::Option(a), AnswerGroup::Option(b)) => a.full_id() == b.full_id(),
            (AnswerGroup::FreeText(a), AnswerGroup::FreeText(b)) => {
                a.value_type() == b.value_type() && a.to_string() == b.to_string()
            }
            (AnswerGroup::Missing, AnswerGroup::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for AnswerGroup<'_> {}

impl Hash for AnswerGroup<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AnswerGroup::Option(option) => option.full_id().hash(state),
            AnswerGroup::FreeText(value) => {
                value.value_type().hash(state);
                value.to_string().hash(state);
            }
            AnswerGroup::Missing => {}
        }
    }
}

impl fmt::Display for AnswerGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerGroup::Option(option) => write!(f, "{}", option.short_id()),
            AnswerGroup::FreeText(value) => write!(f, "{value}"),
            AnswerGroup::Missing => f.write_str("nan"),
        }
    }
}

/// One entry of [`Question::value_counts`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCount<'a> {
    pub value: Option<&'a AnswerValue>,
    pub count: usize,
}
