use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::{FullId, Identifiable, ModelError, Question, Result, ShortId, Translated};

/// A named group of questions sharing the collection's id as prefix.
#[derive(Debug, Clone)]
pub struct QuestionCollection {
    short_id: ShortId,
    full_id: FullId,
    text: Translated,
    label: String,
    separator: char,
    questions: IndexMap<ShortId, Question>,
}

impl QuestionCollection {
    pub fn new(
        short_id: ShortId,
        text: Translated,
        label: impl Into<String>,
        separator: char,
    ) -> Self {
        Self {
            full_id: FullId::root(&short_id),
            short_id,
            text,
            label: label.into(),
            separator,
            questions: IndexMap::new(),
        }
    }

    pub fn text(&self) -> &Translated {
        &self.text
    }

    /// Short label used for plot axes and table headers.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// The full id a child question with `short_id` gets.
    pub fn question_full_id(&self, short_id: &ShortId) -> FullId {
        self.full_id.child(short_id, self.separator)
    }

    pub fn add_question(&mut self, question: Question) -> Result<()> {
        let expected = self.question_full_id(question.short_id());
        if *question.full_id() != expected {
            return Err(ModelError::InvalidId {
                id: question.full_id().to_string(),
                separator: self.separator,
            });
        }
        if self.questions.contains_key(question.short_id()) {
            return Err(ModelError::DuplicateId {
                id: expected.to_string(),
            });
        }
        self.questions.insert(question.short_id().clone(), question);
        Ok(())
    }

    pub fn question_for_id(&self, short_id: &str) -> Result<&Question> {
        self.questions
            .get(short_id)
            .ok_or_else(|| self.unknown_child(short_id))
    }

    pub fn question_for_id_mut(&mut self, short_id: &str) -> Result<&mut Question> {
        let (full_id, separator) = (&self.full_id, self.separator);
        self.questions
            .get_mut(short_id)
            .ok_or_else(|| ModelError::UnknownId {
                id: format!("{full_id}{separator}{short_id}"),
            })
    }

    /// Questions in declaration order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn flatten(&self) -> Vec<&Question> {
        self.questions.values().collect()
    }

    /// Questions in declaration order minus those whose short id is excluded.
    pub fn included_questions<'a>(
        &'a self,
        exclude: &'a [&str],
    ) -> impl Iterator<Item = &'a Question> {
        self.questions
            .iter()
            .filter(move |(short_id, _)| !exclude.contains(&short_id.as_str()))
            .map(|(_, question)| question)
    }

    /// Union of the participants of the included questions, in order of
    /// first appearance.
    pub fn participants<'a>(&'a self, exclude: &'a [&str]) -> Vec<&'a str> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        for question in self.included_questions(exclude) {
            seen.extend(question.given_answers().keys().map(String::as_str));
        }
        seen.into_iter().collect()
    }

    fn unknown_child(&self, short_id: &str) -> ModelError {
        ModelError::UnknownId {
            id: format!("{}{}{short_id}", self.full_id, self.separator),
        }
    }
}

impl Identifiable for QuestionCollection {
    fn short_id(&self) -> &ShortId {
        &self.short_id
    }

    fn full_id(&self) -> &FullId {
        &self.full_id
    }
}

impl fmt::Display for QuestionCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.full_id, self.label)?;
        for question in self.questions.values() {
            let mandatory = if question.mandatory() { ", mandatory" } else { "" };
            writeln!(
                f,
                "  {} [{}{mandatory}]",
                question.full_id(),
                question.value_type()
            )?;
            for option in question.answer_options() {
                writeln!(f, "    {} = {}", option.full_id(), option.value())?;
            }
        }
        Ok(())
    }
}
