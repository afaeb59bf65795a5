//! Multiple-choice view of a collection of checkbox questions.

use indexmap::IndexMap;

use crate::{
    AnswerGroup, AnswerOption, AnswerValue, FullId, GivenAnswer, Identifiable, LanguageCode,
    Question, QuestionCollection, Result, ShortId, ValueCount, ValueType,
};

/// Suffix appended to a collection id to name its collapsed question.
pub const COLLAPSED_SUFFIX: char = '*';

/// A collection folded into one `str` question.
///
/// Every bool sub-question becomes an option of the folded question, and a
/// participant selects it by having answered `true`. Answers to any other
/// sub-question are kept as free text prefixed with the sub-question text in
/// parentheses. A participant can therefore hold several selections, so they
/// are kept next to the question rather than in it.
#[derive(Debug, Clone)]
pub struct CollapsedQuestion {
    question: Question,
    selections: IndexMap<String, Vec<GivenAnswer>>,
}

impl CollapsedQuestion {
    /// The folded question: id `<collection>*`, the collection text and one
    /// option per bool sub-question. It holds no answers itself.
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Selections per participant, in order of first selection.
    pub fn selections(&self) -> &IndexMap<String, Vec<GivenAnswer>> {
        &self.selections
    }

    pub fn selections_for(&self, participant: &str) -> &[GivenAnswer] {
        self.selections
            .get(participant)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.selections.keys().map(String::as_str)
    }

    /// Participants per selected answer. A participant appears once in every
    /// group they selected.
    pub fn grouped_by_answer(&self) -> IndexMap<AnswerGroup<'_>, Vec<&str>> {
        let mut groups: IndexMap<AnswerGroup<'_>, Vec<&str>> = IndexMap::new();
        for (participant, answers) in &self.selections {
            for answer in answers {
                let group = match (&answer.option, &answer.value) {
                    (Some(option), _) => self
                        .question
                        .answer_option(option.as_str())
                        .map_or(AnswerGroup::Missing, AnswerGroup::Option),
                    (None, Some(value)) => AnswerGroup::FreeText(value),
                    (None, None) => AnswerGroup::Missing,
                };
                groups.entry(group).or_default().push(participant.as_str());
            }
        }
        groups
    }

    /// Selections per distinct answer, most frequent first.
    pub fn value_counts(&self) -> Vec<ValueCount<'_>> {
        let mut counts: Vec<ValueCount<'_>> = Vec::new();
        let values = self
            .selections
            .values()
            .flatten()
            .filter_map(|answer| answer.value.as_ref());
        for value in values {
            match counts.iter_mut().find(|entry| entry.value == Some(value)) {
                Some(entry) => entry.count += 1,
                None => counts.push(ValueCount {
                    value: Some(value),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    fn select(&mut self, participant: &str, answer: GivenAnswer) {
        self.selections
            .entry(participant.to_string())
            .or_default()
            .push(answer);
    }
}

impl QuestionCollection {
    /// Folds this collection into a single multiple-choice question, using
    /// texts in `language` for option values and free-text prefixes.
    ///
    /// Missing answers select nothing.
    pub fn collapse(&self, language: LanguageCode) -> Result<CollapsedQuestion> {
        let short_id = ShortId::new(
            format!("{}{COLLAPSED_SUFFIX}", self.short_id()),
            self.separator(),
        )?;
        let full_id = FullId::root(&short_id);
        let mut question = Question::new(
            short_id,
            full_id.clone(),
            self.text().clone(),
            ValueType::Str,
        )
        .with_mandatory(false);
        for sub in self.questions() {
            if sub.value_type() != ValueType::Bool {
                continue;
            }
            let option_id = sub.short_id().clone();
            let option_full_id = full_id.child(&option_id, self.separator());
            question.add_answer_option(AnswerOption::new(
                option_id,
                option_full_id,
                sub.text().clone(),
                None,
                AnswerValue::from(sub.text().get_or_fallback(language)),
            ))?;
        }

        let mut collapsed = CollapsedQuestion {
            question,
            selections: IndexMap::new(),
        };
        for sub in self.questions() {
            let sub_text = sub.text().get_or_fallback(language);
            for (participant, value) in sub.as_series().valid() {
                let answer = if sub.value_type() == ValueType::Bool {
                    if value.as_bool() != Some(true) {
                        continue;
                    }
                    GivenAnswer {
                        value: Some(AnswerValue::from(sub_text)),
                        option: Some(sub.short_id().clone()),
                    }
                } else {
                    let value = AnswerValue::from(format!("({sub_text}) {value}"));
                    let option = collapsed
                        .question
                        .answer_options()
                        .find(|option| *option.value() == value)
                        .map(|option| option.short_id().clone());
                    GivenAnswer {
                        value: Some(value),
                        option,
                    }
                };
                collapsed.select(participant, answer);
            }
        }
        Ok(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_SEPARATOR, Translated, ValueTokens};

    fn id(value: &str) -> ShortId {
        ShortId::new(value, DEFAULT_SEPARATOR).unwrap()
    }

    fn tools() -> QuestionCollection {
        let tokens = ValueTokens::default();
        let mut collection = QuestionCollection::new(
            id("Q004"),
            Translated::single(LanguageCode::En, "Which tools do you use?"),
            "Tools",
            DEFAULT_SEPARATOR,
        );
        let subs = [
            ("SQ001", "Git", ValueType::Bool, ["yes", "yes", "no"]),
            ("SQ002", "Docker", ValueType::Bool, ["no", "yes", ""]),
            ("SQ003", "Other", ValueType::Str, ["", "", "Nix"]),
        ];
        for (short, text, value_type, answers) in subs {
            let short = id(short);
            let full = collection.question_full_id(&short);
            let mut question = Question::new(
                short,
                full,
                Translated::single(LanguageCode::En, text),
                value_type,
            )
            .with_mandatory(false);
            for (participant, raw) in ["p1", "p2", "p3"].into_iter().zip(answers) {
                question.add_answer(participant, raw, &tokens).unwrap();
            }
            collection.add_question(question).unwrap();
        }
        collection
    }

    #[test]
    fn bool_questions_become_options() {
        let collapsed = tools().collapse(LanguageCode::En).unwrap();
        let question = collapsed.question();
        assert_eq!(question.full_id().as_str(), "Q004*");
        assert_eq!(question.value_type(), ValueType::Str);
        assert_eq!(
            question.text().get_or_fallback(LanguageCode::En),
            "Which tools do you use?"
        );
        let options: Vec<(&str, String)> = question
            .answer_options()
            .map(|option| (option.short_id().as_str(), option.value().to_string()))
            .collect();
        assert_eq!(
            options,
            [("SQ001", "Git".to_string()), ("SQ002", "Docker".to_string())]
        );
        assert_eq!(
            question.answer_option("SQ002").unwrap().full_id().as_str(),
            "Q004*/SQ002"
        );
        assert!(question.given_answers().is_empty());
    }

    #[test]
    fn only_true_answers_select_and_other_answers_are_prefixed() {
        let collapsed = tools().collapse(LanguageCode::En).unwrap();
        assert_eq!(collapsed.participants().collect::<Vec<_>>(), ["p1", "p2", "p3"]);

        let p2: Vec<Option<&str>> = collapsed
            .selections_for("p2")
            .iter()
            .map(|answer| answer.option.as_ref().map(ShortId::as_str))
            .collect();
        assert_eq!(p2, [Some("SQ001"), Some("SQ002")]);

        let p3 = collapsed.selections_for("p3");
        assert_eq!(p3.len(), 1);
        assert_eq!(p3[0].value, Some(AnswerValue::from("(Other) Nix")));
        assert!(!p3[0].is_predefined());
        assert!(collapsed.selections_for("p4").is_empty());
    }

    #[test]
    fn groups_and_counts_span_every_selection() {
        let collapsed = tools().collapse(LanguageCode::En).unwrap();
        let groups: Vec<(String, Vec<&str>)> = collapsed
            .grouped_by_answer()
            .into_iter()
            .map(|(group, participants)| (group.to_string(), participants))
            .collect();
        assert_eq!(
            groups,
            [
                ("SQ001".to_string(), vec!["p1", "p2"]),
                ("SQ002".to_string(), vec!["p2"]),
                ("(Other) Nix".to_string(), vec!["p3"]),
            ]
        );

        let counts = collapsed.value_counts();
        assert_eq!(counts[0].value, Some(&AnswerValue::from("Git")));
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts.iter().map(|entry| entry.count).sum::<usize>(), 4);
    }

    #[test]
    fn collapsed_id_uses_the_collection_separator() {
        let collection = QuestionCollection::new(
            id("Q009"),
            Translated::single(LanguageCode::En, "Empty"),
            "Empty",
            DEFAULT_SEPARATOR,
        );
        let collapsed = collection.collapse(LanguageCode::De).unwrap();
        assert_eq!(collapsed.question().short_id().as_str(), "Q009*");
        assert_eq!(collapsed.question().answer_options().count(), 0);
        assert_eq!(collapsed.participants().count(), 0);
    }
}
