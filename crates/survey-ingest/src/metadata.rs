//! YAML metadata schema and conversion into the question model.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use survey_model::{
    AnswerOption, AnswerValue, DEFAULT_SEPARATOR, Identifiable, LanguageCode, Question,
    QuestionCollection, ShortId, Translated, ValueTokens, ValueType,
};

use crate::{IngestError, Result};

/// One collection entry of a metadata document, as written.
///
/// Keys not listed here are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCollection {
    pub id: String,
    pub label: String,
    pub text: BTreeMap<String, String>,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestion {
    pub id: String,
    pub text: BTreeMap<String, String>,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub answers: Vec<RawAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAnswer {
    pub id: String,
    pub text: BTreeMap<String, String>,
    #[serde(rename = "short-text", default)]
    pub short_text: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub value: Option<Value>,
}

fn default_mandatory() -> bool {
    true
}

/// Settings that shape how raw metadata becomes model objects.
#[derive(Debug, Clone)]
pub struct MetadataOptions {
    pub separator: char,
    /// Language used to derive default option values from their text.
    pub language: LanguageCode,
    pub tokens: ValueTokens,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            language: LanguageCode::default(),
            tokens: ValueTokens::default(),
        }
    }
}

/// Parses a metadata document: a single collection mapping or a list of them.
///
/// Each entry is checked against the schema on its own so errors name the
/// offending collection.
pub fn parse_metadata_document(source: &str, origin: &str) -> Result<Vec<RawCollection>> {
    let document: Value = serde_yaml::from_str(source).map_err(|source| IngestError::Yaml {
        origin: origin.to_string(),
        source,
    })?;
    let entries = match document {
        Value::Null => Vec::new(),
        Value::Sequence(entries) => entries,
        mapping @ Value::Mapping(_) => vec![mapping],
        _ => {
            return Err(IngestError::InvalidDocument {
                origin: origin.to_string(),
            });
        }
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = entry_name(&entry, index);
            serde_yaml::from_value::<RawCollection>(entry)
                .map_err(|source| IngestError::schema(name, source.to_string()))
        })
        .collect()
}

pub fn read_metadata_file(path: &Path) -> Result<Vec<RawCollection>> {
    let source = fs::read_to_string(path).map_err(|source| IngestError::io(path, source))?;
    let collections = parse_metadata_document(&source, &path.display().to_string())?;
    debug!(path = %path.display(), collections = collections.len(), "metadata file parsed");
    Ok(collections)
}

fn entry_name(entry: &Value, index: usize) -> String {
    match entry.get("id") {
        Some(Value::String(id)) => format!("collection {id}"),
        _ => format!("metadata entry #{}", index + 1),
    }
}

/// Builds a collection with its questions and answer options.
pub fn build_collection(
    raw: &RawCollection,
    options: &MetadataOptions,
) -> Result<QuestionCollection> {
    let entry = format!("collection {}", raw.id);
    let short_id = ShortId::new(raw.id.as_str(), options.separator)
        .map_err(|err| IngestError::model(&entry, err))?;
    let text = Translated::new(&raw.text).map_err(|err| IngestError::model(&entry, err))?;
    if raw.label.trim().is_empty() {
        return Err(IngestError::schema(entry, "label must not be empty"));
    }

    let mut collection =
        QuestionCollection::new(short_id, text, raw.label.trim(), options.separator);
    for raw_question in &raw.questions {
        let question = build_question(&collection, raw_question, options)?;
        let name = format!("question {}", question.full_id());
        collection
            .add_question(question)
            .map_err(|err| IngestError::model(name, err))?;
    }
    debug!(collection = %collection.full_id(), questions = collection.len(), "collection built");
    Ok(collection)
}

fn build_question(
    collection: &QuestionCollection,
    raw: &RawQuestion,
    options: &MetadataOptions,
) -> Result<Question> {
    let entry = format!("question {}{}{}", collection.full_id(), options.separator, raw.id);
    let short_id = ShortId::new(raw.id.as_str(), options.separator)
        .map_err(|err| IngestError::model(&entry, err))?;
    let full_id = collection.question_full_id(&short_id);
    let value_type = raw
        .value_type
        .as_deref()
        .map(str::parse::<ValueType>)
        .transpose()
        .map_err(|err| IngestError::model(&entry, err))?
        .unwrap_or_default();
    let text = Translated::new(&raw.text).map_err(|err| IngestError::model(&entry, err))?;

    let mut question =
        Question::new(short_id, full_id, text, value_type).with_mandatory(raw.mandatory);
    for raw_answer in &raw.answers {
        let option = build_option(&question, raw_answer, options)?;
        let name = format!("answer option {}", option.full_id());
        question
            .add_answer_option(option)
            .map_err(|err| IngestError::model(name, err))?;
    }
    Ok(question)
}

fn build_option(
    question: &Question,
    raw: &RawAnswer,
    options: &MetadataOptions,
) -> Result<AnswerOption> {
    let entry = format!("answer option {}{}{}", question.full_id(), options.separator, raw.id);
    let short_id = ShortId::new(raw.id.as_str(), options.separator)
        .map_err(|err| IngestError::model(&entry, err))?;
    let full_id = question.full_id().child(&short_id, options.separator);
    let text = Translated::new(&raw.text).map_err(|err| IngestError::model(&entry, err))?;
    let short_text = raw
        .short_text
        .as_ref()
        .map(Translated::new)
        .transpose()
        .map_err(|err| IngestError::model(&entry, err))?;

    let value = match raw.value.as_ref().and_then(yaml_scalar) {
        Some(value) => options
            .tokens
            .convert(value, question.value_type())
            .map_err(|err| IngestError::model(&entry, err))?,
        None => default_option_value(short_id.as_str(), &text, question.value_type(), options)
            .ok_or_else(|| {
                let message = format!(
                    "no value given and none derivable for type {}",
                    question.value_type()
                );
                IngestError::schema(&entry, message)
            })?,
    };
    Ok(AnswerOption::new(short_id, full_id, text, short_text, value))
}

fn yaml_scalar(value: &Value) -> Option<AnswerValue> {
    match value {
        Value::Bool(flag) => Some(AnswerValue::Bool(*flag)),
        Value::Number(number) => number
            .as_i64()
            .map(AnswerValue::Int)
            .or_else(|| number.as_f64().map(AnswerValue::Float)),
        Value::String(text) => Some(AnswerValue::Str(text.clone())),
        _ => None,
    }
}

/// String options stand for their text; typed options are derived from the
/// id first, then from the text.
fn default_option_value(
    id: &str,
    text: &Translated,
    value_type: ValueType,
    options: &MetadataOptions,
) -> Option<AnswerValue> {
    let label = text.get_or_fallback(options.language);
    match value_type {
        ValueType::Str => Some(AnswerValue::Str(label.to_string())),
        other => options
            .tokens
            .parse(id, other)
            .or_else(|| options.tokens.parse(label, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USAGE: &str = r#"
- id: Q001
  label: Usage
  text:
    en: Which tools do you use?
    de: Welche Werkzeuge nutzen Sie?
  questions:
    - id: SQ001
      text: {en: Git}
      type: bool
      answers:
        - id: A001
          text: {en: "Yes"}
          value: true
    - id: SQ002
      text: {en: Other}
      mandatory: false
"#;

    #[test]
    fn parses_list_document() {
        let raw = parse_metadata_document(USAGE, "inline").expect("parse");
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].questions.len(), 2);
        assert!(raw[0].questions[0].mandatory);
        assert!(!raw[0].questions[1].mandatory);
    }

    #[test]
    fn single_mapping_is_accepted() {
        let doc = "id: Q009\nlabel: Solo\ntext: {en: Solo}\nextra: ignored\n";
        let raw = parse_metadata_document(doc, "inline").expect("parse");
        assert_eq!(raw[0].id, "Q009");
        assert!(raw[0].questions.is_empty());
    }

    #[test]
    fn missing_text_names_collection() {
        let doc = "- id: Q002\n  label: Broken\n";
        let err = parse_metadata_document(doc, "inline").unwrap_err();
        assert!(matches!(err, IngestError::Schema { ref entry, .. } if entry == "collection Q002"));
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(matches!(
            parse_metadata_document("42", "inline"),
            Err(IngestError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn builds_collection_graph() {
        let raw = parse_metadata_document(USAGE, "inline").expect("parse");
        let collection = build_collection(&raw[0], &MetadataOptions::default()).expect("build");
        assert_eq!(collection.label(), "Usage");
        let git = collection.question_for_id("SQ001").expect("SQ001");
        assert_eq!(git.full_id().as_str(), "Q001/SQ001");
        assert_eq!(git.value_type(), ValueType::Bool);
        let yes = git.answer_option("A001").expect("A001");
        assert_eq!(yes.full_id().as_str(), "Q001/SQ001/A001");
        assert_eq!(yes.value(), &AnswerValue::Bool(true));
        let other = collection.question_for_id("SQ002").expect("SQ002");
        assert_eq!(other.value_type(), ValueType::Str);
        assert!(!other.mandatory());
    }

    #[test]
    fn string_options_default_to_their_text() {
        let doc = r#"
- id: Q003
  label: Choice
  text: {en: Pick one}
  questions:
    - id: SQ001
      text: {en: Pick}
      answers:
        - {id: A001, text: {en: "No", de: "Nein"}}
        - {id: A002, text: {en: "Yes", de: "Ja"}, short-text: {en: "Y"}}
"#;
        let raw = parse_metadata_document(doc, "inline").expect("parse");
        let options = MetadataOptions {
            language: LanguageCode::De,
            ..MetadataOptions::default()
        };
        let collection = build_collection(&raw[0], &options).expect("build");
        let question = collection.question_for_id("SQ001").expect("SQ001");
        let values: Vec<String> = question
            .answer_options()
            .map(|option| option.value().to_string())
            .collect();
        assert_eq!(values, ["Nein", "Ja"]);
        let yes = question.answer_option("A002").expect("A002");
        assert_eq!(yes.label(LanguageCode::En), "Y");
    }

    #[test]
    fn typed_options_derive_value_from_id_or_text() {
        let doc = r#"
- id: Q004
  label: Scale
  text: {en: Rate}
  questions:
    - id: SQ001
      text: {en: Rating}
      type: int
      answers:
        - {id: "1", text: {en: Low}}
        - {id: A002, text: {en: "5"}}
        - {id: A003, text: {en: High}, value: 9.0}
"#;
        let raw = parse_metadata_document(doc, "inline").expect("parse");
        let collection = build_collection(&raw[0], &MetadataOptions::default()).expect("build");
        let question = collection.question_for_id("SQ001").expect("SQ001");
        let values: Vec<i64> = question
            .answer_options()
            .filter_map(|option| option.value().as_int())
            .collect();
        assert_eq!(values, [1, 5, 9]);
    }

    #[test]
    fn underivable_option_value_is_a_schema_error() {
        let doc = r#"
- id: Q005
  label: Bad
  text: {en: Bad}
  questions:
    - id: SQ001
      text: {en: Count}
      type: int
      answers:
        - {id: A001, text: {en: Many}}
"#;
        let raw = parse_metadata_document(doc, "inline").expect("parse");
        let err = build_collection(&raw[0], &MetadataOptions::default()).unwrap_err();
        match err {
            IngestError::Schema { entry, .. } => assert_eq!(entry, "answer option Q005/SQ001/A001"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_language_and_type_are_rejected() {
        let bad_language = "- {id: Q006, label: L, text: {xx: Text}}\n";
        let raw = parse_metadata_document(bad_language, "inline").expect("parse");
        assert!(matches!(
            build_collection(&raw[0], &MetadataOptions::default()),
            Err(IngestError::Model { .. })
        ));

        let bad_type = r#"
- id: Q007
  label: L
  text: {en: T}
  questions: [{id: SQ001, text: {en: T}, type: date}]
"#;
        let raw = parse_metadata_document(bad_type, "inline").expect("parse");
        let err = build_collection(&raw[0], &MetadataOptions::default()).unwrap_err();
        match err {
            IngestError::Model { entry, .. } => assert_eq!(entry, "question Q007/SQ001"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let doc = r#"
- id: Q008
  label: L
  text: {en: T}
  questions:
    - {id: SQ001, text: {en: A}}
    - {id: SQ001, text: {en: B}}
"#;
        let raw = parse_metadata_document(doc, "inline").expect("parse");
        assert!(build_collection(&raw[0], &MetadataOptions::default()).is_err());
    }
}
