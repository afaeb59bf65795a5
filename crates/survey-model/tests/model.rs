use proptest::prelude::*;
use survey_model::{
    AnswerOption, AnswerValue, DEFAULT_SEPARATOR, Identifiable, LanguageCode, Question,
    QuestionCollection, QuestionNode, ShortId, Translated, ValueTokens, ValueType,
};

fn id(value: &str) -> ShortId {
    ShortId::new(value, DEFAULT_SEPARATOR).expect("valid id")
}

fn text(value: &str) -> Translated {
    Translated::new([("en", value), ("de", value)]).expect("translation")
}

fn usage_collection() -> QuestionCollection {
    let mut collection = QuestionCollection::new(id("Q001"), text("Usage"), "Usage", '/');

    let short = id("SQ001");
    let full = collection.question_full_id(&short);
    let mut used = Question::new(short, full, text("Used it?"), ValueType::Bool);
    let yes = id("A001");
    let yes_full = used.full_id().child(&yes, '/');
    used.add_answer_option(AnswerOption::new(
        yes,
        yes_full,
        text("Yes"),
        None,
        AnswerValue::Bool(true),
    ))
    .expect("option");
    collection.add_question(used).expect("question");

    let short = id("SQ002");
    let full = collection.question_full_id(&short);
    let comment = Question::new(short, full, text("Comment"), ValueType::Str).with_mandatory(false);
    collection.add_question(comment).expect("question");
    collection
}

#[test]
fn collection_structure_renders_as_tree() {
    let collection = usage_collection();
    insta::assert_snapshot!(collection.to_string(), @r"
    Q001 (Usage)
      Q001/SQ001 [bool, mandatory]
        Q001/SQ001/A001 = true
      Q001/SQ002 [str]
    ");
}

#[test]
fn scenario_bool_and_optional_text() {
    let tokens = ValueTokens::default();
    let mut collection = usage_collection();
    collection
        .question_for_id_mut("SQ001")
        .unwrap()
        .add_answer("1", "True", &tokens)
        .unwrap();
    collection
        .question_for_id_mut("SQ002")
        .unwrap()
        .add_answer("1", "", &tokens)
        .unwrap();

    let bools = collection.question_for_id("SQ001").unwrap().as_series();
    assert_eq!(bools.get("1"), Some(Some(&AnswerValue::Bool(true))));

    let comments = collection.question_for_id("SQ002").unwrap().as_series();
    assert_eq!(comments.get("1"), Some(None));
    assert_eq!(comments.valid().count(), 0);
}

#[test]
fn node_flattens_to_questions() {
    let collection = usage_collection();
    let group = QuestionNode::Group(&collection);
    assert!(group.is_group());
    let ids: Vec<&str> = group
        .flatten()
        .into_iter()
        .map(|question| question.full_id().as_str())
        .collect();
    assert_eq!(ids, ["Q001/SQ001", "Q001/SQ002"]);

    let leaf = QuestionNode::Leaf(collection.question_for_id("SQ002").unwrap());
    assert_eq!(leaf.full_id().as_str(), "Q001/SQ002");
    assert_eq!(leaf.flatten().len(), 1);
    assert_eq!(leaf.text().get_translation(LanguageCode::De).unwrap(), "Comment");
}

#[test]
fn answer_option_serializes_to_json() {
    let collection = usage_collection();
    let option = collection
        .question_for_id("SQ001")
        .unwrap()
        .answer_option("A001")
        .unwrap();
    let value = serde_json::to_value(option).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "short_id": "A001",
            "full_id": "Q001/SQ001/A001",
            "text": {"translations": {"de": "Yes", "en": "Yes"}},
            "short_text": null,
            "value": true,
        })
    );
}

proptest! {
    #[test]
    fn integers_survive_coercion(value in any::<i64>()) {
        let tokens = ValueTokens::default();
        let coerced = tokens.coerce(&value.to_string(), ValueType::Int).unwrap();
        prop_assert_eq!(coerced, Some(AnswerValue::Int(value)));
    }

    #[test]
    fn bool_tokens_ignore_case(
        token in prop::sample::select(vec!["true", "yes", "y", "false", "no", "n"]),
        upper in any::<bool>(),
    ) {
        let tokens = ValueTokens::default();
        let raw = if upper { token.to_uppercase() } else { token.to_string() };
        let expected = matches!(token, "true" | "yes" | "y");
        let coerced = tokens.coerce(&raw, ValueType::Bool).unwrap();
        prop_assert_eq!(coerced, Some(AnswerValue::Bool(expected)));
    }

    #[test]
    fn short_ids_never_contain_separator(value in "[A-Za-z0-9/ ]{0,12}") {
        match ShortId::new(value.clone(), '/') {
            Ok(short) => {
                prop_assert!(!short.as_str().contains('/'));
                prop_assert!(!short.as_str().is_empty());
            }
            Err(_) => prop_assert!(value.trim().is_empty() || value.contains('/')),
        }
    }
}
