use anyhow::bail;
use survey_cli::scripts::{Script, ScriptOutput, ScriptRegistry};
use survey_core::{DataContainer, Settings};

const METADATA: &str = r#"
- id: Q001
  label: Tools
  text: {en: Which tools do you use?}
  questions:
    - {id: SQ001, text: {en: Git}, type: bool}
    - id: SQ002
      text: {en: Editor}
      type: str
      mandatory: false
      answers:
        - {id: A001, text: {en: Vim}}
        - {id: A002, text: {en: Emacs}}
- id: Q002
  label: Experience
  text: {en: Experience}
  questions:
    - {id: SQ001, text: {en: Years}, type: int, mandatory: false}
"#;

fn container() -> DataContainer {
    let mut container = DataContainer::new(Settings::default());
    container.load_metadata_yaml(METADATA, "inline").unwrap();
    let rows: &[&[&str]] = &[
        &["id", "Q001/SQ001", "Q001/SQ002", "Q002/SQ001"],
        &["1", "yes", "A001", "4"],
        &["2", "no", "Nano", ""],
        &["3", "yes", "Vim", "8"],
    ];
    container
        .load_survey_data(rows.iter().map(|row| row.iter()), "responses.csv")
        .unwrap();
    container
}

fn failing(_: &DataContainer) -> anyhow::Result<Vec<ScriptOutput>> {
    bail!("plot backend unavailable")
}

#[test]
fn builtin_table_lists_every_analysis() {
    let registry = ScriptRegistry::builtin();
    let names: Vec<&str> = registry.scripts().iter().map(|script| script.name).collect();
    assert_eq!(
        names,
        [
            "collection-overview",
            "value-counts",
            "descriptive-statistics",
            "answer-sources",
            "multiple-choice"
        ]
    );
}

#[test]
fn unknown_names_are_rejected_before_running() {
    let registry = ScriptRegistry::builtin();
    let err = registry.select(&["value-counts", "plots"]).unwrap_err();
    assert!(err.to_string().contains("unknown analysis plots"), "{err}");
    assert_eq!(registry.select::<&str>(&[]).unwrap().len(), 5);
}

#[test]
fn duplicate_registration_fails() {
    let mut registry = ScriptRegistry::builtin();
    let err = registry
        .register(Script::new("value-counts", "again", failing))
        .unwrap_err();
    assert!(err.to_string().contains("already registered"));
}

#[test]
fn failing_analysis_does_not_stop_the_batch() {
    let mut registry = ScriptRegistry::empty();
    registry
        .register(Script::new("broken", "always fails", failing))
        .unwrap();
    registry
        .register(*ScriptRegistry::builtin().get("collection-overview").unwrap())
        .unwrap();

    let runs = registry.run::<&str>(&container(), &[]).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(!runs[0].succeeded());
    assert_eq!(runs[0].error.as_deref(), Some("plot backend unavailable"));
    assert!(runs[1].succeeded());
    assert_eq!(runs[1].outputs.len(), 1);
}

#[test]
fn collection_overview_counts_respondents() {
    let container = container();
    let runs = ScriptRegistry::builtin()
        .run(&container, &["collection-overview"])
        .unwrap();
    let frame = &runs[0].outputs[0].frame;
    assert_eq!(runs[0].outputs[0].title, "Collections (3 participants)");
    let questions = frame.column("questions").unwrap().u64().unwrap();
    assert_eq!(questions.get(0), Some(2));
    let respondents = frame.column("respondents").unwrap().u64().unwrap();
    assert_eq!(respondents.get(0), Some(3));
    assert_eq!(respondents.get(1), Some(2));
}

#[test]
fn value_counts_cover_bool_and_choice_questions() {
    let container = container();
    let runs = ScriptRegistry::builtin()
        .run(&container, &["value-counts"])
        .unwrap();
    let titles: Vec<&str> = runs[0]
        .outputs
        .iter()
        .map(|output| output.title.as_str())
        .collect();
    assert_eq!(titles, ["Q001/SQ001: Git", "Q001/SQ002: Editor"]);
    let counts = runs[0].outputs[0].frame.column("count").unwrap().u64().unwrap();
    assert_eq!(counts.get(0), Some(2));
}

#[test]
fn descriptive_statistics_skip_missing_answers() {
    let container = container();
    let runs = ScriptRegistry::builtin()
        .run(&container, &["descriptive-statistics"])
        .unwrap();
    let frame = &runs[0].outputs[0].frame;
    assert_eq!(frame.height(), 1);
    assert_eq!(frame.column("answers").unwrap().u64().unwrap().get(0), Some(2));
    assert_eq!(frame.column("missing").unwrap().u64().unwrap().get(0), Some(1));
    assert_eq!(frame.column("mean").unwrap().f64().unwrap().get(0), Some(6.0));
    assert_eq!(frame.column("min").unwrap().f64().unwrap().get(0), Some(4.0));
    assert_eq!(frame.column("max").unwrap().f64().unwrap().get(0), Some(8.0));
}

#[test]
fn answer_sources_separate_options_from_free_text() {
    let container = container();
    let runs = ScriptRegistry::builtin()
        .run(&container, &["answer-sources"])
        .unwrap();
    let frame = &runs[0].outputs[0].frame;
    assert_eq!(frame.column("predefined").unwrap().u64().unwrap().get(0), Some(2));
    assert_eq!(frame.column("free_text").unwrap().u64().unwrap().get(0), Some(1));
}

#[test]
fn checkbox_collections_are_counted_per_selection() {
    let container = container();
    let runs = ScriptRegistry::builtin()
        .run(&container, &["multiple-choice"])
        .unwrap();
    assert!(runs[0].succeeded());
    assert_eq!(runs[0].outputs.len(), 1);
    let output = &runs[0].outputs[0];
    assert_eq!(output.title, "Q001*: Which tools do you use?");
    let answers = output.frame.column("answer").unwrap().str().unwrap();
    let counts = output.frame.column("count").unwrap().u64().unwrap();
    let rows: Vec<(Option<&str>, Option<u64>)> = answers.into_iter().zip(counts).collect();
    assert_eq!(
        rows,
        [
            (Some("Git"), Some(2)),
            (Some("(Editor) Vim"), Some(2)),
            (Some("(Editor) Nano"), Some(1)),
        ]
    );
}
