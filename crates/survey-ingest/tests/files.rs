use std::fs;
use std::path::PathBuf;

use survey_ingest::{
    IngestError, MetadataOptions, build_collection, read_csv_table, read_metadata_file,
};
use survey_model::Identifiable;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn reads_response_table_from_disk() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(
        &dir,
        "responses.csv",
        "id,Q001/SQ001,Q001/SQ002,unrelated\n1,True,,x\n\n2,False,text\n",
    );
    let table = read_csv_table(&path).expect("read csv");
    assert_eq!(
        table.headers,
        vec!["id", "Q001/SQ001", "Q001/SQ002", "unrelated"]
    );
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1], vec!["2", "False", "text", ""]);
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("absent.csv");
    let err = read_csv_table(&path).unwrap_err();
    match err {
        IngestError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn metadata_file_builds_every_collection() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(
        &dir,
        "survey.yml",
        r#"
- id: Q002
  label: Languages
  text: {en: Languages}
  questions:
    - {id: SQ001, text: {en: Rust}, type: bool}
    - {id: SQ002, text: {en: Years}, type: int, mandatory: false}
- id: Q003
  label: Platforms
  text: {en: Platforms, de: Plattformen}
  questions:
    - {id: SQ001, text: {en: GitHub}, type: bool}
"#,
    );
    let raw = read_metadata_file(&path).expect("read metadata");
    let built: Vec<String> = raw
        .iter()
        .map(|entry| build_collection(entry, &MetadataOptions::default()).expect("build"))
        .flat_map(|collection| {
            collection
                .questions()
                .map(|question| question.full_id().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(built, ["Q002/SQ001", "Q002/SQ002", "Q003/SQ001"]);
}

#[test]
fn broken_yaml_names_the_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(&dir, "broken.yml", "- id: [unclosed\n");
    let err = read_metadata_file(&path).unwrap_err();
    assert!(err.to_string().contains("broken.yml"), "{err}");
}
