use std::path::PathBuf;

use survey_core::{CoercionPolicy, IngestReport, MetadataReport};
use survey_cli::scripts::ScriptRun;

#[derive(Debug)]
pub struct AnalyzeResult {
    pub settings_file: Option<PathBuf>,
    pub coercion: CoercionPolicy,
    pub metadata: MetadataReport,
    pub ingest: IngestReport,
    pub runs: Vec<ScriptRun>,
    pub has_errors: bool,
}
