use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use survey_cli::scripts::ScriptRegistry;
use survey_core::{CoercionPolicy, DataContainer, Settings, settings::DEFAULT_SETTINGS_FILE};

use crate::cli::{AnalyzeArgs, InitArgs, MetadataArgs};
use crate::summary::print_scripts;
use crate::types::AnalyzeResult;

pub fn run_analyze(args: &AnalyzeArgs) -> Result<AnalyzeResult> {
    let (mut settings, settings_file) = load_settings(args.config.as_deref())?;
    if !args.metadata.is_empty() {
        settings.metadata = args.metadata.clone();
    }
    if !args.scripts.is_empty() {
        settings.scripts = args.scripts.clone();
    }
    if args.lenient {
        settings.coercion = CoercionPolicy::Lenient;
    }
    if let Some(language) = args.language {
        settings.language = language;
    }
    if settings.metadata.is_empty() {
        bail!("no metadata given: pass --metadata or list files under `metadata` in the settings");
    }

    let registry = ScriptRegistry::builtin();
    // Unknown analysis names fail before any file is read.
    registry.select(&settings.scripts)?;

    let span = info_span!("analyze", data = %args.data.display());
    let _guard = span.enter();
    let start = Instant::now();
    let coercion = settings.coercion;
    let metadata_files = settings.metadata.clone();
    let scripts = settings.scripts.clone();
    let mut container = DataContainer::new(settings);
    let metadata = container
        .load_metadata_files(&metadata_files)
        .context("load metadata")?;
    let ingest = container
        .load_survey_file(&args.data)
        .with_context(|| format!("load survey data {}", args.data.display()))?;

    let runs = registry.run(&container, &scripts)?;
    let has_errors = runs.iter().any(|run| !run.succeeded());
    info!(
        analyses = runs.len(),
        failed = runs.iter().filter(|run| !run.succeeded()).count(),
        duration_ms = start.elapsed().as_millis(),
        "analysis run complete"
    );
    Ok(AnalyzeResult {
        settings_file,
        coercion,
        metadata,
        ingest,
        runs,
        has_errors,
    })
}

pub fn run_metadata(args: &MetadataArgs) -> Result<()> {
    let (settings, _) = load_settings(args.config.as_deref())?;
    let mut container = DataContainer::new(settings);
    let report = container
        .load_metadata_files(&args.files)
        .context("load metadata")?;
    for collection in container.collections() {
        print!("{collection}");
    }
    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report.skipped.iter().map(ToString::to_string).collect();
        println!("Skipped duplicates: {}", skipped.join(", "));
    }
    Ok(())
}

pub fn run_scripts() -> Result<()> {
    print_scripts(&ScriptRegistry::builtin());
    Ok(())
}

pub fn run_init(args: &InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to replace it)",
            args.path.display()
        );
    }
    let contents = Settings::default()
        .to_toml_string()
        .context("render default settings")?;
    fs::write(&args.path, contents)
        .with_context(|| format!("write {}", args.path.display()))?;
    println!("Wrote {}", args.path.display());
    Ok(())
}

/// Settings from `explicit`, else from `survey.toml` in the working
/// directory when present, else defaults.
fn load_settings(explicit: Option<&Path>) -> Result<(Settings, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !fallback.is_file() {
                return Ok((Settings::default(), None));
            }
            fallback
        }
    };
    let settings = Settings::load(&path)
        .with_context(|| format!("load settings {}", path.display()))?;
    Ok((settings, Some(path)))
}
