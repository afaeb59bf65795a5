//! Argument definitions for the `survey` binary.

use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use survey_cli::logging::{LogConfig, LogFormat};
use survey_model::LanguageCode;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "survey",
    version,
    about = "Load survey metadata and responses, then run analyses",
    long_about = "Reconcile a YAML description of a survey's questions with a CSV of \
                  responses and run the built-in analyses over the result.\n\n\
                  Settings are read from survey.toml in the working directory unless \
                  --config names another file; command-line flags take precedence."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging setup for this invocation.
    ///
    /// `--log-level` beats `-v`/`-q`, and either one disables `RUST_LOG`.
    /// Colors go to stderr only: a log file or JSON lines stay plain.
    pub fn log_config(&self, stderr_is_terminal: bool) -> LogConfig {
        let explicit = self.log_level.map(LevelFilter::from);
        let format = LogFormat::from(self.log_format);
        let plain_sink = self.log_file.is_some() || format == LogFormat::Json;
        LogConfig {
            level_filter: explicit.unwrap_or_else(|| self.verbosity.tracing_level_filter()),
            use_env_filter: explicit.is_none() && !self.verbosity.is_present(),
            with_ansi: !plain_sink
                && match self.color.color {
                    ColorChoice::Always => true,
                    ColorChoice::Never => false,
                    ColorChoice::Auto => stderr_is_terminal,
                },
            format,
            log_file: self.log_file.clone(),
            ..LogConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Load metadata and responses and run analyses.
    Analyze(AnalyzeArgs),

    /// Print the question structure described by metadata files.
    Metadata(MetadataArgs),

    /// List the available analyses.
    Scripts,

    /// Write a settings file with every default spelled out.
    Init(InitArgs),
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// CSV file with one row per participant; the first column holds ids.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Metadata file to load (repeatable; replaces the files named in settings).
    #[arg(short = 'm', long = "metadata", value_name = "FILE")]
    pub metadata: Vec<PathBuf>,

    /// Settings file (default: ./survey.toml when present).
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Analysis to run (repeatable; default: all, or those named in settings).
    #[arg(short = 's', long = "script", value_name = "NAME")]
    pub scripts: Vec<String>,

    /// Skip response cells that do not fit their question instead of aborting.
    #[arg(long = "lenient")]
    pub lenient: bool,

    /// Language for question texts and answer labels.
    #[arg(long = "language", value_name = "CODE")]
    pub language: Option<LanguageCode>,
}

#[derive(Parser)]
pub struct MetadataArgs {
    /// Metadata files, loaded in order.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Settings file (default: ./survey.toml when present).
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Where to write the settings file.
    #[arg(value_name = "PATH", default_value = "survey.toml")]
    pub path: PathBuf,

    /// Replace an existing file.
    #[arg(long = "force")]
    pub force: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "survey",
            "analyze",
            "responses.csv",
            "-m",
            "a.yml",
            "--metadata",
            "b.yml",
            "-s",
            "value-counts",
            "--lenient",
            "--language",
            "DE",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.data, PathBuf::from("responses.csv"));
        assert_eq!(args.metadata, [PathBuf::from("a.yml"), PathBuf::from("b.yml")]);
        assert_eq!(args.scripts, ["value-counts"]);
        assert!(args.lenient);
        assert_eq!(args.language, Some(LanguageCode::De));
    }

    #[test]
    fn metadata_requires_a_file() {
        assert!(Cli::try_parse_from(["survey", "metadata"]).is_err());
    }

    #[test]
    fn explicit_level_overrides_verbosity_and_environment() {
        let cli = Cli::try_parse_from(["survey", "-v", "--log-level", "trace", "scripts"]).unwrap();
        let config = cli.log_config(true);
        assert_eq!(config.level_filter, LevelFilter::TRACE);
        assert!(!config.use_env_filter);

        let quiet = Cli::try_parse_from(["survey", "scripts"]).unwrap().log_config(true);
        assert_eq!(quiet.level_filter, LevelFilter::WARN);
        assert!(quiet.use_env_filter);
    }

    #[test]
    fn colors_only_reach_an_interactive_stderr() {
        let cli = Cli::try_parse_from(["survey", "scripts"]).unwrap();
        assert!(cli.log_config(true).with_ansi);
        assert!(!cli.log_config(false).with_ansi);

        let forced = Cli::try_parse_from(["survey", "--color", "always", "scripts"]).unwrap();
        assert!(forced.log_config(false).with_ansi);

        let to_file = Cli::try_parse_from([
            "survey", "--color", "always", "--log-file", "run.log", "scripts",
        ])
        .unwrap();
        let config = to_file.log_config(true);
        assert!(!config.with_ansi);
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));

        let json = Cli::try_parse_from(["survey", "--log-format", "json", "scripts"]).unwrap();
        let config = json.log_config(true);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.with_ansi);
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["survey", "scripts", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.log_format, LogFormatArg::Json));
        assert!(matches!(cli.command, Command::Scripts));
    }
}
