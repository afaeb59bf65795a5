//! Run configuration, read from `survey.toml`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use survey_ingest::MetadataOptions;
use survey_model::{DEFAULT_SEPARATOR, LanguageCode, ValueTokens};

use crate::{ContainerError, Result};

pub const DEFAULT_SETTINGS_FILE: &str = "survey.toml";

/// What to do when a collection id is loaded a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the first definition and log a warning.
    #[default]
    Skip,
    Overwrite,
    Fail,
}

/// How response cells that do not fit their question are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Any bad cell aborts the load and nothing is stored.
    #[default]
    Strict,
    /// Bad cells are skipped and reported.
    Lenient,
}

impl fmt::Display for CoercionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoercionPolicy::Strict => f.write_str("strict"),
            CoercionPolicy::Lenient => f.write_str("lenient"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preferred language for texts and labels.
    pub language: LanguageCode,
    pub id_separator: char,
    pub duplicate_collections: DuplicatePolicy,
    pub coercion: CoercionPolicy,
    /// Metadata files loaded in order.
    pub metadata: Vec<PathBuf>,
    /// Analyses to run; empty selects every registered one.
    pub scripts: Vec<String>,
    pub tokens: ValueTokens,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: LanguageCode::default(),
            id_separator: DEFAULT_SEPARATOR,
            duplicate_collections: DuplicatePolicy::default(),
            coercion: CoercionPolicy::default(),
            metadata: Vec::new(),
            scripts: Vec::new(),
            tokens: ValueTokens::default(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(source: &str, origin: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(source).map_err(|source| ContainerError::SettingsParse {
                origin: origin.to_string(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from `path`; relative metadata paths are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| ContainerError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml_str(&source, &path.display().to_string())?;
        if let Some(base) = path.parent() {
            for metadata in &mut settings.metadata {
                if metadata.is_relative() {
                    *metadata = base.join(&*metadata);
                }
            }
        }
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_separator.is_whitespace() || self.id_separator.is_alphanumeric() {
            return Err(ContainerError::InvalidSettings {
                message: format!(
                    "id_separator '{}' must be a punctuation character",
                    self.id_separator
                ),
            });
        }
        let overlap = self
            .tokens
            .true_values
            .iter()
            .find(|token| {
                self.tokens
                    .false_values
                    .iter()
                    .any(|other| other.eq_ignore_ascii_case(token))
            });
        if let Some(token) = overlap {
            return Err(ContainerError::InvalidSettings {
                message: format!("token '{token}' is listed as both true and false"),
            });
        }
        Ok(())
    }

    pub fn metadata_options(&self) -> MetadataOptions {
        MetadataOptions {
            separator: self.id_separator,
            language: self.language,
            tokens: self.tokens.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml_str("", "inline").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.id_separator, '/');
        assert_eq!(settings.coercion, CoercionPolicy::Strict);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let source = r#"
language = "de"
coercion = "lenient"
duplicate_collections = "overwrite"

[tokens]
null_values = ["", "n/a"]
"#;
        let settings = Settings::from_toml_str(source, "inline").unwrap();
        assert_eq!(settings.language, LanguageCode::De);
        assert_eq!(settings.coercion, CoercionPolicy::Lenient);
        assert_eq!(settings.duplicate_collections, DuplicatePolicy::Overwrite);
        assert_eq!(settings.tokens.null_values, vec!["", "n/a"]);
        assert_eq!(settings.tokens.true_values, ValueTokens::default().true_values);
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = Settings::from_toml_str("language = \"xx\"", "inline").unwrap_err();
        assert!(matches!(err, ContainerError::SettingsParse { .. }));
    }

    #[test]
    fn separator_must_be_punctuation() {
        let err = Settings::from_toml_str("id_separator = \"a\"", "inline").unwrap_err();
        assert!(matches!(err, ContainerError::InvalidSettings { .. }));
    }

    #[test]
    fn contradicting_tokens_are_rejected() {
        let source = "[tokens]\ntrue_values = [\"yes\"]\nfalse_values = [\"YES\"]\n";
        assert!(Settings::from_toml_str(source, "inline").is_err());
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let text = Settings::default().to_toml_string().unwrap();
        let parsed = Settings::from_toml_str(&text, "inline").unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
