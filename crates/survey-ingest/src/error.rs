#![deny(unsafe_code)]

use std::path::PathBuf;

use survey_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse YAML metadata {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("metadata document {origin} must be a mapping or a list of mappings")]
    InvalidDocument { origin: String },

    #[error("invalid metadata for {entry}: {message}")]
    Schema { entry: String, message: String },

    #[error("invalid metadata for {entry}: {source}")]
    Model {
        entry: String,
        #[source]
        source: ModelError,
    },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            entry: entry.into(),
            message: message.into(),
        }
    }

    pub(crate) fn model(entry: impl Into<String>, source: ModelError) -> Self {
        Self::Model {
            entry: entry.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
