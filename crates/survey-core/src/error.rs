#![deny(unsafe_code)]

use std::path::PathBuf;

use polars::prelude::PolarsError;
use survey_ingest::IngestError;
use survey_model::ModelError;

use crate::ContainerState;

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("failed to read settings {path}: {source}")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {origin}: {source}")]
    SettingsParse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    #[error("invalid settings: {message}")]
    InvalidSettings { message: String },

    #[error("cannot {operation} while the container is {state}")]
    InvalidState {
        operation: &'static str,
        state: ContainerState,
    },

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("error while parsing metadata: {source}")]
    Metadata {
        #[source]
        source: ModelError,
    },

    #[error("{origin}: {source}")]
    MetadataSource {
        origin: String,
        #[source]
        source: Box<ContainerError>,
    },

    #[error("{data_source}: {source}")]
    Answer {
        data_source: String,
        #[source]
        source: ModelError,
    },

    #[error("{data_source}: row {row} has no participant id")]
    MissingParticipant { data_source: String, row: usize },

    #[error("{data_source}: participant {participant} appears more than once (row {row})")]
    DuplicateParticipant {
        data_source: String,
        participant: String,
        row: usize,
    },

    #[error("{data_source}: response table has no header row")]
    MissingHeader { data_source: String },

    #[error("cannot group by question {question}: {missing} participant(s) gave no answer")]
    GroupingWithMissing { question: String, missing: usize },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
