use thiserror::Error;

use crate::{LanguageCode, ValueType};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid id '{id}': ids must be non-empty and must not contain '{separator}'")]
    InvalidId { id: String, separator: char },

    #[error("attempted to assign duplicate id {id}")]
    DuplicateId { id: String },

    #[error("unknown id {id}")]
    UnknownId { id: String },

    #[error("unrecognized language code '{code}'")]
    UnknownLanguage { code: String },

    #[error("no translation available for language '{language}'")]
    MissingTranslation { language: LanguageCode },

    #[error("translated text must provide at least one language")]
    EmptyTranslation,

    #[error("unknown value type '{0}' (expected bool, int, float or str)")]
    UnknownValueType(String),

    #[error("cannot interpret '{raw}' as {expected}")]
    Coercion { raw: String, expected: ValueType },

    #[error("answer option {option} has a {actual} value but the question expects {expected}")]
    OptionTypeMismatch {
        option: String,
        actual: ValueType,
        expected: ValueType,
    },

    #[error("question {question} is mandatory but participant {participant} gave no answer")]
    MissingMandatoryAnswer {
        question: String,
        participant: String,
    },

    #[error(
        "answer '{raw}' of participant {participant} does not fit question {question} (expected {expected})"
    )]
    InvalidAnswer {
        question: String,
        participant: String,
        raw: String,
        expected: ValueType,
    },

    #[error("participant {participant} already answered question {question}")]
    DuplicateAnswer {
        question: String,
        participant: String,
    },

    #[error("answer filter must include predefined or free-text answers")]
    EmptyFilter,
}

pub type Result<T> = std::result::Result<T, ModelError>;
