//! Answer value types and the text-to-value coercion rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// The declared type of the answers to a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    #[default]
    Str,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" => Ok(ValueType::Bool),
            "int" => Ok(ValueType::Int),
            "float" => Ok(ValueType::Float),
            "str" => Ok(ValueType::Str),
            _ => Err(ModelError::UnknownValueType(s.to_string())),
        }
    }
}

/// A coerced answer value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl AnswerValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            AnswerValue::Bool(_) => ValueType::Bool,
            AnswerValue::Int(_) => ValueType::Int,
            AnswerValue::Float(_) => ValueType::Float,
            AnswerValue::Str(_) => ValueType::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AnswerValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AnswerValue::Int(value) => Some(*value as f64),
            AnswerValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnswerValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Bool(value) => write!(f, "{value}"),
            AnswerValue::Int(value) => write!(f, "{value}"),
            AnswerValue::Float(value) => write!(f, "{value}"),
            AnswerValue::Str(value) => f.write_str(value),
        }
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Int(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Float(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Str(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Str(value)
    }
}

/// Recognized raw tokens for booleans and for "no answer".
///
/// All comparisons ignore ASCII case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueTokens {
    pub true_values: Vec<String>,
    pub false_values: Vec<String>,
    pub null_values: Vec<String>,
}

impl Default for ValueTokens {
    fn default() -> Self {
        Self {
            true_values: ["true", "yes", "y", "1"].map(String::from).to_vec(),
            false_values: ["false", "no", "n", "0"].map(String::from).to_vec(),
            null_values: ["", "nan", "none"].map(String::from).to_vec(),
        }
    }
}

impl ValueTokens {
    pub fn is_null(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty() || contains_token(&self.null_values, trimmed)
    }

    pub fn parse_bool(&self, raw: &str) -> Option<bool> {
        let trimmed = raw.trim();
        if contains_token(&self.true_values, trimmed) {
            Some(true)
        } else if contains_token(&self.false_values, trimmed) {
            Some(false)
        } else {
            None
        }
    }

    /// Parses non-null text as `value_type`. Null tokens are not special here.
    pub fn parse(&self, raw: &str, value_type: ValueType) -> Option<AnswerValue> {
        let trimmed = raw.trim();
        match value_type {
            ValueType::Bool => self.parse_bool(trimmed).map(AnswerValue::Bool),
            ValueType::Int => parse_int(trimmed).map(AnswerValue::Int),
            ValueType::Float => parse_float(trimmed).map(AnswerValue::Float),
            ValueType::Str => Some(AnswerValue::Str(trimmed.to_string())),
        }
    }

    /// Coerces raw text; null tokens become `None`.
    pub fn coerce(
        &self,
        raw: &str,
        value_type: ValueType,
    ) -> Result<Option<AnswerValue>, ModelError> {
        if self.is_null(raw) {
            return Ok(None);
        }
        self.parse(raw, value_type)
            .map(Some)
            .ok_or_else(|| ModelError::Coercion {
                raw: raw.to_string(),
                expected: value_type,
            })
    }

    /// Converts an already typed value to `value_type`.
    ///
    /// Integers widen to floats, integral floats narrow to integers and
    /// strings go through [`ValueTokens::parse`].
    pub fn convert(
        &self,
        value: AnswerValue,
        value_type: ValueType,
    ) -> Result<AnswerValue, ModelError> {
        let raw = value.to_string();
        let converted = match (value, value_type) {
            (value, wanted) if value.value_type() == wanted => Some(value),
            (AnswerValue::Int(value), ValueType::Float) => Some(AnswerValue::Float(value as f64)),
            (AnswerValue::Float(value), ValueType::Int) => {
                float_to_int(value).map(AnswerValue::Int)
            }
            (AnswerValue::Str(text), wanted) => self.parse(&text, wanted),
            (other, ValueType::Str) => Some(AnswerValue::Str(other.to_string())),
            _ => None,
        };
        converted.ok_or(ModelError::Coercion {
            raw,
            expected: value_type,
        })
    }
}

fn contains_token(tokens: &[String], value: &str) -> bool {
    tokens
        .iter()
        .any(|token| token.trim().eq_ignore_ascii_case(value))
}

fn parse_int(value: &str) -> Option<i64> {
    if value.is_empty() {
        return None;
    }
    value
        .parse::<i64>()
        .ok()
        .or_else(|| parse_float(value).and_then(float_to_int))
}

fn parse_float(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    value.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

fn float_to_int(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_parses_metadata_names() {
        assert_eq!("bool".parse::<ValueType>().unwrap(), ValueType::Bool);
        assert_eq!("Float".parse::<ValueType>().unwrap(), ValueType::Float);
        assert!("date".parse::<ValueType>().is_err());
    }

    #[test]
    fn booleans_use_tokens() {
        let tokens = ValueTokens::default();
        assert_eq!(
            tokens.coerce("True", ValueType::Bool).unwrap(),
            Some(AnswerValue::Bool(true))
        );
        assert_eq!(
            tokens.coerce(" N ", ValueType::Bool).unwrap(),
            Some(AnswerValue::Bool(false))
        );
        assert!(tokens.coerce("maybe", ValueType::Bool).is_err());
    }

    #[test]
    fn null_tokens_become_none() {
        let tokens = ValueTokens::default();
        for raw in ["", "  ", "nan", "NaN", "None"] {
            assert_eq!(tokens.coerce(raw, ValueType::Int).unwrap(), None, "{raw:?}");
        }
        assert_eq!(
            tokens.coerce("N/A", ValueType::Str).unwrap(),
            Some(AnswerValue::Str("N/A".to_string()))
        );
    }

    #[test]
    fn numbers_parse_decimal_text() {
        let tokens = ValueTokens::default();
        assert_eq!(
            tokens.coerce("123", ValueType::Int).unwrap(),
            Some(AnswerValue::Int(123))
        );
        assert_eq!(
            tokens.coerce("12.0", ValueType::Int).unwrap(),
            Some(AnswerValue::Int(12))
        );
        assert!(tokens.coerce("12.5", ValueType::Int).is_err());
        assert_eq!(
            tokens.coerce("12.3", ValueType::Float).unwrap(),
            Some(AnswerValue::Float(12.3))
        );
        assert!(tokens.coerce("inf", ValueType::Float).is_err());
    }

    #[test]
    fn convert_widens_and_narrows() {
        let tokens = ValueTokens::default();
        assert_eq!(
            tokens.convert(AnswerValue::Int(2), ValueType::Float).unwrap(),
            AnswerValue::Float(2.0)
        );
        assert_eq!(
            tokens.convert(AnswerValue::Float(3.0), ValueType::Int).unwrap(),
            AnswerValue::Int(3)
        );
        assert_eq!(
            tokens.convert(AnswerValue::from("yes"), ValueType::Bool).unwrap(),
            AnswerValue::Bool(true)
        );
        assert!(tokens.convert(AnswerValue::Bool(true), ValueType::Int).is_err());
    }
}
