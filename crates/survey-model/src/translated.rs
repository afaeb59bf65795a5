//! Localized texts keyed by language code.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Languages a metadata text may be given in (ISO 639-1).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    Cs,
    Da,
    De,
    #[default]
    En,
    Es,
    Fi,
    Fr,
    It,
    Nl,
    Pl,
    Pt,
    Sv,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 12] = [
        LanguageCode::Cs,
        LanguageCode::Da,
        LanguageCode::De,
        LanguageCode::En,
        LanguageCode::Es,
        LanguageCode::Fi,
        LanguageCode::Fr,
        LanguageCode::It,
        LanguageCode::Nl,
        LanguageCode::Pl,
        LanguageCode::Pt,
        LanguageCode::Sv,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageCode::Cs => "cs",
            LanguageCode::Da => "da",
            LanguageCode::De => "de",
            LanguageCode::En => "en",
            LanguageCode::Es => "es",
            LanguageCode::Fi => "fi",
            LanguageCode::Fr => "fr",
            LanguageCode::It => "it",
            LanguageCode::Nl => "nl",
            LanguageCode::Pl => "pl",
            LanguageCode::Pt => "pt",
            LanguageCode::Sv => "sv",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LanguageCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ModelError::UnknownLanguage {
                code: s.to_string(),
            })
    }
}

/// A text available in one or more languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translated {
    translations: BTreeMap<LanguageCode, String>,
}

impl Translated {
    /// Builds a translation table, rejecting unknown language codes and
    /// empty tables.
    pub fn new<I, K, V>(entries: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut translations = BTreeMap::new();
        for (code, text) in entries {
            let language = code.as_ref().parse::<LanguageCode>()?;
            translations.insert(language, text.into());
        }
        if translations.is_empty() {
            return Err(ModelError::EmptyTranslation);
        }
        Ok(Self { translations })
    }

    pub fn single(language: LanguageCode, text: impl Into<String>) -> Self {
        Self {
            translations: BTreeMap::from([(language, text.into())]),
        }
    }

    pub fn get_translation(&self, language: LanguageCode) -> Result<&str, ModelError> {
        self.translations
            .get(&language)
            .map(String::as_str)
            .ok_or(ModelError::MissingTranslation { language })
    }

    /// Text in `language`, or in the first available language otherwise.
    pub fn get_or_fallback(&self, language: LanguageCode) -> &str {
        self.translations
            .get(&language)
            .or_else(|| self.translations.values().next())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn available_languages(&self) -> Vec<LanguageCode> {
        self.translations.keys().copied().collect()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.translations.values().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Translated {
        Translated::new([("en", "english text"), ("de", "deutscher Text")]).unwrap()
    }

    #[test]
    fn lookup_by_code() {
        let text = sample();
        assert_eq!(
            text.get_translation(LanguageCode::De).unwrap(),
            "deutscher Text"
        );
        assert!(matches!(
            text.get_translation(LanguageCode::Fr),
            Err(ModelError::MissingTranslation {
                language: LanguageCode::Fr
            })
        ));
    }

    #[test]
    fn rejects_unknown_codes() {
        let err = Translated::new([("en", "ok"), ("xx", "nope")]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownLanguage { ref code } if code == "xx"));
    }

    #[test]
    fn rejects_empty_table() {
        let entries: Vec<(&str, &str)> = Vec::new();
        assert!(matches!(
            Translated::new(entries),
            Err(ModelError::EmptyTranslation)
        ));
    }

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!("EN".parse::<LanguageCode>().unwrap(), LanguageCode::En);
        assert_eq!(" de ".parse::<LanguageCode>().unwrap(), LanguageCode::De);
    }

    #[test]
    fn fallback_uses_first_language() {
        let text = Translated::single(LanguageCode::De, "nur deutsch");
        assert_eq!(text.get_or_fallback(LanguageCode::En), "nur deutsch");
        assert_eq!(text.available_languages(), vec![LanguageCode::De]);
    }
}
