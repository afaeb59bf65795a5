use serde::Serialize;

use crate::{AnswerValue, FullId, Identifiable, LanguageCode, ShortId, Translated};

/// A predefined, selectable answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOption {
    short_id: ShortId,
    full_id: FullId,
    text: Translated,
    short_text: Option<Translated>,
    value: AnswerValue,
}

impl AnswerOption {
    pub fn new(
        short_id: ShortId,
        full_id: FullId,
        text: Translated,
        short_text: Option<Translated>,
        value: AnswerValue,
    ) -> Self {
        Self {
            short_id,
            full_id,
            text,
            short_text,
            value,
        }
    }

    pub fn text(&self) -> &Translated {
        &self.text
    }

    pub fn short_text(&self) -> Option<&Translated> {
        self.short_text.as_ref()
    }

    /// The canonical value this option stands for when chosen.
    pub fn value(&self) -> &AnswerValue {
        &self.value
    }

    /// Short text if one is defined, the full text otherwise.
    pub fn label(&self, language: LanguageCode) -> &str {
        self.short_text
            .as_ref()
            .unwrap_or(&self.text)
            .get_or_fallback(language)
    }

    /// Case-insensitive search over the option value and all its texts.
    pub(crate) fn mentions(&self, needle_lower: &str) -> bool {
        if self.value.to_string().to_lowercase().contains(needle_lower) {
            return true;
        }
        self.text
            .texts()
            .chain(self.short_text.iter().flat_map(Translated::texts))
            .any(|text| text.to_lowercase().contains(needle_lower))
    }
}

impl Identifiable for AnswerOption {
    fn short_id(&self) -> &ShortId {
        &self.short_id
    }

    fn full_id(&self) -> &FullId {
        &self.full_id
    }
}
