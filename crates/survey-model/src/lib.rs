pub mod answer_option;
pub mod collapse;
pub mod collection;
pub mod error;
pub mod ids;
pub mod node;
pub mod question;
pub mod translated;
pub mod value;

pub use answer_option::AnswerOption;
pub use collapse::{COLLAPSED_SUFFIX, CollapsedQuestion};
pub use collection::QuestionCollection;
pub use error::{ModelError, Result};
pub use ids::{DEFAULT_SEPARATOR, FullId, IdRegistry, Identifiable, ShortId};
pub use node::QuestionNode;
pub use question::{AnswerFilter, AnswerGroup, AnswerSeries, GivenAnswer, Question, ValueCount};
pub use translated::{LanguageCode, Translated};
pub use value::{AnswerValue, ValueTokens, ValueType};
