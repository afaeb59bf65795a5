use crate::{FullId, Identifiable, Question, QuestionCollection, ShortId, Translated};

/// Either a single question or a collection of them.
#[derive(Debug, Clone, Copy)]
pub enum QuestionNode<'a> {
    Leaf(&'a Question),
    Group(&'a QuestionCollection),
}

impl<'a> QuestionNode<'a> {
    pub fn text(&self) -> &'a Translated {
        match self {
            QuestionNode::Leaf(question) => question.text(),
            QuestionNode::Group(collection) => collection.text(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, QuestionNode::Group(_))
    }

    /// The concrete questions below this node.
    pub fn flatten(&self) -> Vec<&'a Question> {
        match self {
            QuestionNode::Leaf(question) => vec![*question],
            QuestionNode::Group(collection) => collection.flatten(),
        }
    }
}

impl Identifiable for QuestionNode<'_> {
    fn short_id(&self) -> &ShortId {
        match self {
            QuestionNode::Leaf(question) => question.short_id(),
            QuestionNode::Group(collection) => collection.short_id(),
        }
    }

    fn full_id(&self) -> &FullId {
        match self {
            QuestionNode::Leaf(question) => question.full_id(),
            QuestionNode::Group(collection) => collection.full_id(),
        }
    }
}
