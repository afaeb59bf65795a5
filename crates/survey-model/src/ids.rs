#![deny(unsafe_code)]

use std::collections::HashSet;
use std::fmt;

use crate::ModelError;

/// Separator between the segments of a [`FullId`] unless configured otherwise.
pub const DEFAULT_SEPARATOR: char = '/';

/// Identifier of a metadata node, unique among its siblings.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ShortId(String);

impl ShortId {
    pub fn new(value: impl Into<String>, separator: char) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains(separator) {
            return Err(ModelError::InvalidId { id: value, separator });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for ShortId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Globally unique identifier: the short ids of all ancestors joined by the
/// separator, e.g. `Q001/SQ001`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FullId(String);

impl FullId {
    pub fn root(short_id: &ShortId) -> Self {
        Self(short_id.as_str().to_string())
    }

    pub fn child(&self, short_id: &ShortId, separator: char) -> Self {
        Self(format!("{}{separator}{}", self.0, short_id.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `self` lies below `ancestor` in the id hierarchy.
    pub fn is_descendant_of(&self, ancestor: &FullId, separator: char) -> bool {
        self.0
            .strip_prefix(ancestor.as_str())
            .and_then(|rest| rest.strip_prefix(separator))
            .is_some_and(|rest| !rest.is_empty())
    }
}

impl fmt::Display for FullId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for FullId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Common accessors of every node in the metadata tree.
pub trait Identifiable {
    fn short_id(&self) -> &ShortId;
    fn full_id(&self) -> &FullId;
}

/// Set of full ids handed out so far.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    ids: HashSet<FullId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Registers all ids or none of them.
    pub fn register_all<'a, I>(&mut self, ids: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = &'a FullId>,
    {
        let mut pending: HashSet<&FullId> = HashSet::new();
        for id in ids {
            if self.ids.contains(id) || !pending.insert(id) {
                return Err(ModelError::DuplicateId {
                    id: id.to_string(),
                });
            }
        }
        self.ids.extend(pending.into_iter().cloned());
        Ok(())
    }

    pub fn release_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a FullId>,
    {
        for id in ids {
            self.ids.remove(id);
        }
    }
}
