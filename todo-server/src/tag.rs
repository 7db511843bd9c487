//! Tag normalization.
//!
//! Tags are compared in their canonical form: trimmed and lower-cased. Every
//! probe is normalized before it is compared against a stored tag, so callers
//! never need to care about the case or surrounding whitespace of their input.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::todo::Todo;

/// Returns the canonical form of a tag: trimmed and lower-cased.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A de-duplicated set of normalized tags.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag after normalizing it.
    ///
    /// Returns `false` when the normalized tag is empty or already present.
    pub fn add(&mut self, raw: &str) -> bool {
        let tag = normalize(raw);
        if tag.is_empty() {
            return false;
        }
        self.0.insert(tag)
    }

    /// Removes a tag if present. Removing an absent tag is a no-op.
    pub fn remove(&mut self, raw: &str) -> bool {
        self.0.remove(&normalize(raw))
    }

    /// Reports whether the normalized form of `raw` is in the set.
    pub fn has(&self, raw: &str) -> bool {
        self.0.contains(&normalize(raw))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the tags in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for raw in iter {
            tags.add(raw.as_ref());
        }
        tags
    }
}

impl IntoIterator for Tags {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

/// Returns every distinct tag used across `todos`, sorted ascending.
pub fn unique_tags_across<'a, I>(todos: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Todo>,
{
    todos
        .into_iter()
        .flat_map(|todo| todo.tags().iter())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
