//! Exact-match translation memory: original string -> translated string.
//!
//! Keys are the literal as it appears between the quotes, never trimmed or
//! normalized. The memory is loaded once per run, filled by the batch
//! translator and written back once at the end of the run.

pub mod store;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationMemory {
    entries: IndexMap<String, String>,
}

impl TranslationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a translation. Entries with an empty translation count as missing.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .get(original)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    pub fn contains(&self, original: &str) -> bool {
        self.get(original).is_some()
    }

    pub fn insert(&mut self, original: String, translation: String) {
        self.entries.insert(original, translation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for TranslationMemory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
