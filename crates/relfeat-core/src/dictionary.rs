//! Dictionary store
//!
//! Named keyword dictionaries loaded once at start-up and shared read-only
//! by the feature generator. Entries and queries are both trimmed and
//! lowercased, so matching is case-insensitive.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::config::DictionarySource;
use crate::{RelfeatError, Result};

/// A named set of lowercase words
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    id: String,
    words: HashSet<String>,
}

impl Dictionary {
    pub fn new<I, S>(id: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .filter_map(|w| normalize(w.as_ref()))
            .collect();
        Self {
            id: id.into(),
            words,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Case-insensitive membership test
    pub fn contains(&self, word: &str) -> bool {
        normalize(word).is_some_and(|w| self.words.contains(&w))
    }
}

fn normalize(word: &str) -> Option<String> {
    let word = word.trim();
    (!word.is_empty()).then(|| word.to_lowercase())
}

/// Registry of dictionaries keyed by id, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct DictionaryStore {
    dictionaries: BTreeMap<String, Dictionary>,
}

impl DictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured dictionary, stopping at the first unreadable file
    pub fn from_sources(sources: &[DictionarySource]) -> Result<Self> {
        let mut store = Self::new();
        for source in sources {
            store.load(&source.path, &source.id)?;
        }
        Ok(store)
    }

    /// Read one word per line from `path` and register it under `dict_id`.
    ///
    /// Loading an id that is already registered replaces it.
    pub fn load(&mut self, path: impl AsRef<Path>, dict_id: &str) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RelfeatError::Resource {
            path: path.to_path_buf(),
            source: e,
        })?;

        let dictionary = Dictionary::new(dict_id, content.lines());
        tracing::debug!(
            dict_id,
            path = %path.display(),
            words = dictionary.len(),
            "Loaded dictionary"
        );
        self.register(dictionary);
        Ok(())
    }

    /// Register an in-memory word list under `dict_id`
    pub fn insert<I, S>(&mut self, dict_id: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.register(Dictionary::new(dict_id, words));
    }

    fn register(&mut self, dictionary: Dictionary) {
        let id = dictionary.id.clone();
        if self.dictionaries.insert(id.clone(), dictionary).is_some() {
            tracing::debug!(dict_id = %id, "Replaced previously loaded dictionary");
        }
    }

    pub fn get(&self, dict_id: &str) -> Result<&Dictionary> {
        self.dictionaries.get(dict_id).ok_or_else(|| {
            RelfeatError::Configuration(format!("dictionary '{dict_id}' is not registered"))
        })
    }

    /// Membership test; an unregistered id is a wiring error, not a miss
    pub fn contains(&self, dict_id: &str, word: &str) -> Result<bool> {
        Ok(self.get(dict_id)?.contains(word))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dictionary> {
        self.dictionaries.values()
    }

    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
