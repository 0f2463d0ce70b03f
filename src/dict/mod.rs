//! Dictionary lookup interface and data model
//!
//! Consumed by the shell when a selection produces a term to look up.
//! A miss is a successful answer distinct from a backend failure.

use std::collections::HashMap;

pub mod service;

pub use service::{LookupOutcome, LookupService};

/// One sense of a word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sense {
    pub part_of_speech: String,
    pub text: String,
}

/// A dictionary entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    pub word: String,
    pub phonetic: Option<String>,
    pub senses: Vec<Sense>,
}

/// Faults from a dictionary backend.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("dictionary backend: {0}")]
    Backend(String),
}

/// Looks up terms. `Ok(None)` is a miss, not an error.
pub trait DictionaryBackend: Send + 'static {
    fn lookup(&self, term: &str) -> Result<Option<Definition>, DictError>;
}

/// Small in-memory dictionary backing demos and tests.
#[derive(Debug, Default)]
pub struct MiniDictionary {
    entries: HashMap<String, Definition>,
}

impl MiniDictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: Definition) {
        self.entries
            .insert(definition.word.to_lowercase(), definition);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DictionaryBackend for MiniDictionary {
    fn lookup(&self, term: &str) -> Result<Option<Definition>, DictError> {
        let key = term.trim().to_lowercase();
        if key.is_empty() {
            return Ok(None);
        }
        Ok(self.entries.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> MiniDictionary {
        let mut dict = MiniDictionary::new();
        dict.insert(Definition {
            word: "praise".to_string(),
            phonetic: Some("/preiz/".to_string()),
            senses: vec![Sense {
                part_of_speech: "noun".to_string(),
                text: "The expression of approval or admiration.".to_string(),
            }],
        });
        dict
    }

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        let dict = dictionary();
        let hit = dict.lookup("  Praise ").unwrap().unwrap();
        assert_eq!(hit.word, "praise");
        assert_eq!(hit.senses.len(), 1);
    }

    #[test]
    fn miss_is_none_not_an_error() {
        let dict = dictionary();
        assert!(dict.lookup("unknown").unwrap().is_none());
        assert!(dict.lookup("   ").unwrap().is_none());
    }
}
