use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::relations::{Relation, WordAssociation};

/// Small, fixed word association table.
///
/// Answers the same queries as the Datamuse client from memory, so poems can
/// be generated offline and tests stay deterministic. The JSON form is
/// `{"crime": {"rhyme": ["time", ...], "similar_sound": [...]}}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticLexicon {
    by_word: HashMap<String, HashMap<Relation, Vec<String>>>,
}

impl StaticLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words(mut self, word: &str, relation: Relation, words: &[&str]) -> Self {
        self.by_word
            .entry(word.to_lowercase())
            .or_default()
            .entry(relation)
            .or_default()
            .extend(words.iter().map(|w| w.to_string()));
        self
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let lexicon: StaticLexicon = serde_json::from_str(&content)?;
        info!(
            "loaded lexicon with {} entries from {}",
            lexicon.len(),
            path.as_ref().display()
        );
        Ok(lexicon)
    }

    pub fn len(&self) -> usize {
        self.by_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_word.is_empty()
    }
}

impl WordAssociation for StaticLexicon {
    fn related(&self, word: &str, relation: Relation, max: Option<usize>) -> Result<Vec<String>> {
        let words = self
            .by_word
            .get(&word.to_lowercase())
            .and_then(|relations| relations.get(&relation))
            .map(|list| list.iter().take(max.unwrap_or(usize::MAX)).cloned().collect())
            .unwrap_or_default();
        Ok(words)
    }
}
