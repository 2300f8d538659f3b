use std::collections::HashMap;

use tracing::debug;

use crate::model::{TranslationModel, NULL_WORD};

/// Top-K target candidates per source word, built once from the reverse
/// translation model. `None` stands for NULL.
#[derive(Debug, Clone, Default)]
pub struct CandidateTable {
    lists: HashMap<String, Vec<Option<String>>>,
}

impl CandidateTable {
    pub fn build(reverse: &dyn TranslationModel, k: usize) -> Self {
        let lists: HashMap<_, _> = reverse
            .vocabulary()
            .into_iter()
            .map(|word| {
                let list = reverse
                    .top_translations(&word, k)
                    .into_iter()
                    .map(|w| (w != NULL_WORD).then_some(w))
                    .collect();
                (word, list)
            })
            .collect();
        debug!(words = lists.len(), k, "built candidate table");
        Self { lists }
    }

    /// Candidates of `word` in model order; empty for unseen words.
    pub fn get(&self, word: &str) -> &[Option<String>] {
        self.lists.get(word).map(Vec::as_slice).unwrap_or_default()
    }

    /// Seed translation: the top candidate, or `None` when it is NULL or
    /// the word has no candidates.
    pub fn seed(&self, word: &str) -> Option<&str> {
        self.get(word).first()?.as_deref()
    }

    /// Candidates of `word` with NULL appended when the model did not rank it.
    pub fn with_null(&self, word: &str) -> Vec<Option<&str>> {
        let mut list: Vec<Option<&str>> = self.get(word).iter().map(Option::as_deref).collect();
        if !list.contains(&None) {
            list.push(None);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}
