#![cfg(test)]

use std::collections::HashMap;

use crate::alignment::Alignment;
use crate::model::{LanguageModel, TranslationModel, NULL_WORD};

pub fn words(ws: &[&str]) -> Vec<String> {
    ws.iter().map(|w| w.to_string()).collect()
}

/// Bigram language model over `<s> w1 .. wn </s>` with a flat penalty for
/// every bigram not listed.
#[derive(Debug, Clone)]
pub struct BigramLm {
    bigrams: HashMap<(String, String), f64>,
    unseen: f64,
}

impl Default for BigramLm {
    fn default() -> Self {
        Self {
            bigrams: HashMap::new(),
            unseen: -6.0,
        }
    }
}

impl BigramLm {
    /// Natural-log probability of `word` following `prev`.
    pub fn with(mut self, prev: &str, word: &str, log_prob: f64) -> Self {
        self.bigrams
            .insert((prev.to_string(), word.to_string()), log_prob);
        self
    }

    /// Chain `<s> w1 .. wn </s>` with the given per-bigram log probability.
    pub fn with_sentence(mut self, sentence: &[&str], log_prob: f64) -> Self {
        let mut prev = "<s>";
        for &w in sentence.iter().chain(std::iter::once(&"</s>")) {
            self = self.with(prev, w, log_prob);
            prev = w;
        }
        self
    }
}

impl LanguageModel for BigramLm {
    fn sentence_log_probability(&self, sentence: &[String]) -> f64 {
        let mut prev = "<s>";
        let mut total = 0.0;
        for w in sentence.iter().map(String::as_str).chain(std::iter::once("</s>")) {
            total += self
                .bigrams
                .get(&(prev.to_string(), w.to_string()))
                .copied()
                .unwrap_or(self.unseen);
            prev = w;
        }
        total
    }
}

/// Position-free translation table t(source | target). Used as the forward
/// scorer directly; `top_translations(source)` ranks target words by the
/// same table, so it also serves as a reverse model.
#[derive(Debug, Clone)]
pub struct TableTm {
    table: HashMap<(String, String), f64>,
    floor: f64,
}

impl Default for TableTm {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
            floor: 1e-4,
        }
    }
}

impl TableTm {
    pub fn with(mut self, target: &str, source: &str, p: f64) -> Self {
        self.table.insert((target.to_string(), source.to_string()), p);
        self
    }

    fn t(&self, target: &str, source: &str) -> f64 {
        self.table
            .get(&(target.to_string(), source.to_string()))
            .copied()
            .unwrap_or(self.floor)
    }
}

impl TranslationModel for TableTm {
    fn alignment_probability(
        &self,
        target: &[String],
        source: &[String],
        alignment: &Alignment,
    ) -> f64 {
        source
            .iter()
            .enumerate()
            .map(|(j, f)| {
                let e = alignment
                    .target_aligned_to(j)
                    .target()
                    .and_then(|i| target.get(i))
                    .map_or(NULL_WORD, String::as_str);
                self.t(e, f)
            })
            .product()
    }

    fn top_translations(&self, word: &str, k: usize) -> Vec<String> {
        let mut ranked: Vec<(&str, f64)> = self
            .table
            .iter()
            .filter(|((_, f), _)| f == word)
            .map(|((e, _), &p)| (e.as_str(), p))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().take(k).map(|(e, _)| e.to_string()).collect()
    }

    fn vocabulary(&self) -> Vec<String> {
        let mut v: Vec<String> = self.table.keys().map(|(_, f)| f.clone()).collect();
        v.sort();
        v.dedup();
        v
    }
}
