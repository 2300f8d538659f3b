use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{TranslationModel, NULL_WORD};
use crate::alignment::{Alignment, Link};

/// Number of displacement buckets: NULL plus distances 0..=5.
pub const DISPLACEMENT_BUCKETS: usize = 7;

/// Positional component of the alignment probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Distortion {
    /// Every target position (and NULL) equally likely: 1 / (l + 1).
    Uniform,
    /// Bucketed displacement `|i - j·l/m|`, capped at 5. Index 0 is NULL.
    Displacement([f64; DISPLACEMENT_BUCKETS]),
}

impl Distortion {
    /// Displacement model with every bucket at 1/7.
    pub fn flat_displacement() -> Self {
        Distortion::Displacement([1.0 / DISPLACEMENT_BUCKETS as f64; DISPLACEMENT_BUCKETS])
    }

    fn probability(&self, target_len: usize, link: Link, source_len: usize, source_pos: usize) -> f64 {
        match self {
            Distortion::Uniform => 1.0 / (target_len + 1) as f64,
            Distortion::Displacement(params) => {
                let bucket = match link {
                    Link::Null => 0,
                    Link::Target(i) => {
                        let expected = source_pos as f64 * target_len as f64 / source_len as f64;
                        let distance = (i as f64 - expected).abs().floor() as usize;
                        1 + distance.min(5)
                    }
                };
                params[bucket]
            }
        }
    }
}

/// Conditional lexical translation table t(generated | given) with a
/// distortion component, in the style of IBM Models 1 and 2.
///
/// Used in both directions: the forward model conditions source words on
/// target words and scores hypotheses; the reverse model conditions target
/// words on source words and proposes candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalModel {
    pub(super) table: HashMap<String, HashMap<String, f64>>,
    pub(super) distortion: Distortion,
    pub(super) floor: f64,
}

impl LexicalModel {
    pub fn new(distortion: Distortion, floor: f64) -> Self {
        Self {
            table: HashMap::new(),
            distortion,
            floor,
        }
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, String, f64)>,
        distortion: Distortion,
        floor: f64,
    ) -> Self {
        let mut model = Self::new(distortion, floor);
        for (given, generated, p) in entries {
            model.insert(given, generated, p);
        }
        model
    }

    pub fn insert(&mut self, given: String, generated: String, probability: f64) {
        self.table
            .entry(given)
            .or_default()
            .insert(generated, probability);
    }

    /// t(generated | given), or the floor for unseen pairs.
    pub fn probability(&self, given: &str, generated: &str) -> f64 {
        self.table
            .get(given)
            .and_then(|row| row.get(generated))
            .copied()
            .filter(|&p| p > 0.0)
            .unwrap_or(self.floor)
    }

    pub fn distortion(&self) -> Distortion {
        self.distortion
    }

    pub fn with_distortion(mut self, distortion: Distortion) -> Self {
        self.distortion = distortion;
        self
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Number of (given, generated) pairs in the table.
    pub fn entry_count(&self) -> usize {
        self.table.values().map(HashMap::len).sum()
    }
}

impl TranslationModel for LexicalModel {
    fn alignment_probability(
        &self,
        target: &[String],
        source: &[String],
        alignment: &Alignment,
    ) -> f64 {
        self.alignment_log_probability(target, source, alignment)
            .exp()
    }

    fn alignment_log_probability(
        &self,
        target: &[String],
        source: &[String],
        alignment: &Alignment,
    ) -> f64 {
        let mut log_prob = 0.0;
        for (j, generated) in source.iter().enumerate() {
            let link = alignment.target_aligned_to(j);
            let given = link
                .target()
                .and_then(|i| target.get(i))
                .map_or(NULL_WORD, String::as_str);
            let lexical = self.probability(given, generated);
            let positional = self
                .distortion
                .probability(target.len(), link, source.len(), j)
                .max(self.floor);
            log_prob += lexical.ln() + positional.ln();
        }
        log_prob
    }

    fn top_translations(&self, word: &str, k: usize) -> Vec<String> {
        let Some(row) = self.table.get(word) else {
            return Vec::new();
        };
        let mut ranked: Vec<(&String, f64)> = row.iter().map(|(w, &p)| (w, p)).collect();
        ranked.sort_by(|(w_a, p_a), (w_b, p_b)| p_b.total_cmp(p_a).then_with(|| w_a.cmp(w_b)));
        ranked.into_iter().take(k).map(|(w, _)| w.clone()).collect()
    }

    fn vocabulary(&self) -> Vec<String> {
        let mut words: Vec<String> = self.table.keys().cloned().collect();
        words.sort();
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn forward() -> LexicalModel {
        LexicalModel::from_entries(
            vec![
                ("the".to_string(), "le".to_string(), 0.8),
                ("cat".to_string(), "chat".to_string(), 0.9),
                (NULL_WORD.to_string(), "le".to_string(), 0.1),
            ],
            Distortion::Uniform,
            1e-10,
        )
    }

    #[test]
    fn unseen_pair_gets_floor() {
        let m = forward();
        assert_eq!(m.probability("the", "chien"), 1e-10);
        assert_eq!(m.probability("dog", "le"), 1e-10);
        assert_eq!(m.probability("the", "le"), 0.8);
    }

    #[test]
    fn model_one_alignment_probability() {
        let m = forward();
        let target = words(&["the", "cat"]);
        let source = words(&["le", "chat"]);
        let mut a = Alignment::new();
        a.add_pair(Link::Target(0), 0);
        a.add_pair(Link::Target(1), 1);
        let expected = (0.8 / 3.0) * (0.9 / 3.0);
        let p = m.alignment_probability(&target, &source, &a);
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn null_link_uses_null_word() {
        let m = forward();
        let target = words(&["cat"]);
        let source = words(&["le", "chat"]);
        let mut a = Alignment::new();
        a.add_pair(Link::Null, 0);
        a.add_pair(Link::Target(0), 1);
        let expected = (0.1f64 / 2.0).ln() + (0.9f64 / 2.0).ln();
        let lp = m.alignment_log_probability(&target, &source, &a);
        assert!((lp - expected).abs() < 1e-12);
    }

    #[test]
    fn log_probability_survives_long_sentences() {
        let m = forward();
        let target = words(&["cat"; 400]);
        let source = words(&["chat"; 400]);
        let mut a = Alignment::new();
        for j in 0..400 {
            a.add_pair(Link::Target(j), j);
        }
        let lp = m.alignment_log_probability(&target, &source, &a);
        assert!(lp.is_finite());
        assert_eq!(m.alignment_probability(&target, &source, &a), lp.exp());
    }

    #[test]
    fn displacement_buckets() {
        let mut params = [0.0; DISPLACEMENT_BUCKETS];
        for (i, p) in params.iter_mut().enumerate() {
            *p = (i + 1) as f64 / 100.0;
        }
        let d = Distortion::Displacement(params);
        assert_eq!(d.probability(4, Link::Null, 4, 0), 0.01);
        assert_eq!(d.probability(4, Link::Target(2), 4, 2), 0.02);
        assert_eq!(d.probability(4, Link::Target(3), 4, 1), 0.04);
        assert_eq!(d.probability(20, Link::Target(19), 20, 0), 0.07);
    }

    #[test]
    fn top_translations_ordered_with_lexicographic_ties() {
        let m = LexicalModel::from_entries(
            vec![
                ("chat".to_string(), "cat".to_string(), 0.5),
                ("chat".to_string(), "tomcat".to_string(), 0.2),
                ("chat".to_string(), "kitty".to_string(), 0.2),
                ("chat".to_string(), NULL_WORD.to_string(), 0.1),
            ],
            Distortion::Uniform,
            1e-10,
        );
        assert_eq!(m.top_translations("chat", 3), words(&["cat", "kitty", "tomcat"]));
        assert_eq!(m.top_translations("chat", 10).len(), 4);
        assert!(m.top_translations("chien", 10).is_empty());
    }

    #[test]
    fn vocabulary_is_sorted() {
        let m = forward();
        assert_eq!(m.vocabulary(), words(&[NULL_WORD, "cat", "the"]));
        assert_eq!(m.entry_count(), 3);
    }
}
