//! Candidate translations and their cached weighted score.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alignment::{Alignment, Link};
use crate::model::{LanguageModel, TranslationModel};

/// Weights of the three score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub lm: f64,
    pub translation: f64,
    pub length: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        crate::settings::settings().weights
    }
}

/// How the target length enters the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthBias {
    /// The target length itself.
    #[default]
    Linear,
    /// ln(length); an empty target counts as length 1.
    Log,
}

impl LengthBias {
    fn term(self, len: usize) -> f64 {
        match self {
            LengthBias::Linear => len as f64,
            LengthBias::Log => (len.max(1) as f64).ln(),
        }
    }
}

/// Unweighted score components of a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreParts {
    pub lm_log_prob: f64,
    pub translation_log_prob: f64,
    pub length_term: f64,
}

impl ScoreParts {
    /// Weighted sum. A zero weight drops its component entirely, so an
    /// infinite component cannot turn the total into NaN.
    pub fn total(&self, w: &ScoreWeights) -> f64 {
        weighted(w.lm, self.lm_log_prob)
            + weighted(w.translation, self.translation_log_prob)
            + weighted(w.length, self.length_term)
    }
}

fn weighted(weight: f64, value: f64) -> f64 {
    if weight == 0.0 {
        0.0
    } else {
        weight * value
    }
}

/// Everything a hypothesis needs to score itself during one decode call.
pub struct SearchContext<'a> {
    source: &'a [String],
    lm: &'a dyn LanguageModel,
    tm: &'a dyn TranslationModel,
    weights: ScoreWeights,
    length_bias: LengthBias,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        source: &'a [String],
        lm: &'a dyn LanguageModel,
        tm: &'a dyn TranslationModel,
        weights: ScoreWeights,
        length_bias: LengthBias,
    ) -> Self {
        Self {
            source,
            lm,
            tm,
            weights,
            length_bias,
        }
    }

    pub fn source(&self) -> &'a [String] {
        self.source
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    fn score_parts(&self, target: &[String], alignment: &Alignment) -> ScoreParts {
        ScoreParts {
            lm_log_prob: self.lm.sentence_log_probability(target),
            translation_log_prob: self
                .tm
                .alignment_log_probability(target, self.source, alignment),
            length_term: self.length_bias.term(target.len()),
        }
    }
}

/// A (target sentence, alignment) pair with a lazily recomputed score.
///
/// Every mutation clears the cached score; `score()` recomputes on demand.
/// The search clones a base hypothesis per trial and mutates the clone.
#[derive(Clone)]
pub struct Hypothesis<'a> {
    ctx: &'a SearchContext<'a>,
    target: Vec<String>,
    alignment: Alignment,
    cache: Cell<Option<ScoreParts>>,
}

impl<'a> Hypothesis<'a> {
    /// Empty target with no alignment pairs.
    pub fn new(ctx: &'a SearchContext<'a>) -> Self {
        Self::from_parts(ctx, Vec::new(), Alignment::new())
    }

    pub fn from_parts(ctx: &'a SearchContext<'a>, target: Vec<String>, alignment: Alignment) -> Self {
        Self {
            ctx,
            target,
            alignment,
            cache: Cell::new(None),
        }
    }

    pub fn source(&self) -> &'a [String] {
        self.ctx.source
    }

    pub fn target(&self) -> &[String] {
        &self.target
    }

    pub fn into_target(self) -> Vec<String> {
        self.target
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn target_aligned_to(&self, source: usize) -> Link {
        self.alignment.target_aligned_to(source)
    }

    pub fn fertility(&self, link: Link) -> usize {
        match link {
            Link::Target(t) => self.alignment.fertility(t),
            Link::Null => self.alignment.sources_aligned_to(Link::Null).len(),
        }
    }

    pub fn parts(&self) -> ScoreParts {
        if let Some(parts) = self.cache.get() {
            return parts;
        }
        let parts = self.ctx.score_parts(&self.target, &self.alignment);
        self.cache.set(Some(parts));
        parts
    }

    pub fn score(&self) -> f64 {
        self.parts().total(&self.ctx.weights)
    }

    fn invalidate(&mut self) {
        self.cache.set(None);
    }

    pub fn align(&mut self, link: Link, source: usize) {
        self.alignment.add_pair(link, source);
        self.invalidate();
    }

    /// Append `word` covering `source`, or a NULL link when `word` is `None`.
    pub fn push_seed(&mut self, source: usize, word: Option<&str>) {
        match word {
            Some(w) => {
                self.alignment.add_pair(Link::Target(self.target.len()), source);
                self.target.push(w.to_string());
            }
            None => self.alignment.add_pair(Link::Null, source),
        }
        self.invalidate();
    }

    pub fn set_word(&mut self, index: usize, word: &str) {
        self.target[index] = word.to_string();
        self.invalidate();
    }

    /// Insert `word` at `index`, optionally covering `source`.
    pub fn insert_word(&mut self, index: usize, word: &str, source: Option<usize>) {
        self.target.insert(index, word.to_string());
        self.alignment.shift_on_insert_at(index);
        if let Some(s) = source {
            self.alignment.add_pair(Link::Target(index), s);
        }
        self.invalidate();
    }

    /// Delete the word at `index`; its sources move to `reassign_to`
    /// (post-deletion numbering).
    pub fn delete_word(&mut self, index: usize, reassign_to: Link) {
        self.target.remove(index);
        self.alignment.shift_on_delete_at(index, reassign_to);
        self.invalidate();
    }

    /// Exchange the target ranges `[i1,i2]` and `[j1,j2]`.
    ///
    /// # Panics
    ///
    /// Panics unless `i1 <= i2 < j1 <= j2 < len`.
    pub fn swap(&mut self, i1: usize, i2: usize, j1: usize, j2: usize) {
        assert!(
            j2 < self.target.len(),
            "swap range [{j1},{j2}] past target length {}",
            self.target.len()
        );
        self.alignment.swap_ranges(i1, i2, j1, j2);
        let mut swapped = Vec::with_capacity(self.target.len());
        swapped.extend_from_slice(&self.target[..i1]);
        swapped.extend_from_slice(&self.target[j1..=j2]);
        swapped.extend_from_slice(&self.target[i2 + 1..j1]);
        swapped.extend_from_slice(&self.target[i1..=i2]);
        swapped.extend_from_slice(&self.target[j2 + 1..]);
        self.target = swapped;
        self.invalidate();
    }
}

impl fmt::Debug for Hypothesis<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hypothesis")
            .field("target", &self.target)
            .field("alignment", &self.alignment)
            .field("cache", &self.cache.get())
            .finish()
    }
}

impl fmt::Display for Hypothesis<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.target.iter().enumerate() {
            write!(f, "(e{i}){word} ")?;
        }
        write!(f, "| {}", self.alignment)
    }
}
