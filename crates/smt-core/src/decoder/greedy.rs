//! Greedy hill-climbing decoder (Germann et al., "Fast Decoding and Optimal
//! Decoding in Machine Translation").
//!
//! Starting from a word-by-word seed, every iteration applies five local
//! operators to the current hypothesis and moves to the best result if it
//! scores strictly higher. The search stops at a local optimum.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, debug_span, info};

use super::{CandidateTable, DecodeError, Decoder};
use crate::alignment::{Alignment, Link};
use crate::hypothesis::{Hypothesis, LengthBias, ScoreParts, ScoreWeights, SearchContext};
use crate::model::{LanguageModel, TranslationModel};
use crate::settings::{settings, Settings};
use crate::zero_fertility::ZeroFertilityVocab;

/// Local moves tried on every iteration, in tie-breaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    TranslateOneOrTwoWords,
    TranslateAndInsert,
    SwapSegments,
    JoinWords,
    RemoveWordOfFertilityZero,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::TranslateOneOrTwoWords,
        Operator::TranslateAndInsert,
        Operator::SwapSegments,
        Operator::JoinWords,
        Operator::RemoveWordOfFertilityZero,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operator::TranslateOneOrTwoWords => "translate_one_or_two_words",
            Operator::TranslateAndInsert => "translate_and_insert",
            Operator::SwapSegments => "swap_segments",
            Operator::JoinWords => "join_words",
            Operator::RemoveWordOfFertilityZero => "remove_word_of_fertility_zero",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tunables of a `GreedyDecoder`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    pub weights: ScoreWeights,
    /// Candidates kept per source word.
    pub n_most_likely: usize,
    /// Longest segment moved by `swap_segments`.
    pub max_segment_len: usize,
    pub length_bias: LengthBias,
}

impl From<&Settings> for DecoderConfig {
    fn from(s: &Settings) -> Self {
        Self {
            weights: s.weights,
            n_most_likely: s.search.n_most_likely,
            max_segment_len: s.search.max_segment_len,
            length_bias: s.search.length_bias,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::from(settings())
    }
}

/// One accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchStep {
    pub operator: Operator,
    pub score: f64,
}

/// Final hypothesis of a search together with the moves that led to it.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub target: Vec<String>,
    pub alignment: Alignment,
    pub parts: ScoreParts,
    pub score: f64,
    pub initial_score: f64,
    pub steps: Vec<SearchStep>,
}

pub struct GreedyDecoder {
    lm: Arc<dyn LanguageModel>,
    forward: Arc<dyn TranslationModel>,
    candidates: CandidateTable,
    zero_fertility: ZeroFertilityVocab,
    config: DecoderConfig,
}

impl GreedyDecoder {
    /// `forward` scores P(source, alignment | target); `reverse` proposes
    /// target words for each source word and is only read here.
    pub fn new(
        lm: Arc<dyn LanguageModel>,
        forward: Arc<dyn TranslationModel>,
        reverse: &dyn TranslationModel,
        zero_fertility: ZeroFertilityVocab,
        config: DecoderConfig,
    ) -> Self {
        let candidates = CandidateTable::build(reverse, config.n_most_likely);
        Self {
            lm,
            forward,
            candidates,
            zero_fertility,
            config,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn candidates(&self) -> &CandidateTable {
        &self.candidates
    }

    pub fn context<'a>(&'a self, source: &'a [String]) -> SearchContext<'a> {
        SearchContext::new(
            source,
            self.lm.as_ref(),
            self.forward.as_ref(),
            self.config.weights,
            self.config.length_bias,
        )
    }

    /// Word-by-word seed: each source word takes its top candidate, in
    /// source order. Words whose top candidate is NULL (or that have none)
    /// are linked to NULL.
    pub fn initial_hypothesis<'a>(&self, ctx: &'a SearchContext<'a>) -> Hypothesis<'a> {
        let mut h = Hypothesis::new(ctx);
        for (j, word) in ctx.source().iter().enumerate() {
            h.push_seed(j, self.candidates.seed(word));
        }
        h
    }

    pub fn search(&self, source: &[String]) -> Result<SearchOutcome, DecodeError> {
        let _span = debug_span!("search", words = source.len()).entered();
        let ctx = self.context(source);
        let mut current = self.initial_hypothesis(&ctx);
        let initial_score = current.score();
        debug!(score = initial_score, seed = %current, "seeded");

        let mut steps = Vec::new();
        loop {
            let mut best: Option<(Operator, Hypothesis<'_>)> = None;
            for op in Operator::ALL {
                let candidate = self.apply(op, &current);
                check_monotonic(op, &current, &candidate)?;
                if best
                    .as_ref()
                    .map_or(true, |(_, b)| candidate.score() > b.score())
                {
                    best = Some((op, candidate));
                }
            }
            match best {
                Some((op, next)) if next.score() > current.score() => {
                    debug!(
                        operator = op.name(),
                        score = next.score(),
                        delta = next.score() - current.score(),
                        len = next.len(),
                        "accepted move"
                    );
                    steps.push(SearchStep {
                        operator: op,
                        score: next.score(),
                    });
                    current = next;
                }
                _ => break,
            }
        }

        let parts = current.parts();
        let score = current.score();
        info!(iterations = steps.len(), score, len = current.len(), "search finished");
        let alignment = current.alignment().clone();
        Ok(SearchOutcome {
            target: current.into_target(),
            alignment,
            parts,
            score,
            initial_score,
            steps,
        })
    }

    /// Best hypothesis `op` can build from `h`, or a copy of `h` when none
    /// scores higher.
    pub fn apply<'a>(&self, op: Operator, h: &Hypothesis<'a>) -> Hypothesis<'a> {
        let _span = debug_span!("operator", name = op.name()).entered();
        match op {
            Operator::TranslateOneOrTwoWords => self.translate_one_or_two_words(h),
            Operator::TranslateAndInsert => self.translate_and_insert(h),
            Operator::SwapSegments => self.swap_segments(h),
            Operator::JoinWords => self.join_words(h),
            Operator::RemoveWordOfFertilityZero => self.remove_word_of_fertility_zero(h),
        }
    }

    /// Insert `word` at whichever of the `len + 1` positions scores best.
    /// The earliest position wins ties.
    fn insert_at_best_position<'a>(
        &self,
        h: &Hypothesis<'a>,
        word: &str,
        source: Option<usize>,
    ) -> (Hypothesis<'a>, usize) {
        let mut best: Option<(Hypothesis<'a>, usize)> = None;
        for pos in 0..=h.len() {
            let mut trial = h.clone();
            trial.insert_word(pos, word, source);
            if best.as_ref().map_or(true, |(b, _)| trial.score() > b.score()) {
                best = Some((trial, pos));
            }
        }
        // 0..=len is never empty.
        best.unwrap_or_else(|| (h.clone(), 0))
    }

    fn translate_one_or_two_words<'a>(&self, h: &Hypothesis<'a>) -> Hypothesis<'a> {
        let source = h.source();
        let mut best = h.clone();
        for i in 0..source.len() {
            let ei = h.target_aligned_to(i);
            let i_words = self.candidates.with_null(&source[i]);
            for j in i + 1..source.len() {
                let ej = h.target_aligned_to(j);
                if ei == ej && !ei.is_null() {
                    continue;
                }
                let j_words = self.candidates.with_null(&source[j]);
                for &wi in &i_words {
                    for &wj in &j_words {
                        let Some(trial) = self.retranslate(h, (i, ei, wi), (j, ej, wj)) else {
                            continue;
                        };
                        if trial.score() > best.score() {
                            best = trial;
                        }
                    }
                }
            }
        }
        best
    }

    /// Give source words `i` and `j` the translations `wi` and `wj`
    /// (`None` = NULL). Returns `None` for the skipped case of two
    /// NULL-linked sources both receiving a word.
    fn retranslate<'a>(
        &self,
        h: &Hypothesis<'a>,
        (i, ei, wi): (usize, Link, Option<&str>),
        (j, ej, wj): (usize, Link, Option<&str>),
    ) -> Option<Hypothesis<'a>> {
        if wi.is_some() && wj.is_some() && ei.is_null() && ej.is_null() {
            return None;
        }
        let mut trial = h.clone();
        let mut cur_i = ei;
        let mut cur_j = ej;

        if wi.is_none() {
            trial.align(Link::Null, i);
            if let Link::Target(e) = ei {
                if h.fertility(ei) == 1 {
                    trial.delete_word(e, Link::Null);
                    cur_j = shift_down(cur_j, e);
                }
            }
        }
        if wj.is_none() {
            trial.align(Link::Null, j);
            if let Link::Target(e) = cur_j {
                if h.fertility(ej) == 1 {
                    trial.delete_word(e, Link::Null);
                    cur_i = shift_down(cur_i, e);
                }
            }
        }

        if let Some(w) = wi {
            match cur_i {
                Link::Null => {
                    let (inserted, pos) = self.insert_at_best_position(&trial, w, Some(i));
                    trial = inserted;
                    if let Link::Target(t) = cur_j {
                        if t >= pos {
                            cur_j = Link::Target(t + 1);
                        }
                    }
                }
                Link::Target(t) => trial.set_word(t, w),
            }
        }
        if let Some(w) = wj {
            match cur_j {
                Link::Null => trial = self.insert_at_best_position(&trial, w, Some(j)).0,
                Link::Target(t) => trial.set_word(t, w),
            }
        }
        Some(trial)
    }

    /// Re-translate each linked target word with itself, then try inserting
    /// a zero-fertility word. Each (target index, word) pair is tried once.
    fn translate_and_insert<'a>(&self, h: &Hypothesis<'a>) -> Hypothesis<'a> {
        let mut best = h.clone();
        let mut tried: HashSet<(usize, &str)> = HashSet::new();
        for j in 0..h.source().len() {
            let Link::Target(e) = h.target_aligned_to(j) else {
                continue;
            };
            let word = h.target()[e].as_str();
            if !tried.insert((e, word)) {
                continue;
            }
            let mut trial = h.clone();
            trial.set_word(e, word);
            let trial = self.insert_only(&trial);
            if trial.score() > best.score() {
                best = trial;
            }
        }
        best
    }

    /// Best single zero-fertility insertion, or a copy of `h`.
    fn insert_only<'a>(&self, h: &Hypothesis<'a>) -> Hypothesis<'a> {
        let mut best = h.clone();
        for word in self.zero_fertility.iter() {
            let (trial, pos) = self.insert_at_best_position(h, word, None);
            if trial.score() > best.score() {
                debug!(word, pos, score = trial.score(), "zero-fertility insertion");
                best = trial;
            }
        }
        best
    }

    fn swap_segments<'a>(&self, h: &Hypothesis<'a>) -> Hypothesis<'a> {
        let n = h.len();
        let span = self.config.max_segment_len;
        let mut best = h.clone();
        for i1 in 0..n.saturating_sub(1) {
            for i2 in i1..(i1 + span).min(n - 1) {
                for j1 in i2 + 1..n {
                    for j2 in j1..(j1 + span).min(n) {
                        let mut trial = h.clone();
                        trial.swap(i1, i2, j1, j2);
                        if trial.score() > best.score() {
                            best = trial;
                        }
                    }
                }
            }
        }
        best
    }

    /// Delete word `i` and hand its source words to word `j`.
    fn join_words<'a>(&self, h: &Hypothesis<'a>) -> Hypothesis<'a> {
        let n = h.len();
        let mut best = h.clone();
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                let into = if j > i { j - 1 } else { j };
                let mut trial = h.clone();
                trial.delete_word(i, Link::Target(into));
                if trial.score() > best.score() {
                    best = trial;
                }
            }
        }
        best
    }

    fn remove_word_of_fertility_zero<'a>(&self, h: &Hypothesis<'a>) -> Hypothesis<'a> {
        let mut best = h.clone();
        for i in (0..h.len()).filter(|&i| h.fertility(Link::Target(i)) == 0) {
            let mut trial = h.clone();
            trial.delete_word(i, Link::Null);
            if trial.score() > best.score() {
                best = trial;
            }
        }
        best
    }
}

/// Fails if `op` handed back a hypothesis scoring below its input.
pub(super) fn check_monotonic(
    op: Operator,
    current: &Hypothesis<'_>,
    candidate: &Hypothesis<'_>,
) -> Result<(), DecodeError> {
    if candidate.score() < current.score() {
        return Err(DecodeError::NonMonotonic {
            operator: op.name(),
            before: current.score(),
            after: candidate.score(),
            current: current.to_string(),
            candidate: candidate.to_string(),
        });
    }
    Ok(())
}

/// `link` after the target word at `deleted` is removed.
fn shift_down(link: Link, deleted: usize) -> Link {
    match link {
        Link::Target(t) if t > deleted => Link::Target(t - 1),
        other => other,
    }
}

impl Decoder for GreedyDecoder {
    fn decode(&self, source: &[String]) -> Result<Vec<String>, DecodeError> {
        self.search(source).map(|outcome| outcome.target)
    }
}
