//! Scorers consumed by the decoder.
//!
//! `LanguageModel` scores target fluency, `TranslationModel` scores a
//! (target, source, alignment) triple and proposes translations for a word.
//! Both are read-only during decoding and shared across threads.

mod arpa;
mod lexical;
mod lexical_io;
pub mod registry;

pub use arpa::NgramModel;
pub use lexical::{Distortion, LexicalModel};

use std::io;

use crate::alignment::Alignment;

/// Pseudo-word standing for "no counterpart" in translation tables.
pub const NULL_WORD: &str = "<NULL>";

/// Error type for loading and saving models.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected SMTL)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("unknown model kind: {0}")]
    UnknownKind(String),
}

pub trait LanguageModel: Send + Sync {
    /// Natural-log probability of `sentence` (sentence boundaries implied).
    ///
    /// Must not fail for unseen tokens: implementations back off or smooth.
    fn sentence_log_probability(&self, sentence: &[String]) -> f64;
}

pub trait TranslationModel: Send + Sync {
    /// P(source, alignment | target), in `[0, 1]`.
    fn alignment_probability(&self, target: &[String], source: &[String], alignment: &Alignment)
        -> f64;

    /// Natural log of `alignment_probability`.
    ///
    /// Implementations that can compute this without leaving log space should
    /// override it; long sentences underflow the plain product.
    fn alignment_log_probability(
        &self,
        target: &[String],
        source: &[String],
        alignment: &Alignment,
    ) -> f64 {
        self.alignment_probability(target, source, alignment).ln()
    }

    /// Up to `k` translations of `word`, most probable first.
    ///
    /// Ties are ordered by ascending token so results are reproducible.
    fn top_translations(&self, word: &str, k: usize) -> Vec<String>;

    /// Words for which this model has a translation distribution.
    fn vocabulary(&self) -> Vec<String>;
}
