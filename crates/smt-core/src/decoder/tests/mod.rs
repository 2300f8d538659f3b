use std::sync::Arc;

use super::*;
use crate::hypothesis::{LengthBias, ScoreWeights};
use crate::model::NULL_WORD;
use crate::testutil::{words, BigramLm, TableTm};
use crate::zero_fertility::ZeroFertilityVocab;

mod operators;
mod scenarios;

fn config() -> DecoderConfig {
    DecoderConfig {
        weights: ScoreWeights {
            lm: 2.0,
            translation: 1.0,
            length: 1.1,
        },
        n_most_likely: 10,
        max_segment_len: 3,
        length_bias: LengthBias::Linear,
    }
}

/// French-to-English toy table; serves as both forward scorer and
/// candidate source.
fn toy_table() -> TableTm {
    TableTm::default()
        .with("the", "le", 0.9)
        .with(NULL_WORD, "le", 0.05)
        .with("cat", "chat", 0.9)
        .with("black", "noir", 0.9)
        .with("dark", "noir", 0.05)
        .with("he", "il", 0.9)
        .with("sleeps", "dort", 0.6)
        .with("sleeping", "dort", 0.3)
        .with(NULL_WORD, "ne", 0.9)
        .with("dog", "chien", 0.9)
}

fn toy_lm() -> BigramLm {
    BigramLm::default()
        .with_sentence(&["the", "black", "cat"], -0.5)
        .with_sentence(&["he", "sleeps"], -0.5)
        .with_sentence(&["he", "is", "sleeping"], -0.4)
        .with_sentence(&["the", "dog"], -0.5)
}

fn decoder_with(lm: BigramLm, table: TableTm, zero_fertility: &[&str]) -> GreedyDecoder {
    let table = Arc::new(table);
    GreedyDecoder::new(
        Arc::new(lm),
        table.clone(),
        table.as_ref(),
        ZeroFertilityVocab::new(zero_fertility.iter().copied()),
        config(),
    )
}

fn toy_decoder() -> GreedyDecoder {
    decoder_with(toy_lm(), toy_table(), &["is", "of"])
}
