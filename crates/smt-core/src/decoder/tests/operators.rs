use super::*;
use crate::alignment::{Alignment, Link};
use crate::hypothesis::Hypothesis;

fn cat_only_lm() -> BigramLm {
    BigramLm::default()
        .with("<s>", "cat", -0.1)
        .with("cat", "</s>", -0.1)
}

#[test]
fn test_swap_segments_reorders() {
    let d = toy_decoder();
    let source = words(&["le", "chat", "noir"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);
    assert_eq!(seed.target(), &words(&["the", "cat", "black"])[..]);

    let swapped = d.apply(Operator::SwapSegments, &seed);
    assert_eq!(swapped.target(), &words(&["the", "black", "cat"])[..]);
    assert_eq!(swapped.target_aligned_to(1), Link::Target(2));
    assert_eq!(swapped.target_aligned_to(2), Link::Target(1));
    assert!(swapped.score() > seed.score());
}

#[test]
fn test_remove_zero_fertility_restores_seed() {
    let d = toy_decoder();
    let source = words(&["le", "chat", "noir"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);

    let mut padded = seed.clone();
    padded.insert_word(1, "of", None);
    assert!(padded.score() < seed.score());

    let restored = d.apply(Operator::RemoveWordOfFertilityZero, &padded);
    assert_eq!(restored.target(), seed.target());
    assert_eq!(restored.alignment(), seed.alignment());
    assert_eq!(restored.score().to_bits(), seed.score().to_bits());
}

#[test]
fn test_remove_zero_fertility_keeps_linked_words() {
    let d = toy_decoder();
    let source = words(&["le", "chat", "noir"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);
    let unchanged = d.apply(Operator::RemoveWordOfFertilityZero, &seed);
    assert_eq!(unchanged.target(), seed.target());
}

#[test]
fn test_join_words_moves_sources() {
    let table = TableTm::default()
        .with("the", "le", 0.9)
        .with("cat", "le", 0.5)
        .with("cat", "chat", 0.9);
    let d = decoder_with(cat_only_lm(), table, &[]);
    let source = words(&["le", "chat"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);
    assert_eq!(seed.target(), &words(&["the", "cat"])[..]);

    let joined = d.apply(Operator::JoinWords, &seed);
    assert_eq!(joined.target(), &words(&["cat"])[..]);
    assert_eq!(joined.target_aligned_to(0), Link::Target(0));
    assert_eq!(joined.target_aligned_to(1), Link::Target(0));
    assert_eq!(joined.fertility(Link::Target(0)), 2);
}

#[test]
fn test_translate_to_null_deletes_sole_word() {
    let table = TableTm::default()
        .with("the", "le", 0.9)
        .with(NULL_WORD, "le", 0.05)
        .with("cat", "chat", 0.9);
    let d = decoder_with(cat_only_lm(), table, &[]);
    let source = words(&["le", "chat"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);

    let best = d.apply(Operator::TranslateOneOrTwoWords, &seed);
    assert_eq!(best.target(), &words(&["cat"])[..]);
    assert_eq!(best.target_aligned_to(0), Link::Null);
    assert_eq!(best.target_aligned_to(1), Link::Target(0));
}

#[test]
fn test_translate_null_linked_word_inserts() {
    let lm = BigramLm::default().with_sentence(&["the", "cat"], -0.5);
    let d = decoder_with(lm, toy_table(), &[]);
    let source = words(&["le", "chat"]);
    let ctx = d.context(&source);
    let mut alignment = Alignment::new();
    alignment.add_pair(Link::Target(0), 0);
    alignment.add_pair(Link::Null, 1);
    let h = Hypothesis::from_parts(&ctx, words(&["the"]), alignment);

    let best = d.apply(Operator::TranslateOneOrTwoWords, &h);
    assert_eq!(best.target(), &words(&["the", "cat"])[..]);
    assert_eq!(best.target_aligned_to(0), Link::Target(0));
    assert_eq!(best.target_aligned_to(1), Link::Target(1));
}

#[test]
fn test_translate_single_word_source_is_noop() {
    let d = toy_decoder();
    let source = words(&["noir"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);
    let same = d.apply(Operator::TranslateOneOrTwoWords, &seed);
    assert_eq!(same.target(), seed.target());
}

#[test]
fn test_insert_ties_keep_first_word_and_position() {
    // Every bigram scores the same, so only the length term moves the score.
    let mut cfg = config();
    cfg.weights.length = 20.0;
    let table = Arc::new(toy_table());
    let d = GreedyDecoder::new(
        Arc::new(BigramLm::default()),
        table.clone(),
        table.as_ref(),
        ZeroFertilityVocab::new(["of", "is"]),
        cfg,
    );
    let source = words(&["le", "chat"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);

    let best = d.apply(Operator::TranslateAndInsert, &seed);
    assert_eq!(best.target(), &words(&["is", "the", "cat"])[..]);
    assert_eq!(best.target_aligned_to(0), Link::Target(1));
    assert_eq!(best.fertility(Link::Target(0)), 0);
}

#[test]
fn test_translate_and_insert_without_vocab_is_noop() {
    let d = decoder_with(toy_lm(), toy_table(), &[]);
    let source = words(&["le", "chat"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);
    let same = d.apply(Operator::TranslateAndInsert, &seed);
    assert_eq!(same.target(), seed.target());
    assert_eq!(same.score().to_bits(), seed.score().to_bits());
}

#[test]
fn test_operators_never_lower_score() {
    let d = toy_decoder();
    let source = words(&["le", "chien", "noir", "ne", "dort"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);
    for op in Operator::ALL {
        assert!(d.apply(op, &seed).score() >= seed.score(), "{op}");
    }
}
