use super::*;
use crate::alignment::Link;
use crate::decoder::greedy::check_monotonic;
use crate::model::LanguageModel;

/// Assigns zero probability to every sentence.
struct ImpossibleLm;

impl LanguageModel for ImpossibleLm {
    fn sentence_log_probability(&self, _sentence: &[String]) -> f64 {
        f64::NEG_INFINITY
    }
}

#[test]
fn test_swap_fixes_adjective_order() {
    let d = toy_decoder();
    let outcome = d.search(&words(&["le", "chat", "noir"])).unwrap();
    assert_eq!(outcome.target, words(&["the", "black", "cat"]));
    assert_eq!(
        outcome.steps,
        vec![SearchStep {
            operator: Operator::SwapSegments,
            score: outcome.score,
        }]
    );
    assert!(outcome.score > outcome.initial_score);
}

#[test]
fn test_null_only_word_produces_nothing() {
    let d = toy_decoder();
    let outcome = d.search(&words(&["il", "ne", "dort"])).unwrap();
    assert_eq!(outcome.target, words(&["he", "sleeps"]));
    assert_eq!(outcome.alignment.target_aligned_to(1), Link::Null);
    assert!(outcome.steps.is_empty());
}

#[test]
fn test_unseen_word_links_to_null() {
    let d = toy_decoder();
    let outcome = d.search(&words(&["le", "zyzzyva", "chat"])).unwrap();
    assert!(!outcome.target.iter().any(|w| w == "zyzzyva"));
    assert_eq!(outcome.alignment.target_aligned_to(1), Link::Null);
}

#[test]
fn test_zero_fertility_insertion() {
    let lm = BigramLm::default().with_sentence(&["he", "is", "sleeping"], -0.4);
    let table = TableTm::default()
        .with("he", "il", 0.9)
        .with("sleeping", "dort", 0.9);
    let d = decoder_with(lm, table, &["is", "of"]);
    let outcome = d.search(&words(&["il", "dort"])).unwrap();
    assert_eq!(outcome.target, words(&["he", "is", "sleeping"]));
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].operator, Operator::TranslateAndInsert);
    assert_eq!(outcome.alignment.target_aligned_to(1), Link::Target(2));
}

#[test]
fn test_empty_source() {
    let d = toy_decoder();
    let outcome = d.search(&[]).unwrap();
    assert!(outcome.target.is_empty());
    assert!(outcome.steps.is_empty());
    assert!(outcome.alignment.is_empty());
}

#[test]
fn test_decode_through_trait_object() {
    let d: Box<dyn Decoder> = Box::new(toy_decoder());
    let target = d.decode(&words(&["le", "chat", "noir"])).unwrap();
    assert_eq!(target, words(&["the", "black", "cat"]));
}

#[test]
fn test_without_lm_weight_seed_is_final() {
    // Translation scores ignore word order, so nothing beats the seed.
    let mut cfg = config();
    cfg.weights.lm = 0.0;
    let table = Arc::new(toy_table());
    let d = GreedyDecoder::new(
        Arc::new(toy_lm()),
        table.clone(),
        table.as_ref(),
        ZeroFertilityVocab::default(),
        cfg,
    );
    let outcome = d.search(&words(&["le", "chat", "noir"])).unwrap();
    assert_eq!(outcome.target, words(&["the", "cat", "black"]));
    assert!(outcome.steps.is_empty());
}

#[test]
fn test_parts_match_score() {
    let d = toy_decoder();
    let outcome = d.search(&words(&["le", "chien"])).unwrap();
    assert_eq!(outcome.target, words(&["the", "dog"]));
    assert_eq!(outcome.parts.total(&d.config().weights), outcome.score);
    assert_eq!(outcome.parts.length_term, 2.0);
}

#[test]
fn test_shared_across_threads() {
    let d = Arc::new(toy_decoder());
    let sentences = [
        words(&["le", "chat", "noir"]),
        words(&["il", "ne", "dort"]),
        words(&["le", "chien"]),
        words(&["noir", "chat", "le"]),
    ];
    let sequential: Vec<Vec<String>> = sentences.iter().map(|s| d.decode(s).unwrap()).collect();

    let parallel: Vec<Vec<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = sentences
            .iter()
            .map(|s| {
                let d = Arc::clone(&d);
                scope.spawn(move || d.decode(s).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(parallel, sequential);
}

#[test]
fn test_zero_lm_weight_ignores_infinite_lm() {
    let mut cfg = config();
    cfg.weights.lm = 0.0;
    let reverse = TableTm::default()
        .with("the", "le", 0.9)
        .with("cat", "chat", 0.9)
        .with("dark", "noir", 0.6)
        .with("black", "noir", 0.4);
    let d = GreedyDecoder::new(
        Arc::new(ImpossibleLm),
        Arc::new(toy_table()),
        &reverse,
        ZeroFertilityVocab::default(),
        cfg,
    );
    let outcome = d.search(&words(&["le", "chat", "noir"])).unwrap();
    assert!(outcome.initial_score.is_finite());
    assert!(outcome.score.is_finite());
    assert_eq!(outcome.parts.lm_log_prob, f64::NEG_INFINITY);
    assert_eq!(outcome.target, words(&["the", "cat", "black"]));
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].operator, Operator::TranslateOneOrTwoWords);
}

#[test]
fn test_score_drop_is_reported() {
    let d = toy_decoder();
    let source = words(&["le", "chat", "noir"]);
    let ctx = d.context(&source);
    let seed = d.initial_hypothesis(&ctx);
    let mut swapped = seed.clone();
    swapped.swap(1, 1, 2, 2);
    assert!(swapped.score() > seed.score());
    assert!(check_monotonic(Operator::SwapSegments, &seed, &swapped).is_ok());
    assert!(check_monotonic(Operator::SwapSegments, &seed, &seed.clone()).is_ok());

    let err = check_monotonic(Operator::JoinWords, &swapped, &seed).unwrap_err();
    let DecodeError::NonMonotonic {
        operator,
        before,
        after,
        current,
        candidate,
    } = &err;
    assert_eq!(*operator, "join_words");
    assert_eq!(*before, swapped.score());
    assert_eq!(*after, seed.score());
    assert_eq!(current, &swapped.to_string());
    assert_eq!(candidate, &seed.to_string());

    let message = err.to_string();
    assert!(message.starts_with("join_words lowered the score"));
    assert!(message.contains("(e0)the (e1)black (e2)cat"));
    assert!(message.contains("(e0)the (e1)cat (e2)black"));
}
