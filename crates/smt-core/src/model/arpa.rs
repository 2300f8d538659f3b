//! Back-off n-gram language model read from the ARPA text format.

use std::collections::HashMap;
use std::f64::consts::LN_10;
use std::fs;
use std::path::Path;

use tracing::debug;

use super::{LanguageModel, ModelError};

pub const SENTENCE_START: &str = "<s>";
pub const SENTENCE_END: &str = "</s>";
pub const UNKNOWN: &str = "<unk>";

/// Highest n-gram order accepted from an ARPA header.
const MAX_ORDER: usize = 16;

#[derive(Debug, Clone, Copy)]
struct NgramEntry {
    log10_prob: f64,
    log10_backoff: f64,
}

/// Katz back-off model. N-grams of every order share one map keyed by the
/// space-joined tokens.
#[derive(Debug, Clone)]
pub struct NgramModel {
    order: usize,
    ngrams: HashMap<String, NgramEntry>,
    has_unknown: bool,
    unknown_log10_prob: f64,
}

impl NgramModel {
    /// Empty model of the given order; `unknown_log10_prob` scores words
    /// missing from the unigram table when the model has no `<unk>`.
    pub fn new(order: usize, unknown_log10_prob: f64) -> Self {
        Self {
            order: order.max(1),
            ngrams: HashMap::new(),
            has_unknown: false,
            unknown_log10_prob,
        }
    }

    pub fn insert(&mut self, tokens: &[&str], log10_prob: f64, log10_backoff: f64) {
        if tokens == [UNKNOWN] {
            self.has_unknown = true;
        }
        self.order = self.order.max(tokens.len());
        self.ngrams.insert(
            tokens.join(" "),
            NgramEntry {
                log10_prob,
                log10_backoff,
            },
        );
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }

    pub fn open(path: &Path, unknown_log10_prob: f64) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)?;
        Self::from_arpa(&text, unknown_log10_prob)
    }

    /// Parse an ARPA file: a `\data\` header with `ngram N=count` lines,
    /// then `\N-grams:` sections of `log10_prob w1 .. wN [log10_backoff]`,
    /// terminated by `\end\`.
    pub fn from_arpa(text: &str, unknown_log10_prob: f64) -> Result<Self, ModelError> {
        let mut model = Self::new(1, unknown_log10_prob);
        let mut declared: HashMap<usize, usize> = HashMap::new();
        let mut seen: HashMap<usize, usize> = HashMap::new();
        let mut in_data = false;
        let mut section: Option<usize> = None;
        let mut ended = false;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line == "\\data\\" {
                in_data = true;
                continue;
            }
            if line == "\\end\\" {
                ended = true;
                break;
            }
            if let Some(n) = parse_section_header(line) {
                if !in_data {
                    return Err(parse_error(line_no, "n-gram section before \\data\\"));
                }
                if !declared.contains_key(&n) {
                    return Err(parse_error(
                        line_no,
                        &format!("section for undeclared order {n}"),
                    ));
                }
                section = Some(n);
                continue;
            }
            match section {
                None if in_data => {
                    let (n, count) = parse_count_line(line)
                        .ok_or_else(|| parse_error(line_no, &format!("bad header line '{line}'")))?;
                    if n == 0 || n > MAX_ORDER {
                        return Err(parse_error(line_no, &format!("unsupported n-gram order {n}")));
                    }
                    declared.insert(n, count);
                }
                // Text before \data\ is ignored.
                None => {}
                Some(n) => {
                    let fields: Vec<&str> = line.split_whitespace().collect();
                    if fields.len() != n + 1 && fields.len() != n + 2 {
                        return Err(parse_error(
                            line_no,
                            &format!("expected {} or {} fields, got {}", n + 1, n + 2, fields.len()),
                        ));
                    }
                    let log10_prob = parse_number(fields[0], line_no)?;
                    let log10_backoff = match fields.get(n + 1) {
                        Some(b) => parse_number(b, line_no)?,
                        None => 0.0,
                    };
                    model.insert(&fields[1..=n], log10_prob, log10_backoff);
                    *seen.entry(n).or_default() += 1;
                }
            }
        }

        if !ended {
            return Err(parse_error(text.lines().count(), "missing \\end\\"));
        }
        for (n, count) in &declared {
            let actual = seen.get(n).copied().unwrap_or(0);
            if actual != *count {
                return Err(parse_error(
                    0,
                    &format!("header declares {count} {n}-grams, found {actual}"),
                ));
            }
        }
        debug!(order = model.order, ngrams = model.ngrams.len(), "loaded ARPA model");
        Ok(model)
    }

    fn vocab_word<'a>(&self, word: &'a str) -> &'a str {
        if self.has_unknown && !self.ngrams.contains_key(word) {
            UNKNOWN
        } else {
            word
        }
    }

    /// log10 P(word | history) with back-off to shorter histories.
    fn log10_prob(&self, history: &[&str], word: &str) -> f64 {
        let mut key = history.join(" ");
        if !key.is_empty() {
            key.push(' ');
        }
        key.push_str(word);
        if let Some(e) = self.ngrams.get(&key) {
            return e.log10_prob;
        }
        if history.is_empty() {
            return self.unknown_log10_prob;
        }
        let backoff = self
            .ngrams
            .get(&history.join(" "))
            .map_or(0.0, |e| e.log10_backoff);
        backoff + self.log10_prob(&history[1..], word)
    }
}

impl LanguageModel for NgramModel {
    fn sentence_log_probability(&self, sentence: &[String]) -> f64 {
        let mut tokens: Vec<&str> = Vec::with_capacity(sentence.len() + 2);
        tokens.push(SENTENCE_START);
        tokens.extend(sentence.iter().map(|w| self.vocab_word(w)));
        tokens.push(SENTENCE_END);

        let mut log10 = 0.0;
        for i in 1..tokens.len() {
            let start = (i + 1).saturating_sub(self.order);
            log10 += self.log10_prob(&tokens[start..i], tokens[i]);
        }
        log10 * LN_10
    }
}

fn parse_section_header(line: &str) -> Option<usize> {
    line.strip_prefix('\\')?
        .strip_suffix("-grams:")?
        .parse()
        .ok()
}

fn parse_count_line(line: &str) -> Option<(usize, usize)> {
    let rest = line.strip_prefix("ngram")?.trim();
    let (n, count) = rest.split_once('=')?;
    Some((n.trim().parse().ok()?, count.trim().parse().ok()?))
}

fn parse_number(field: &str, line: usize) -> Result<f64, ModelError> {
    field
        .parse()
        .map_err(|e| parse_error(line, &format!("invalid number '{field}': {e}")))
}

fn parse_error(line: usize, reason: &str) -> ModelError {
    ModelError::Parse {
        line,
        reason: reason.to_string(),
    }
}
