use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process;

use serde::Serialize;
use tracing::debug_span;

use smt_core::decoder::{DecoderConfig, GreedyDecoder, SearchOutcome, SearchStep};
use smt_core::hypothesis::ScoreParts;

use super::model_ops::{build_decoder, ModelArgs};
use super::CommandError;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// One JSONL line of `decode --json`.
#[derive(Debug, Serialize)]
struct DecodeRecord<'a> {
    source: &'a [String],
    target: &'a [String],
    score: f64,
    #[serde(flatten)]
    parts: ScoreParts,
    iterations: usize,
}

#[derive(Debug, Serialize)]
struct ExplainReport<'a> {
    source: &'a [String],
    target: &'a [String],
    alignment: String,
    initial_score: f64,
    score: f64,
    parts: ScoreParts,
    steps: &'a [SearchStep],
}

pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Decode every line of `input`, writing one translation per line (or one
/// JSON object per line). Blank input lines produce blank output lines.
/// Returns the number of sentences decoded.
pub fn decode_lines(
    decoder: &GreedyDecoder,
    input: impl BufRead,
    mut out: impl Write,
    json: bool,
) -> Result<usize, CommandError> {
    let mut count = 0;
    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        let _span = debug_span!("sentence", line = idx + 1).entered();
        let source = tokenize(&line);
        let outcome = decoder.search(&source)?;
        if json {
            let record = DecodeRecord {
                source: &source,
                target: &outcome.target,
                score: outcome.score,
                parts: outcome.parts,
                iterations: outcome.steps.len(),
            };
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", outcome.target.join(" "))?;
        }
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

/// Write the search trace for one sentence.
pub fn write_explain(
    source: &[String],
    outcome: &SearchOutcome,
    mut out: impl Write,
    json: bool,
) -> Result<(), CommandError> {
    if json {
        let report = ExplainReport {
            source,
            target: &outcome.target,
            alignment: outcome.alignment.to_string(),
            initial_score: outcome.initial_score,
            score: outcome.score,
            parts: outcome.parts,
            steps: &outcome.steps,
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    let source_line: Vec<String> = source
        .iter()
        .enumerate()
        .map(|(j, w)| format!("(f{j}){w}"))
        .collect();
    writeln!(out, "source: {}", source_line.join(" "))?;
    writeln!(out, "seed score: {:.4}", outcome.initial_score)?;
    let mut prev = outcome.initial_score;
    for (i, step) in outcome.steps.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<30} {:>12.4} (+{:.4})",
            i + 1,
            step.operator.name(),
            step.score,
            step.score - prev
        )?;
        prev = step.score;
    }
    writeln!(out, "target: {}", outcome.target.join(" "))?;
    writeln!(out, "alignment: {}", outcome.alignment)?;
    writeln!(
        out,
        "lm={:.4} translation={:.4} length={:.4} score={:.4}",
        outcome.parts.lm_log_prob,
        outcome.parts.translation_log_prob,
        outcome.parts.length_term,
        outcome.score
    )?;
    Ok(())
}

pub fn decode_cmd(models: &ModelArgs, config: DecoderConfig, input: Option<&str>, json: bool) {
    let decoder = die!(build_decoder(models, config), "Error loading models: {}");
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(die!(
            File::open(path),
            "Error opening {path}: {}"
        ))),
        None => Box::new(io::stdin().lock()),
    };
    let out = BufWriter::new(io::stdout().lock());
    let count = die!(decode_lines(&decoder, reader, out, json), "Error: {}");
    tracing::info!(sentences = count, "decode finished");
}

pub fn explain_cmd(models: &ModelArgs, config: DecoderConfig, sentence: &str, json: bool) {
    let decoder = die!(build_decoder(models, config), "Error loading models: {}");
    let source = tokenize(sentence);
    let outcome = die!(decoder.search(&source), "Error: {}");
    die!(
        write_explain(&source, &outcome, io::stdout().lock(), json),
        "Error: {}"
    );
}
