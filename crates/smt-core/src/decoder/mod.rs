//! Decoding strategies.
//!
//! A `Decoder` turns one source sentence into a target sentence. The only
//! strategy shipped is `GreedyDecoder`, a hill-climbing search over
//! (target, alignment) hypotheses.

mod candidates;
mod greedy;

#[cfg(test)]
mod tests;

pub use candidates::CandidateTable;
pub use greedy::{DecoderConfig, GreedyDecoder, Operator, SearchOutcome, SearchStep};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// An operator returned a hypothesis scoring below its input.
    #[error("{operator} lowered the score from {before} to {after}\n  current:   {current}\n  candidate: {candidate}")]
    NonMonotonic {
        operator: &'static str,
        before: f64,
        after: f64,
        current: String,
        candidate: String,
    },
}

pub trait Decoder: Send + Sync {
    fn decode(&self, source: &[String]) -> Result<Vec<String>, DecodeError>;
}
