use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use smt_core::decoder::{DecoderConfig, GreedyDecoder};
use smt_core::hypothesis::LengthBias;
use smt_core::model::registry::{load_language_model, load_translation_model};
use smt_core::model::{Distortion, LexicalModel};
use smt_core::settings::settings;
use smt_core::zero_fertility::ZeroFertilityVocab;

use super::CommandError;

/// Model files shared by `decode` and `explain`.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Language model file
    #[arg(long)]
    pub lm: PathBuf,
    /// Language model kind
    #[arg(long, default_value = "arpa")]
    pub lm_kind: String,
    /// Translation table scoring source words given target words
    #[arg(long)]
    pub forward: PathBuf,
    /// Forward table kind (model1, model2, compiled)
    #[arg(long, default_value = "model2")]
    pub forward_kind: String,
    /// Translation table proposing target words for source words
    #[arg(long)]
    pub reverse: PathBuf,
    /// Reverse table kind (model1, model2, compiled)
    #[arg(long, default_value = "model2")]
    pub reverse_kind: String,
    /// Target words insertable without a source word, one per line
    #[arg(long)]
    pub zero_fertility: Option<PathBuf>,
}

/// Overrides on top of the settings file.
#[derive(Debug, Clone, Default, Args)]
pub struct WeightArgs {
    /// Language model weight
    #[arg(long)]
    pub lm_weight: Option<f64>,
    /// Translation model weight
    #[arg(long)]
    pub translation_weight: Option<f64>,
    /// Length weight
    #[arg(long)]
    pub length_weight: Option<f64>,
    /// Score ln(length) instead of length
    #[arg(long)]
    pub log_length: bool,
    /// Candidates kept per source word
    #[arg(long)]
    pub n_most_likely: Option<usize>,
}

impl WeightArgs {
    pub fn apply(&self, mut config: DecoderConfig) -> Result<DecoderConfig, CommandError> {
        for (name, value, slot) in [
            ("--lm-weight", self.lm_weight, &mut config.weights.lm),
            (
                "--translation-weight",
                self.translation_weight,
                &mut config.weights.translation,
            ),
            ("--length-weight", self.length_weight, &mut config.weights.length),
        ] {
            if let Some(v) = value {
                if !(v >= 0.0) {
                    return Err(CommandError::InvalidArgument {
                        name,
                        reason: format!("{v} is not a non-negative weight"),
                    });
                }
                *slot = v;
            }
        }
        if self.log_length {
            config.length_bias = LengthBias::Log;
        }
        if let Some(n) = self.n_most_likely {
            if n == 0 {
                return Err(CommandError::InvalidArgument {
                    name: "--n-most-likely",
                    reason: "must be positive".to_string(),
                });
            }
            config.n_most_likely = n;
        }
        Ok(config)
    }
}

pub fn build_decoder(
    models: &ModelArgs,
    config: DecoderConfig,
) -> Result<GreedyDecoder, CommandError> {
    let model_settings = &settings().model;
    let lm = load_language_model(&models.lm_kind, &models.lm, model_settings)?;
    let forward = load_translation_model(&models.forward_kind, &models.forward, model_settings)?;
    let reverse = load_translation_model(&models.reverse_kind, &models.reverse, model_settings)?;
    let zero_fertility = match &models.zero_fertility {
        Some(path) => ZeroFertilityVocab::open(path)?,
        None => ZeroFertilityVocab::default(),
    };
    info!(
        lm = %models.lm.display(),
        forward = %models.forward.display(),
        reverse = %models.reverse.display(),
        zero_fertility = zero_fertility.len(),
        "models loaded"
    );
    Ok(GreedyDecoder::new(
        lm,
        forward,
        reverse.as_ref(),
        zero_fertility,
        config,
    ))
}

/// Convert a text translation table to the compiled binary format.
/// Returns the number of entries written.
pub fn compile_table(input: &Path, output: &Path, kind: &str) -> Result<usize, CommandError> {
    let floor = settings().model.translation_floor;
    let text = fs::read_to_string(input)?;
    let model = match kind {
        // model1 ignores any !distortion directive in the table.
        "model1" => {
            LexicalModel::from_text(&text, Distortion::Uniform, floor)?
                .with_distortion(Distortion::Uniform)
        }
        "model2" => LexicalModel::from_text(&text, Distortion::flat_displacement(), floor)?,
        other => {
            return Err(CommandError::InvalidArgument {
                name: "--kind",
                reason: format!("expected model1 or model2, got '{other}'"),
            })
        }
    };
    model.save(output)?;
    Ok(model.entry_count())
}
