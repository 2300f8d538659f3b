//! Explicit mapping from configuration strings to model loaders.
//!
//! Model kinds are resolved once at startup; an unknown kind is reported as
//! `ModelError::UnknownKind` instead of failing later during decoding.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{Distortion, LanguageModel, LexicalModel, ModelError, NgramModel, TranslationModel};
use crate::settings::ModelSettings;

type LanguageModelLoader = fn(&Path, &ModelSettings) -> Result<Arc<dyn LanguageModel>, ModelError>;
type TranslationModelLoader =
    fn(&Path, &ModelSettings) -> Result<Arc<dyn TranslationModel>, ModelError>;

static LANGUAGE_MODELS: &[(&str, LanguageModelLoader)] = &[("arpa", load_arpa)];

static TRANSLATION_MODELS: &[(&str, TranslationModelLoader)] = &[
    ("model1", load_model1),
    ("model2", load_model2),
    ("compiled", load_compiled),
];

/// Names accepted by `load_language_model`.
pub fn language_model_kinds() -> impl Iterator<Item = &'static str> {
    LANGUAGE_MODELS.iter().map(|&(name, _)| name)
}

/// Names accepted by `load_translation_model`.
pub fn translation_model_kinds() -> impl Iterator<Item = &'static str> {
    TRANSLATION_MODELS.iter().map(|&(name, _)| name)
}

pub fn load_language_model(
    kind: &str,
    path: &Path,
    settings: &ModelSettings,
) -> Result<Arc<dyn LanguageModel>, ModelError> {
    let loader = LANGUAGE_MODELS
        .iter()
        .find(|&&(name, _)| name == kind)
        .map(|&(_, loader)| loader)
        .ok_or_else(|| ModelError::UnknownKind(kind.to_string()))?;
    loader(path, settings)
}

pub fn load_translation_model(
    kind: &str,
    path: &Path,
    settings: &ModelSettings,
) -> Result<Arc<dyn TranslationModel>, ModelError> {
    let loader = TRANSLATION_MODELS
        .iter()
        .find(|&&(name, _)| name == kind)
        .map(|&(_, loader)| loader)
        .ok_or_else(|| ModelError::UnknownKind(kind.to_string()))?;
    loader(path, settings)
}

fn load_arpa(path: &Path, settings: &ModelSettings) -> Result<Arc<dyn LanguageModel>, ModelError> {
    Ok(Arc::new(NgramModel::open(
        path,
        settings.unknown_word_log10_prob,
    )?))
}

fn load_model1(
    path: &Path,
    settings: &ModelSettings,
) -> Result<Arc<dyn TranslationModel>, ModelError> {
    let text = fs::read_to_string(path)?;
    let model = LexicalModel::from_text(&text, Distortion::Uniform, settings.translation_floor)?
        .with_distortion(Distortion::Uniform);
    Ok(Arc::new(model))
}

fn load_model2(
    path: &Path,
    settings: &ModelSettings,
) -> Result<Arc<dyn TranslationModel>, ModelError> {
    let text = fs::read_to_string(path)?;
    let model = LexicalModel::from_text(
        &text,
        Distortion::flat_displacement(),
        settings.translation_floor,
    )?;
    Ok(Arc::new(model))
}

fn load_compiled(
    path: &Path,
    _settings: &ModelSettings,
) -> Result<Arc<dyn TranslationModel>, ModelError> {
    Ok(Arc::new(LexicalModel::open(path)?))
}
