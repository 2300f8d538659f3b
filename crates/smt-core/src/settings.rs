//! Decoder defaults: score weights, search limits and model floors.
//!
//! The built-in `default_settings.toml` is used unless a binary installs its
//! own file with `init_custom` before anything calls `settings()`.

use std::sync::OnceLock;

use serde::Deserialize;

use crate::hypothesis::{LengthBias, ScoreWeights};

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static OVERRIDE: OnceLock<Settings> = OnceLock::new();
static DEFAULTS: OnceLock<Settings> = OnceLock::new();

/// Validate `toml_content` and make it the process-wide settings.
///
/// Fails if the content is invalid or if settings were already fixed,
/// either by an earlier call or by a read through `settings()`.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    let parsed = parse_settings_toml(&toml_content)?;
    if DEFAULTS.get().is_some() {
        return Err(SettingsError::AlreadyInitialized);
    }
    OVERRIDE
        .set(parsed)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Process-wide settings: the custom file if one was installed, otherwise
/// the embedded defaults.
pub fn settings() -> &'static Settings {
    if let Some(custom) = OVERRIDE.get() {
        return custom;
    }
    DEFAULTS.get_or_init(|| {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded default settings must be valid")
    })
}

pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub weights: ScoreWeights,
    pub search: SearchSettings,
    pub model: ModelSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub n_most_likely: usize,
    pub max_segment_len: usize,
    pub length_bias: LengthBias,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    pub translation_floor: f64,
    pub unknown_word_log10_prob: f64,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_non_negative {
        ($section:ident . $field:ident) => {
            if !(s.$section.$field >= 0.0) {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be non-negative".to_string(),
                });
            }
        };
    }
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_non_negative!(weights.lm);
    check_non_negative!(weights.translation);
    check_non_negative!(weights.length);

    check_positive_usize!(search.n_most_likely);
    check_positive_usize!(search.max_segment_len);

    let floor = s.model.translation_floor;
    if !(floor > 0.0 && floor <= 1.0) {
        return Err(SettingsError::InvalidValue {
            field: "model.translation_floor".to_string(),
            reason: "must be in (0, 1]".to_string(),
        });
    }
    if !(s.model.unknown_word_log10_prob <= 0.0) {
        return Err(SettingsError::InvalidValue {
            field: "model.unknown_word_log10_prob".to_string(),
            reason: "must be a log10 probability (<= 0)".to_string(),
        });
    }

    Ok(())
}
