use std::fs;
use std::path::Path;

use super::lexical::{Distortion, LexicalModel, DISPLACEMENT_BUCKETS};
use super::ModelError;

const MAGIC: &[u8; 4] = b"SMTL";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1;

/// Directive carrying displacement parameters in the text format.
const DISTORTION_DIRECTIVE: &str = "!distortion";

impl LexicalModel {
    /// Parse a text translation table.
    ///
    /// One entry per line: `given<TAB>generated<TAB>probability`. Blank lines
    /// and lines starting with `#` are skipped. An optional line
    /// `!distortion p_null p0 p1 p2 p3 p4 p5` sets displacement parameters;
    /// without it the model uses `distortion`.
    pub fn from_text(text: &str, distortion: Distortion, floor: f64) -> Result<Self, ModelError> {
        let mut model = Self::new(distortion, floor);
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix(DISTORTION_DIRECTIVE) {
                model.distortion = parse_distortion(rest, line_no)?;
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err(ModelError::Parse {
                    line: line_no,
                    reason: format!("expected 3 tab-separated fields, got {}", fields.len()),
                });
            }
            let probability: f64 = fields[2].trim().parse().map_err(|e| ModelError::Parse {
                line: line_no,
                reason: format!("invalid probability '{}': {e}", fields[2]),
            })?;
            if !(0.0..=1.0).contains(&probability) {
                return Err(ModelError::Parse {
                    line: line_no,
                    reason: format!("probability {probability} outside [0, 1]"),
                });
            }
            model.insert(
                fields[0].trim().to_string(),
                fields[1].trim().to_string(),
                probability,
            );
        }
        Ok(model)
    }

    /// Serialize to the compiled binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let body = bincode::serialize(self).map_err(ModelError::Serialize)?;
        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Parse from the compiled binary format.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ModelError> {
        if data.len() < HEADER_SIZE {
            return Err(ModelError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(ModelError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(ModelError::UnsupportedVersion(data[4]));
        }
        bincode::deserialize(&data[HEADER_SIZE..]).map_err(ModelError::Deserialize)
    }

    /// Load a compiled table from disk.
    pub fn open(path: &Path) -> Result<Self, ModelError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Save compiled binary to file.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        Ok(fs::write(path, self.to_bytes()?)?)
    }
}

fn parse_distortion(rest: &str, line: usize) -> Result<Distortion, ModelError> {
    let values: Vec<f64> = rest
        .split_whitespace()
        .map(|v| {
            v.parse().map_err(|e| ModelError::Parse {
                line,
                reason: format!("invalid distortion parameter '{v}': {e}"),
            })
        })
        .collect::<Result<_, _>>()?;
    let params: [f64; DISPLACEMENT_BUCKETS] =
        values.try_into().map_err(|v: Vec<f64>| ModelError::Parse {
            line,
            reason: format!(
                "expected {DISPLACEMENT_BUCKETS} distortion parameters, got {}",
                v.len()
            ),
        })?;
    Ok(Distortion::Displacement(params))
}
