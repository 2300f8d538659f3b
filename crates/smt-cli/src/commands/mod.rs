//! Subcommand implementations for `smtdecode`.

use std::io;

use smt_core::decoder::DecodeError;
use smt_core::model::ModelError;

pub mod config_ops;
pub mod decode_ops;
pub mod model_ops;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}
