//! Error types for the runway-cli crate.

use std::path::PathBuf;

use runway_core::{ModelError, SchemaViolation};
use runway_cypher::CodegenError;
use runway_refine::RefineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} is not a valid model: {source}", path.display())]
    InvalidModel { path: PathBuf, source: ModelError },

    #[error("{} has {} schema violation(s)", path.display(), violations.len())]
    Rejected {
        path: PathBuf,
        violations: Vec<SchemaViolation>,
    },

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Refine(#[from] RefineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
