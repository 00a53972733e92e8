//! Error types for the runway-cypher crate.

use runway_core::{ModelError, SchemaViolation};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Unsupported ingestion strategy: {0} (expected standard or load_csv)")]
    UnsupportedStrategy(String),

    #[error("Unusable ingest code: {0}")]
    IngestCode(String),

    #[error("Refusing to export an unvalidated model ({} violation(s)): {}", .0.len(), first_violation(.0))]
    UnvalidatedModel(Vec<SchemaViolation>),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CodegenError {
    /// Whether the error comes from caller configuration rather than the model.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedStrategy(_) | Self::IngestCode(_) | Self::UnvalidatedModel(_)
        )
    }
}

fn first_violation(violations: &[SchemaViolation]) -> String {
    violations
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CodegenError>;
