//! Ingestion strategies and their batch sizes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodegenError;

/// How rows reach the database.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStrategy {
    /// Rows are pushed in batches as the `$rows` statement parameter.
    #[default]
    Standard,
    /// The server streams rows from a staged CSV file.
    LoadCsv,
}

impl IngestionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::LoadCsv => "load_csv",
        }
    }
}

impl fmt::Display for IngestionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestionStrategy {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "load_csv" => Ok(Self::LoadCsv),
            _ => Err(CodegenError::UnsupportedStrategy(s.to_string())),
        }
    }
}

/// Rows per transaction.
///
/// Relationship loads lock both endpoints, so they default to smaller
/// batches than node loads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSizes {
    #[serde(default = "default_node_batch")]
    pub nodes: usize,
    #[serde(default = "default_relationship_batch")]
    pub relationships: usize,
}

fn default_node_batch() -> usize {
    1000
}

fn default_relationship_batch() -> usize {
    500
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            nodes: default_node_batch(),
            relationships: default_relationship_batch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_strategies() {
        assert_eq!("standard".parse::<IngestionStrategy>().unwrap(), IngestionStrategy::Standard);
        assert_eq!(" LOAD_CSV ".parse::<IngestionStrategy>().unwrap(), IngestionStrategy::LoadCsv);
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = "bulk".parse::<IngestionStrategy>().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("bulk"));
    }

    #[test]
    fn default_batches_favor_nodes() {
        let sizes = BatchSizes::default();
        assert!(sizes.relationships < sizes.nodes);

        let partial: BatchSizes = serde_json::from_str(r#"{"nodes": 250}"#).unwrap();
        assert_eq!(partial.nodes, 250);
        assert_eq!(partial.relationships, 500);
    }
}
