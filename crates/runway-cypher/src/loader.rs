//! Configuration for batch-ingest tools that run the generated statements.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::statements::IngestCode;
use crate::strategy::BatchSizes;

/// Placeholder the ingest tool replaces with `basepath`.
pub const BASE_PLACEHOLDER: &str = "$BASE";

/// A complete batch-ingest job description.
///
/// Every list item is exactly one statement without its terminator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoaderConfig {
    pub server_uri: String,
    pub admin_user: String,
    pub database: String,
    pub basepath: String,
    #[serde(default)]
    pub pre_ingest: Vec<String>,
    #[serde(default)]
    pub files: Vec<LoadFile>,
    #[serde(default)]
    pub post_ingest: Vec<String>,
}

/// One load step: a source file and the statement that ingests its rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadFile {
    pub url: String,
    pub cql: String,
    /// Rows per pushed batch; absent when the statement batches itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

impl LoaderConfig {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Connection details and extra statements for a loader config export.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoaderOptions {
    #[serde(default = "default_server_uri")]
    pub server_uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_basepath")]
    pub basepath: String,
    #[serde(default)]
    pub batch_sizes: BatchSizes,
    #[serde(default)]
    pub pre_ingest: Option<IngestCode>,
    #[serde(default)]
    pub post_ingest: Option<IngestCode>,
}

fn default_server_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_basepath() -> String {
    "./".to_string()
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            server_uri: default_server_uri(),
            user: default_user(),
            database: default_database(),
            basepath: default_basepath(),
            batch_sizes: BatchSizes::default(),
            pre_ingest: None,
            post_ingest: None,
        }
    }
}
