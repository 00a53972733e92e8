//! Configuration for the runway command-line tool.

use std::path::PathBuf;

use runway_cypher::{BatchSizes, IngestCode, IngestionStrategy, LoaderOptions};
use runway_refine::DEFAULT_MAX_RETRIES;
use serde::Deserialize;

use crate::error::Result;

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "RUNWAY";

/// Top-level configuration.
///
/// Loaded from `runway.toml` (any format the `config` crate knows) and
/// `RUNWAY__` environment variables, e.g. `RUNWAY__BATCH_SIZES__NODES=5000`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunwayConfig {
    /// Strategy used when `--strategy` is not given.
    pub strategy: IngestionStrategy,

    /// Rows per transaction for node and relationship loads.
    pub batch_sizes: BatchSizes,

    /// Connection details written into loader configs.
    pub loader: LoaderSection,

    /// Cypher run before loading: a statement string, a `.cql` path, or a list.
    pub pre_ingest: Option<IngestCode>,

    /// Cypher run after loading.
    pub post_ingest: Option<IngestCode>,

    /// Correction rounds allowed when refining drafts.
    pub max_retries: usize,

    /// History file used when `--history` is not given.
    pub history_path: Option<PathBuf>,
}

/// Database connection section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderSection {
    pub server_uri: String,
    pub user: String,
    pub database: String,
    pub basepath: String,
}

impl Default for RunwayConfig {
    fn default() -> Self {
        Self {
            strategy: IngestionStrategy::default(),
            batch_sizes: BatchSizes::default(),
            loader: LoaderSection::default(),
            pre_ingest: None,
            post_ingest: None,
            max_retries: DEFAULT_MAX_RETRIES,
            history_path: None,
        }
    }
}

impl Default for LoaderSection {
    fn default() -> Self {
        let defaults = LoaderOptions::default();
        Self {
            server_uri: defaults.server_uri,
            user: defaults.user,
            database: defaults.database,
            basepath: defaults.basepath,
        }
    }
}

impl RunwayConfig {
    /// Load `<file_prefix>.*` if present, then overlay the environment.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    /// Options for a loader-config export.
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            server_uri: self.loader.server_uri.clone(),
            user: self.loader.user.clone(),
            database: self.loader.database.clone(),
            basepath: self.loader.basepath.clone(),
            batch_sizes: self.batch_sizes,
            pre_ingest: self.pre_ingest.clone(),
            post_ingest: self.post_ingest.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunwayConfig::default();
        assert_eq!(config.strategy, IngestionStrategy::Standard);
        assert_eq!(config.batch_sizes, BatchSizes::default());
        assert_eq!(config.loader.server_uri, "bolt://localhost:7687");
        assert_eq!(config.max_retries, 3);
        assert!(config.pre_ingest.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = RunwayConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.loader.database, "neo4j");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runway.toml");
        std::fs::write(
            &path,
            r#"
strategy = "load_csv"
max_retries = 5
pre_ingest = "setup/indexes.cql"
post_ingest = ["MATCH (n) RETURN count(n)"]

[batch_sizes]
nodes = 250

[loader]
database = "pets"
"#,
        )
        .unwrap();

        let prefix = dir.path().join("runway");
        let config = RunwayConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.strategy, IngestionStrategy::LoadCsv);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.batch_sizes, BatchSizes { nodes: 250, relationships: 500 });
        assert_eq!(config.pre_ingest, Some(IngestCode::File(PathBuf::from("setup/indexes.cql"))));

        let options = config.loader_options();
        assert_eq!(options.database, "pets");
        assert_eq!(options.user, "neo4j");
        assert_eq!(
            options.post_ingest,
            Some(IngestCode::Statements(vec!["MATCH (n) RETURN count(n)".to_string()]))
        );
    }
}
