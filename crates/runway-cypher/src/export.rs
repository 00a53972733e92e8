//! Text and loader-config exports of an accepted model version.

use std::borrow::Cow;

use runway_core::{accept, AllowedColumns, DataModel, GraphEntity, ModelHistory, Snapshot};

use crate::error::{CodegenError, Result};
use crate::format::{csv_file_name, join_statements};
use crate::generator::{generate_constraint, CypherGenerator};
use crate::loader::{LoadFile, LoaderConfig, LoaderOptions, BASE_PLACEHOLDER};
use crate::strategy::{BatchSizes, IngestionStrategy};

/// Exports for one model that is known to validate.
#[derive(Debug, Clone)]
pub struct IngestionExporter<'a> {
    model: Cow<'a, DataModel>,
}

impl<'a> IngestionExporter<'a> {
    pub fn for_snapshot(snapshot: &'a Snapshot) -> Self {
        Self {
            model: Cow::Borrowed(snapshot.model()),
        }
    }

    /// Exporter for a history version (`1` first, `-1` latest).
    pub fn for_version(history: &'a ModelHistory, version: i64) -> Result<Self> {
        Ok(Self::for_snapshot(history.get(version)?))
    }

    /// Validate a candidate that never went through the history.
    pub fn for_candidate(model: DataModel, allowed: &AllowedColumns) -> Result<IngestionExporter<'static>> {
        let validated = accept(model, allowed).map_err(|violations| {
            tracing::warn!(violations = violations.len(), "Refusing to export unvalidated model");
            CodegenError::UnvalidatedModel(violations)
        })?;
        let (model, _) = validated.into_parts();
        Ok(IngestionExporter {
            model: Cow::Owned(model),
        })
    }

    pub fn model(&self) -> &DataModel {
        &self.model
    }

    /// Uniqueness constraints for every node, then every relationship.
    pub fn export_constraints(&self) -> String {
        self.model.entities().map(generate_constraint).collect()
    }

    /// Node then relationship load statements, each `;`-terminated and
    /// separated by a blank line.
    pub fn export_ingestion_script(
        &self,
        strategy: IngestionStrategy,
        batch_sizes: BatchSizes,
    ) -> Result<String> {
        let generator = CypherGenerator::from_model(&self.model).with_batch_sizes(batch_sizes);
        let mut statements = generator.node_statements(strategy);
        statements.extend(generator.relationship_statements(strategy)?);

        tracing::info!(%strategy, statements = statements.len(), "Exported ingestion script");
        Ok(join_statements(&statements))
    }

    /// A loader job: constraints and user code first, one file entry per
    /// node then relationship, user post-ingest code last.
    pub fn export_loader_config(
        &self,
        strategy: IngestionStrategy,
        options: &LoaderOptions,
    ) -> Result<LoaderConfig> {
        let generator =
            CypherGenerator::from_model(&self.model).with_batch_sizes(options.batch_sizes);

        let mut pre_ingest = generator.constraint_statements();
        if let Some(code) = &options.pre_ingest {
            pre_ingest.extend(code.clone().into_statements()?);
        }
        let post_ingest = match &options.post_ingest {
            Some(code) => code.clone().into_statements()?,
            None => Vec::new(),
        };

        let chunk_size = |batch: usize| match strategy {
            IngestionStrategy::Standard => Some(batch),
            IngestionStrategy::LoadCsv => None,
        };
        let file_url = |source: &str| format!("{BASE_PLACEHOLDER}/{}", csv_file_name(source));

        let mut files = Vec::with_capacity(self.model.nodes().len() + self.model.relationships().len());
        for node in self.model.nodes() {
            files.push(LoadFile {
                url: file_url(node.source_name()),
                cql: generator.generate_merge_node_clause(node, strategy),
                chunk_size: chunk_size(options.batch_sizes.nodes),
            });
        }
        for rel in self.model.relationships() {
            files.push(LoadFile {
                url: file_url(rel.source_name()),
                cql: generator.generate_merge_relationship_clause(rel, strategy)?,
                chunk_size: chunk_size(options.batch_sizes.relationships),
            });
        }

        tracing::info!(
            %strategy,
            pre_ingest = pre_ingest.len(),
            files = files.len(),
            post_ingest = post_ingest.len(),
            "Exported loader config"
        );

        Ok(LoaderConfig {
            server_uri: options.server_uri.clone(),
            admin_user: options.user.clone(),
            database: options.database.clone(),
            basepath: options.basepath.clone(),
            pre_ingest,
            files,
            post_ingest,
        })
    }
}

/// Constraint DDL of a history version.
pub fn export_constraints(history: &ModelHistory, version: i64) -> Result<String> {
    Ok(IngestionExporter::for_version(history, version)?.export_constraints())
}

/// Ingestion script of a history version.
pub fn export_ingestion_script(
    history: &ModelHistory,
    version: i64,
    strategy: IngestionStrategy,
    batch_sizes: BatchSizes,
) -> Result<String> {
    IngestionExporter::for_version(history, version)?.export_ingestion_script(strategy, batch_sizes)
}

/// Loader config of a history version.
pub fn export_loader_config(
    history: &ModelHistory,
    version: i64,
    strategy: IngestionStrategy,
    options: &LoaderOptions,
) -> Result<LoaderConfig> {
    IngestionExporter::for_version(history, version)?.export_loader_config(strategy, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::IngestCode;
    use runway_core::{ModelError, Node, Property, Relationship};

    fn pets_model() -> DataModel {
        DataModel::new(
            vec![
                Node::new(
                    "Person",
                    vec![
                        Property::new("name", "first_name", "str").unique(),
                        Property::new("age", "age", "int"),
                    ],
                ),
                Node::new("Pet", vec![Property::new("name", "pet_name", "str").unique()]),
            ],
            vec![Relationship::new("HAS_PET", vec![], "Person", "Pet")],
        )
        .unwrap()
    }

    fn allowed() -> AllowedColumns {
        AllowedColumns::flat(["first_name", "age", "pet_name"])
    }

    fn history() -> ModelHistory {
        let mut history = ModelHistory::new();
        history.append(accept(pets_model(), &allowed()).unwrap());
        history
    }

    #[test]
    fn constraints_cover_every_unique_property() {
        let text = export_constraints(&history(), -1).unwrap();
        assert_eq!(
            text,
            "CREATE CONSTRAINT person_name IF NOT EXISTS FOR (n:Person) REQUIRE n.name IS UNIQUE;\n\
             CREATE CONSTRAINT pet_name IF NOT EXISTS FOR (n:Pet) REQUIRE n.name IS UNIQUE;\n"
        );
    }

    #[test]
    fn script_lists_nodes_then_relationships() {
        let text =
            export_ingestion_script(&history(), 1, IngestionStrategy::Standard, BatchSizes::default())
                .unwrap();
        let person = text.find("MERGE (n:Person").unwrap();
        let pet = text.find("MERGE (n:Pet").unwrap();
        let rel = text.find("MERGE (source)-[r:HAS_PET]->(target)").unwrap();
        assert!(person < pet && pet < rel);
        assert_eq!(text.matches(";\n").count(), 3);
        assert!(!text.contains("CREATE CONSTRAINT"));
    }

    #[test]
    fn missing_version_is_range_error() {
        let err = export_constraints(&history(), 2).unwrap_err();
        assert!(matches!(err, CodegenError::Model(ModelError::VersionOutOfRange { .. })), "{err}");
        assert!(!err.is_configuration());
    }

    #[test]
    fn loader_config_orders_phases() {
        let options = LoaderOptions {
            pre_ingest: Some(IngestCode::Text("CREATE INDEX person_age FOR (n:Person) ON (n.age);".to_string())),
            post_ingest: Some(IngestCode::Statements(vec!["MATCH (n) RETURN count(n)".to_string()])),
            ..LoaderOptions::default()
        };
        let config = export_loader_config(&history(), -1, IngestionStrategy::Standard, &options).unwrap();

        assert_eq!(config.pre_ingest.len(), 3);
        assert!(config.pre_ingest[0].starts_with("CREATE CONSTRAINT person_name"));
        assert_eq!(config.pre_ingest[2], "CREATE INDEX person_age FOR (n:Person) ON (n.age)");
        assert_eq!(config.files.len(), 3);
        assert_eq!(config.files[0].url, "$BASE/file.csv");
        assert_eq!(config.files[0].chunk_size, Some(1000));
        assert_eq!(config.files[2].chunk_size, Some(500));
        assert_eq!(config.post_ingest, vec!["MATCH (n) RETURN count(n)"]);
        assert!(config.pre_ingest.iter().chain(&config.post_ingest).all(|s| !s.ends_with(';')));
    }

    #[test]
    fn load_csv_files_batch_inside_the_statement() {
        let config =
            export_loader_config(&history(), 1, IngestionStrategy::LoadCsv, &LoaderOptions::default())
                .unwrap();
        assert!(config.files.iter().all(|f| f.chunk_size.is_none()));
        assert!(config.files[0].cql.ends_with("IN TRANSACTIONS OF 1000 ROWS"));
    }

    #[test]
    fn unvalidated_candidate_is_refused() {
        let err = IngestionExporter::for_candidate(pets_model(), &AllowedColumns::flat(["first_name"]))
            .unwrap_err();
        assert!(err.is_configuration());
        match err {
            CodegenError::UnvalidatedModel(violations) => assert!(!violations.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn valid_candidate_exports_without_history() {
        let exporter = IngestionExporter::for_candidate(pets_model(), &allowed()).unwrap();
        assert_eq!(exporter.export_constraints(), export_constraints(&history(), 1).unwrap());
    }
}
