//! Cypher generation for a validated data model.
//!
//! All load statements use MERGE so that re-running an ingest is
//! idempotent. Nodes merge on their unique properties; relationships match
//! both endpoints by their keys and merge between them. Property order
//! always follows declaration order, so output is byte-identical for an
//! unchanged model.

use runway_core::{
    constraint_name, DataModel, EntityKind, GraphEntity, ModelError, Node, Relationship,
    Snapshot, ValidatedModel,
};

use crate::error::Result;
use crate::format::{csv_file_name, escape_identifier, indent, property_map, set_clause, INDENT};
use crate::strategy::{BatchSizes, IngestionStrategy};

/// Header binding the pushed row batch for the standard strategy.
const ROWS_HEADER: &str = "WITH $rows AS rows\nUNWIND rows AS row";

// ── Fragments ────────────────────────────────────────────────────

/// One uniqueness constraint per unique property, without terminators.
pub fn constraint_statements(entity: &dyn GraphEntity) -> Vec<String> {
    let name = escape_identifier(entity.name());
    entity
        .unique_constraints()
        .into_iter()
        .map(|prop| {
            let constraint = escape_identifier(&constraint_name(entity.name(), prop));
            let prop = escape_identifier(prop);
            match entity.kind() {
                EntityKind::Node => format!(
                    "CREATE CONSTRAINT {constraint} IF NOT EXISTS FOR (n:{name}) REQUIRE n.{prop} IS UNIQUE"
                ),
                EntityKind::Relationship => format!(
                    "CREATE CONSTRAINT {constraint} IF NOT EXISTS FOR ()-[r:{name}]-() REQUIRE r.{prop} IS UNIQUE"
                ),
            }
        })
        .collect()
}

/// Constraint DDL for an entity, one `;`-terminated line per unique property.
pub fn generate_constraint(entity: &dyn GraphEntity) -> String {
    constraint_statements(entity)
        .iter()
        .map(|s| format!("{s};\n"))
        .collect()
}

/// The `{prop: row.column, ...}` MERGE key of an entity.
pub fn generate_set_unique_property(entity: &dyn GraphEntity) -> String {
    property_map(entity.unique_constraints_column_mapping())
}

/// `SET` clause for the non-unique properties, empty when there are none.
pub fn generate_set_property(entity: &dyn GraphEntity) -> String {
    set_clause(variable(entity), entity.nonunique_property_column_mapping())
}

/// MATCH pattern for a node keyed only on its unique properties.
pub fn generate_match_node_clause(node: &Node) -> String {
    format!(
        "MATCH (n:{} {})",
        escape_identifier(node.label()),
        generate_set_unique_property(node)
    )
}

fn variable(entity: &dyn GraphEntity) -> &'static str {
    match entity.kind() {
        EntityKind::Node => "n",
        EntityKind::Relationship => "r",
    }
}

/// MATCH an endpoint under `var`, reading its key columns as they appear in
/// the relationship's source file.
fn match_endpoint(var: &str, node: &Node, rel_source: &str) -> String {
    let keys = node
        .properties()
        .iter()
        .filter(|p| p.is_unique())
        .map(|p| (p.name(), p.column_for(node.source_name(), rel_source)));
    format!(
        "MATCH ({var}:{} {})",
        escape_identifier(node.label()),
        property_map(keys)
    )
}

// ── Generator ────────────────────────────────────────────────────

/// Compiles node and relationship load statements.
///
/// The generator does not re-validate; it only refuses relationships whose
/// endpoints are missing from its node set.
#[derive(Debug, Clone)]
pub struct CypherGenerator<'a> {
    nodes: &'a [Node],
    relationships: &'a [Relationship],
    batch_sizes: BatchSizes,
}

impl<'a> CypherGenerator<'a> {
    /// A generator over every entity of a validated model.
    pub fn new(validated: &'a ValidatedModel) -> Self {
        Self::from_model(validated.model())
    }

    /// A generator over an accepted history version.
    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        Self::from_model(snapshot.model())
    }

    /// Callers must have validated `model`.
    pub(crate) fn from_model(model: &'a DataModel) -> Self {
        Self {
            nodes: model.nodes(),
            relationships: model.relationships(),
            batch_sizes: BatchSizes::default(),
        }
    }

    /// A generator over a bare node set, for fragment-level use.
    pub fn with_nodes(nodes: &'a [Node]) -> Self {
        Self {
            nodes,
            relationships: &[],
            batch_sizes: BatchSizes::default(),
        }
    }

    /// Set the LOAD CSV transaction batch sizes.
    pub fn with_batch_sizes(mut self, batch_sizes: BatchSizes) -> Self {
        self.batch_sizes = batch_sizes;
        self
    }

    pub fn batch_sizes(&self) -> BatchSizes {
        self.batch_sizes
    }

    /// MERGE a node on its key and SET the rest.
    pub fn generate_merge_node_clause(&self, node: &Node, strategy: IngestionStrategy) -> String {
        let mut body = vec![format!(
            "MERGE (n:{} {})",
            escape_identifier(node.label()),
            generate_set_unique_property(node)
        )];
        let set = generate_set_property(node);
        if !set.is_empty() {
            body.push(set);
        }

        tracing::debug!(label = node.label(), %strategy, "Generated node merge");
        self.wrap(&body, strategy, node.source_name(), self.batch_sizes.nodes)
    }

    /// MATCH both endpoints, MERGE the relationship and SET its properties.
    pub fn generate_merge_relationship_clause(
        &self,
        rel: &Relationship,
        strategy: IngestionStrategy,
    ) -> Result<String> {
        let source = self.endpoint(rel, rel.source())?;
        let target = self.endpoint(rel, rel.target())?;

        let rel_type = escape_identifier(rel.rel_type());
        let merge = if rel.unique_constraints().is_empty() {
            format!("MERGE (source)-[r:{rel_type}]->(target)")
        } else {
            format!(
                "MERGE (source)-[r:{rel_type} {}]->(target)",
                generate_set_unique_property(rel)
            )
        };

        let mut body = vec![
            match_endpoint("source", source, rel.source_name()),
            match_endpoint("target", target, rel.source_name()),
            merge,
        ];
        let set = generate_set_property(rel);
        if !set.is_empty() {
            body.push(set);
        }

        tracing::debug!(rel_type = rel.rel_type(), %strategy, "Generated relationship merge");
        Ok(self.wrap(
            &body,
            strategy,
            rel.source_name(),
            self.batch_sizes.relationships,
        ))
    }

    /// Constraint statements for every node, then every relationship.
    pub fn constraint_statements(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| n as &dyn GraphEntity)
            .chain(self.relationships.iter().map(|r| r as &dyn GraphEntity))
            .flat_map(constraint_statements)
            .collect()
    }

    /// One load statement per node, in declaration order.
    pub fn node_statements(&self, strategy: IngestionStrategy) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| self.generate_merge_node_clause(n, strategy))
            .collect()
    }

    /// One load statement per relationship, in declaration order.
    pub fn relationship_statements(&self, strategy: IngestionStrategy) -> Result<Vec<String>> {
        self.relationships
            .iter()
            .map(|r| self.generate_merge_relationship_clause(r, strategy))
            .collect()
    }

    fn endpoint(&self, rel: &Relationship, label: &str) -> Result<&'a Node> {
        self.nodes
            .iter()
            .find(|n| n.label() == label)
            .ok_or_else(|| {
                ModelError::UndeclaredEndpoint {
                    rel_type: rel.rel_type().to_string(),
                    label: label.to_string(),
                }
                .into()
            })
    }

    fn wrap(
        &self,
        body: &[String],
        strategy: IngestionStrategy,
        source_name: &str,
        batch_size: usize,
    ) -> String {
        let body = body.join("\n");
        match strategy {
            IngestionStrategy::Standard => format!("{ROWS_HEADER}\n{body}"),
            IngestionStrategy::LoadCsv => {
                let file = csv_file_name(source_name).replace('\'', "\\'");
                format!(
                    "LOAD CSV WITH HEADERS FROM 'file:///{file}' AS row\n\
                     CALL {{\n\
                     {INDENT}WITH row\n\
                     {}\n\
                     }} IN TRANSACTIONS OF {batch_size} ROWS",
                    indent(&body)
                )
            }
        }
    }
}
