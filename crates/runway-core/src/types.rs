//! Core schema types for a labeled-property graph.
//!
//! A `DataModel` is a set of `Node` definitions and `Relationship`
//! definitions, each carrying an ordered list of `Property` descriptors that
//! map graph properties onto source columns. Entities are immutable once
//! built; a corrected schema is a new `DataModel`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::same_source;
use crate::document::ModelDocument;
use crate::error::{ConstructionIssue, ModelError, Result};

/// Source name used when an entity does not declare which file it comes from.
pub const DEFAULT_SOURCE: &str = "file";

/// Name of the uniqueness constraint on `property` of a label or type.
///
/// Constraint names share one namespace in the database, so two entities
/// that produce the same name cannot both be constrained.
pub fn constraint_name(label_or_type: &str, property: &str) -> String {
    format!("{}_{}", label_or_type.to_lowercase(), property.to_lowercase())
}

// ── Property ──────────────────────────────────────────────────────

/// A graph property and the source column it is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    csv_mapping: String,
    csv_mapping_other: Option<String>,
    property_type: String,
    is_unique: bool,
}

impl Property {
    /// A non-unique property mapped to `csv_mapping`.
    pub fn new(name: &str, csv_mapping: &str, property_type: &str) -> Self {
        Self {
            name: name.to_string(),
            csv_mapping: csv_mapping.to_string(),
            csv_mapping_other: None,
            property_type: property_type.to_string(),
            is_unique: false,
        }
    }

    /// Mark this property as part of its entity's key.
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Column carrying the same value in another source file.
    pub fn with_other_mapping(mut self, column: &str) -> Self {
        self.csv_mapping_other = Some(column.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn csv_mapping(&self) -> &str {
        &self.csv_mapping
    }

    pub fn csv_mapping_other(&self) -> Option<&str> {
        self.csv_mapping_other.as_deref()
    }

    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    pub fn is_unique(&self) -> bool {
        self.is_unique
    }

    /// The column to read this property from when loading rows of `source`.
    ///
    /// `home` is the source file of the entity that owns the property.
    pub fn column_for(&self, home: &str, source: &str) -> &str {
        if same_source(home, source) {
            return &self.csv_mapping;
        }
        self.csv_mapping_other.as_deref().unwrap_or(&self.csv_mapping)
    }
}

// ── Entities ──────────────────────────────────────────────────────

/// Whether a schema element is a node or a relationship.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Relationship,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "Node"),
            Self::Relationship => write!(f, "Relationship"),
        }
    }
}

/// Behaviour shared by nodes and relationships.
///
/// All derived accessors preserve property declaration order.
pub trait GraphEntity {
    fn kind(&self) -> EntityKind;

    /// Node label or relationship type.
    fn name(&self) -> &str;

    fn properties(&self) -> &[Property];

    /// Source file the entity's rows are read from.
    fn source_name(&self) -> &str;

    fn property_names(&self) -> Vec<&str> {
        self.properties().iter().map(Property::name).collect()
    }

    /// `(property, column)` pairs for every property.
    fn property_column_mapping(&self) -> Vec<(&str, &str)> {
        self.properties()
            .iter()
            .map(|p| (p.name(), p.csv_mapping()))
            .collect()
    }

    /// `(property, column)` pairs for non-unique properties.
    fn nonunique_property_column_mapping(&self) -> Vec<(&str, &str)> {
        self.properties()
            .iter()
            .filter(|p| !p.is_unique())
            .map(|p| (p.name(), p.csv_mapping()))
            .collect()
    }

    /// Names of the unique properties.
    fn unique_constraints(&self) -> Vec<&str> {
        self.properties()
            .iter()
            .filter(|p| p.is_unique())
            .map(Property::name)
            .collect()
    }

    /// `(property, column)` pairs for unique properties.
    fn unique_constraints_column_mapping(&self) -> Vec<(&str, &str)> {
        self.properties()
            .iter()
            .filter(|p| p.is_unique())
            .map(|p| (p.name(), p.csv_mapping()))
            .collect()
    }

    fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.kind(),
            name: self.name().to_string(),
        }
    }
}

/// A lightweight reference to a schema element, used in diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub name: String,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// A node label with its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    label: String,
    properties: Vec<Property>,
    source_name: String,
}

impl Node {
    pub fn new(label: &str, properties: Vec<Property>) -> Self {
        Self {
            label: label.to_string(),
            properties,
            source_name: DEFAULT_SOURCE.to_string(),
        }
    }

    /// Load this node from a named source file.
    pub fn from_source(mut self, source_name: &str) -> Self {
        self.source_name = source_name.to_string();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl GraphEntity for Node {
    fn kind(&self) -> EntityKind {
        EntityKind::Node
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// A typed, directed relationship between two node labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    rel_type: String,
    properties: Vec<Property>,
    source: String,
    target: String,
    source_name: String,
}

impl Relationship {
    pub fn new(rel_type: &str, properties: Vec<Property>, source: &str, target: &str) -> Self {
        Self {
            rel_type: rel_type.to_string(),
            properties,
            source: source.to_string(),
            target: target.to_string(),
            source_name: DEFAULT_SOURCE.to_string(),
        }
    }

    /// Load this relationship from a named source file.
    pub fn from_source(mut self, source_name: &str) -> Self {
        self.source_name = source_name.to_string();
        self
    }

    pub fn rel_type(&self) -> &str {
        &self.rel_type
    }

    /// Label of the start node.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Label of the end node.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl GraphEntity for Relationship {
    fn kind(&self) -> EntityKind {
        EntityKind::Relationship
    }

    fn name(&self) -> &str {
        &self.rel_type
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

// ── Data Model ────────────────────────────────────────────────────

/// A complete graph schema candidate.
///
/// Construction only checks structural completeness (non-empty names,
/// unique node labels, unique property names per entity). Column existence,
/// node keys and endpoint resolution are checked by the validator so that
/// every problem can be reported at once.
///
/// The serde form is the structured document; deserializing goes through
/// the same typed construction as `DataModel::new`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "ModelDocument", into = "ModelDocument")]
pub struct DataModel {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

impl DataModel {
    pub fn new(nodes: Vec<Node>, relationships: Vec<Relationship>) -> Result<Self> {
        let mut issues = Vec::new();
        let mut labels = HashSet::new();

        for node in &nodes {
            if node.label.trim().is_empty() {
                issues.push(ConstructionIssue::EmptyName {
                    kind: EntityKind::Node,
                });
            } else if !labels.insert(node.label.as_str()) {
                issues.push(ConstructionIssue::DuplicateLabel {
                    label: node.label.clone(),
                });
            }
            check_properties(node, &mut issues);
        }

        for rel in &relationships {
            if rel.rel_type.trim().is_empty() {
                issues.push(ConstructionIssue::EmptyName {
                    kind: EntityKind::Relationship,
                });
            }
            if rel.source.trim().is_empty() || rel.target.trim().is_empty() {
                issues.push(ConstructionIssue::MissingEndpoint {
                    rel_type: rel.rel_type.clone(),
                });
            }
            check_properties(rel, &mut issues);
        }

        if !issues.is_empty() {
            return Err(ModelError::Construction(issues));
        }

        Ok(Self {
            nodes,
            relationships,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn node(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    pub fn node_labels(&self) -> Vec<&str> {
        self.nodes.iter().map(Node::label).collect()
    }

    pub fn relationship_types(&self) -> Vec<&str> {
        self.relationships.iter().map(Relationship::rel_type).collect()
    }

    /// Every node and relationship, nodes first, in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &dyn GraphEntity> {
        self.nodes
            .iter()
            .map(|n| n as &dyn GraphEntity)
            .chain(self.relationships.iter().map(|r| r as &dyn GraphEntity))
    }
}

fn check_properties(entity: &dyn GraphEntity, issues: &mut Vec<ConstructionIssue>) {
    let mut seen = HashSet::new();
    for prop in entity.properties() {
        if prop.name.trim().is_empty() {
            issues.push(ConstructionIssue::EmptyPropertyName {
                entity: entity.entity_ref(),
            });
            continue;
        }
        if prop.csv_mapping.trim().is_empty() {
            issues.push(ConstructionIssue::EmptyColumn {
                entity: entity.entity_ref(),
                property: prop.name.clone(),
            });
        }
        if !seen.insert(prop.name.as_str()) {
            issues.push(ConstructionIssue::DuplicateProperty {
                entity: entity.entity_ref(),
                property: prop.name.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Node {
        Node::new(
            "Person",
            vec![
                Property::new("name", "first_name", "str").unique(),
                Property::new("age", "age", "int"),
            ],
        )
    }

    #[test]
    fn derived_accessors_keep_declaration_order() {
        let node = Node::new(
            "Order",
            vec![
                Property::new("total", "order_total", "float"),
                Property::new("id", "order_id", "str").unique(),
                Property::new("placed", "placed_at", "datetime"),
                Property::new("region", "region", "str").unique(),
            ],
        );

        assert_eq!(node.property_names(), vec!["total", "id", "placed", "region"]);
        assert_eq!(node.unique_constraints(), vec!["id", "region"]);
        assert_eq!(
            node.unique_constraints_column_mapping(),
            vec![("id", "order_id"), ("region", "region")]
        );
        assert_eq!(
            node.nonunique_property_column_mapping(),
            vec![("total", "order_total"), ("placed", "placed_at")]
        );
    }

    #[test]
    fn relationship_without_properties_is_allowed() {
        let rel = Relationship::new("HAS_PET", vec![], "Person", "Pet");
        assert!(rel.properties().is_empty());
        assert!(rel.unique_constraints().is_empty());
        assert_eq!(rel.source_name(), DEFAULT_SOURCE);
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = DataModel::new(vec![person(), person()], vec![]).unwrap_err();
        match err {
            ModelError::Construction(issues) => {
                assert_eq!(
                    issues,
                    vec![ConstructionIssue::DuplicateLabel {
                        label: "Person".to_string()
                    }]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn construction_collects_every_issue() {
        let broken = Node::new(
            "",
            vec![
                Property::new("", "x", "str"),
                Property::new("a", "", "str"),
                Property::new("a", "y", "str"),
            ],
        );
        let rel = Relationship::new("KNOWS", vec![], "Person", " ");

        let err = DataModel::new(vec![broken], vec![rel]).unwrap_err();
        let ModelError::Construction(issues) = err else {
            panic!("expected construction error");
        };
        assert_eq!(issues.len(), 5);
        assert!(issues.contains(&ConstructionIssue::MissingEndpoint {
            rel_type: "KNOWS".to_string()
        }));
    }

    #[test]
    fn column_for_prefers_other_mapping_across_files() {
        let prop = Property::new("id", "customer_id", "str")
            .unique()
            .with_other_mapping("cust_ref");
        assert_eq!(prop.column_for("customers", "customers"), "customer_id");
        assert_eq!(prop.column_for("customers", "orders"), "cust_ref");

        let plain = Property::new("id", "customer_id", "str");
        assert_eq!(plain.column_for("customers", "orders"), "customer_id");
        assert_eq!(prop.column_for("customers", "customers.csv"), "customer_id");
    }
}
