//! Schema validation against the allowed source columns.
//!
//! Every check runs and every violation is collected, so a correction round
//! can fix all problems at once. Violation order is deterministic: nodes in
//! declaration order, then relationships, then cross-entity checks.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::columns::{same_source, AllowedColumns};
use crate::types::{constraint_name, DataModel, EntityRef, GraphEntity, Relationship};

/// Which end of a relationship a violation refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Source,
    Target,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// A rule the model breaks. Returned as data, never raised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaViolation {
    /// A property maps to a column its source does not have.
    PropertyColumnMissing {
        entity: EntityRef,
        property: String,
        column: String,
        source: String,
    },
    /// A unique property maps to a column its source does not have.
    /// Reported in addition to `PropertyColumnMissing`.
    UniquePropertyColumnMissing {
        entity: EntityRef,
        property: String,
        column: String,
        source: String,
    },
    /// A node has no unique property to MERGE on.
    MissingNodeKey { label: String },
    /// Two entities' unique properties produce the same constraint name.
    UniqueNameCollision {
        constraint: String,
        property: String,
        first: EntityRef,
        second: EntityRef,
    },
    /// A relationship endpoint names a label no node declares.
    UnknownEndpoint {
        rel_type: String,
        role: EndpointRole,
        label: String,
    },
    /// An endpoint key cannot be read from the relationship's own file.
    EndpointKeyColumnMissing {
        rel_type: String,
        label: String,
        property: String,
        column: String,
        source: String,
    },
    /// An entity is loaded from a file the column mapping does not list.
    UnknownSourceFile { entity: EntityRef, source: String },
}

impl SchemaViolation {
    /// The entity the violation is reported against.
    pub fn entity_name(&self) -> &str {
        match self {
            Self::PropertyColumnMissing { entity, .. }
            | Self::UniquePropertyColumnMissing { entity, .. }
            | Self::UnknownSourceFile { entity, .. } => &entity.name,
            Self::UniqueNameCollision { second, .. } => &second.name,
            Self::MissingNodeKey { label } => label,
            Self::UnknownEndpoint { rel_type, .. } | Self::EndpointKeyColumnMissing { rel_type, .. } => {
                rel_type
            }
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PropertyColumnMissing {
                entity,
                property,
                column,
                source,
            } => write!(
                f,
                "{entity}: property `{property}` maps to column `{column}`, which is not among the allowed columns of `{source}`"
            ),
            Self::UniquePropertyColumnMissing {
                entity,
                property,
                column,
                source,
            } => write!(
                f,
                "{entity}: unique property `{property}` maps to column `{column}`, which is not among the allowed columns of `{source}`"
            ),
            Self::MissingNodeKey { label } => {
                write!(f, "Node {label}: no unique property; every node needs a node key")
            }
            Self::UniqueNameCollision {
                constraint,
                property,
                first,
                second,
            } => write!(
                f,
                "{second}: unique property `{property}` reuses constraint name `{constraint}` already taken by {first}"
            ),
            Self::UnknownEndpoint {
                rel_type,
                role,
                label,
            } => write!(
                f,
                "Relationship {rel_type}: {role} label `{label}` is not a declared node"
            ),
            Self::EndpointKeyColumnMissing {
                rel_type,
                label,
                property,
                column,
                source,
            } => write!(
                f,
                "Relationship {rel_type}: key `{label}.{property}` is read from column `{column}`, which `{source}` does not have (set csv_mapping_other)"
            ),
            Self::UnknownSourceFile { entity, source } => {
                write!(f, "{entity}: source file `{source}` is not in the column mapping")
            }
        }
    }
}

/// Check `model` against `allowed` and return every violation found.
///
/// An empty list means the model is valid.
pub fn validate(model: &DataModel, allowed: &AllowedColumns) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    for node in model.nodes() {
        check_columns(node, allowed, &mut violations);
        if node.unique_constraints().is_empty() {
            violations.push(SchemaViolation::MissingNodeKey {
                label: node.label().to_string(),
            });
        }
    }

    for rel in model.relationships() {
        check_columns(rel, allowed, &mut violations);
        check_endpoints(model, rel, allowed, &mut violations);
    }

    check_unique_name_collisions(model, &mut violations);

    if violations.is_empty() {
        tracing::debug!(
            nodes = model.nodes().len(),
            relationships = model.relationships().len(),
            "Model validated"
        );
    } else {
        tracing::warn!(count = violations.len(), "Model has schema violations");
    }

    violations
}

/// Validate `model` and wrap it as a [`ValidatedModel`] when it is clean.
pub fn accept(
    model: DataModel,
    allowed: &AllowedColumns,
) -> Result<ValidatedModel, Vec<SchemaViolation>> {
    let violations = validate(&model, allowed);
    if !violations.is_empty() {
        return Err(violations);
    }
    Ok(ValidatedModel {
        model,
        allowed_columns: allowed.clone(),
    })
}

fn check_columns(
    entity: &dyn GraphEntity,
    allowed: &AllowedColumns,
    violations: &mut Vec<SchemaViolation>,
) {
    let source = entity.source_name();
    if allowed.scope(source).is_none() {
        violations.push(SchemaViolation::UnknownSourceFile {
            entity: entity.entity_ref(),
            source: source.to_string(),
        });
    }

    for prop in entity.properties() {
        if allowed.contains(source, prop.csv_mapping()) {
            continue;
        }
        violations.push(SchemaViolation::PropertyColumnMissing {
            entity: entity.entity_ref(),
            property: prop.name().to_string(),
            column: prop.csv_mapping().to_string(),
            source: source.to_string(),
        });
        if prop.is_unique() {
            violations.push(SchemaViolation::UniquePropertyColumnMissing {
                entity: entity.entity_ref(),
                property: prop.name().to_string(),
                column: prop.csv_mapping().to_string(),
                source: source.to_string(),
            });
        }
    }
}

fn check_endpoints(
    model: &DataModel,
    rel: &Relationship,
    allowed: &AllowedColumns,
    violations: &mut Vec<SchemaViolation>,
) {
    let endpoints = [
        (EndpointRole::Source, rel.source()),
        (EndpointRole::Target, rel.target()),
    ];

    for (role, label) in endpoints {
        let Some(node) = model.node(label) else {
            violations.push(SchemaViolation::UnknownEndpoint {
                rel_type: rel.rel_type().to_string(),
                role,
                label: label.to_string(),
            });
            continue;
        };

        // Only meaningful when the relationship reads a different file
        // than the node, and that file is known.
        if same_source(node.source_name(), rel.source_name())
            || allowed.scope(rel.source_name()).is_none() {
            continue;
        }

        for prop in node.properties().iter().filter(|p| p.is_unique()) {
            let column = prop.column_for(node.source_name(), rel.source_name());
            if !allowed.contains(rel.source_name(), column) {
                violations.push(SchemaViolation::EndpointKeyColumnMissing {
                    rel_type: rel.rel_type().to_string(),
                    label: label.to_string(),
                    property: prop.name().to_string(),
                    column: column.to_string(),
                    source: rel.source_name().to_string(),
                });
            }
        }
    }
}

fn check_unique_name_collisions(model: &DataModel, violations: &mut Vec<SchemaViolation>) {
    let mut seen: HashMap<String, (usize, EntityRef)> = HashMap::new();

    for (idx, entity) in model.entities().enumerate() {
        for property in entity.unique_constraints() {
            let name = constraint_name(entity.name(), property);
            match seen.get(&name) {
                Some((owner, first)) if *owner != idx => {
                    violations.push(SchemaViolation::UniqueNameCollision {
                        constraint: name,
                        property: property.to_string(),
                        first: first.clone(),
                        second: entity.entity_ref(),
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(name, (idx, entity.entity_ref()));
                }
            }
        }
    }
}

/// A model that passed validation, together with the columns it was
/// validated against. Only [`accept`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedModel {
    model: DataModel,
    allowed_columns: AllowedColumns,
}

impl ValidatedModel {
    pub fn model(&self) -> &DataModel {
        &self.model
    }

    pub fn allowed_columns(&self) -> &AllowedColumns {
        &self.allowed_columns
    }

    pub fn into_parts(self) -> (DataModel, AllowedColumns) {
        (self.model, self.allowed_columns)
    }
}
