use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{EntityKind, EntityRef};

/// Errors raised by model construction and history access.
///
/// Schema violations found by the validator are not errors; they are
/// returned as data from [`crate::validation::validate`].
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Structural precondition failed: {}", join_issues(.0))]
    Construction(Vec<ConstructionIssue>),

    #[error("Relationship {rel_type} references undeclared node label {label}")]
    UndeclaredEndpoint { rel_type: String, label: String },

    #[error("Version {version} is out of range for a history of {len} snapshot(s)")]
    VersionOutOfRange { version: i64, len: usize },

    #[error("Corrupt history: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// A missing or malformed constructor input.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ConstructionIssue {
    #[error("{kind} is missing its label/type")]
    EmptyName { kind: EntityKind },

    #[error("node label {label} is declared more than once")]
    DuplicateLabel { label: String },

    #[error("relationship {rel_type} is missing a source or target label")]
    MissingEndpoint { rel_type: String },

    #[error("{entity} has a property without a name")]
    EmptyPropertyName { entity: EntityRef },

    #[error("{entity} property {property} has no csv_mapping")]
    EmptyColumn { entity: EntityRef, property: String },

    #[error("{entity} declares property {property} more than once")]
    DuplicateProperty { entity: EntityRef, property: String },

    #[error("diagram relationship {id} points at unknown diagram node {node_id}")]
    UnknownDiagramNode { id: String, node_id: String },
}

fn join_issues(issues: &[ConstructionIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
