//! runway-core: Graph schema model, validation, and version history.
//!
//! This crate provides the foundational pieces every Runway component uses:
//! - Schema entities (`Property`, `Node`, `Relationship`, `DataModel`)
//! - Allowed source columns, flat or per file
//! - The validator, which reports every schema violation as data
//! - `ModelHistory`, the append-only log of accepted model versions
//! - Structured document and diagram adapters
//! - Common error types

pub mod columns;
pub mod diagram;
pub mod document;
pub mod error;
pub mod hash;
pub mod history;
pub mod types;
pub mod validation;

pub use columns::AllowedColumns;
pub use document::ModelDocument;
pub use error::{ConstructionIssue, ModelError};
pub use history::{ModelHistory, Snapshot};
pub use types::{
    constraint_name, DataModel, EntityKind, EntityRef, GraphEntity, Node, Property, Relationship,
    DEFAULT_SOURCE,
};
pub use validation::{accept, validate, SchemaViolation, ValidatedModel};
