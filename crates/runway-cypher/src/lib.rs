//! runway-cypher: Cypher code generation for accepted graph schemas.
//!
//! Everything here is pure text generation. Constraint DDL, per-entity load
//! statements for the `standard` and `load_csv` strategies, user-supplied
//! ingest code and loader configs are produced from a validated model or a
//! history version; nothing talks to a database.

pub mod error;
pub mod export;
pub mod format;
pub mod generator;
pub mod loader;
pub mod statements;
pub mod strategy;

pub use error::{CodegenError, Result};
pub use export::{
    export_constraints, export_ingestion_script, export_loader_config, IngestionExporter,
};
pub use generator::{
    constraint_statements, generate_constraint, generate_match_node_clause,
    generate_set_property, generate_set_unique_property, CypherGenerator,
};
pub use loader::{LoadFile, LoaderConfig, LoaderOptions};
pub use statements::{split_statements, IngestCode};
pub use strategy::{BatchSizes, IngestionStrategy};
