//! runway-cli: Command-line front end for Runway.
//!
//! Reads model documents and allowed columns from JSON files, validates and
//! appends them to a model history, and prints constraints, ingestion
//! scripts, loader configs and diagrams for any accepted version.

pub mod commands;
pub mod config;
pub mod drafts;
pub mod error;
