//! Structured document form of a data model.
//!
//! This is the shape candidates arrive in (from an LLM or a file) and the
//! shape any history version is exported to for display or persistence.
//! Records are plain data; `DataModel::from_document` is the only way from
//! a record to an entity.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::types::{DataModel, GraphEntity, Node, Property, Relationship, DEFAULT_SOURCE};

fn default_type() -> String {
    "str".to_string()
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

/// One property record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub csv_mapping: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_mapping_other: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub property_type: String,
    #[serde(default)]
    pub is_unique: bool,
}

/// One node record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeRecord {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default = "default_source")]
    pub source_name: String,
}

/// One relationship record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationshipRecord {
    #[serde(rename = "type", default)]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default = "default_source")]
    pub source_name: String,
}

/// Ordered node and relationship records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

impl ModelDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&Property> for PropertyRecord {
    fn from(p: &Property) -> Self {
        Self {
            name: p.name().to_string(),
            csv_mapping: p.csv_mapping().to_string(),
            csv_mapping_other: p.csv_mapping_other().map(String::from),
            property_type: p.property_type().to_string(),
            is_unique: p.is_unique(),
        }
    }
}

impl From<&PropertyRecord> for Property {
    fn from(r: &PropertyRecord) -> Self {
        let mut prop = Property::new(&r.name, &r.csv_mapping, &r.property_type);
        if let Some(other) = &r.csv_mapping_other {
            prop = prop.with_other_mapping(other);
        }
        if r.is_unique {
            prop = prop.unique();
        }
        prop
    }
}

impl From<&DataModel> for ModelDocument {
    fn from(model: &DataModel) -> Self {
        Self {
            nodes: model
                .nodes()
                .iter()
                .map(|n| NodeRecord {
                    label: n.label().to_string(),
                    properties: n.properties().iter().map(PropertyRecord::from).collect(),
                    source_name: n.source_name().to_string(),
                })
                .collect(),
            relationships: model
                .relationships()
                .iter()
                .map(|r| RelationshipRecord {
                    rel_type: r.rel_type().to_string(),
                    properties: r.properties().iter().map(PropertyRecord::from).collect(),
                    source: r.source().to_string(),
                    target: r.target().to_string(),
                    source_name: r.source_name().to_string(),
                })
                .collect(),
        }
    }
}

impl From<DataModel> for ModelDocument {
    fn from(model: DataModel) -> Self {
        Self::from(&model)
    }
}

impl TryFrom<ModelDocument> for DataModel {
    type Error = ModelError;

    fn try_from(doc: ModelDocument) -> Result<Self> {
        DataModel::from_document(&doc)
    }
}

impl DataModel {
    /// Build a model from its document form, collecting every structural
    /// problem into a single [`ModelError::Construction`].
    pub fn from_document(doc: &ModelDocument) -> Result<Self> {
        let nodes = doc
            .nodes
            .iter()
            .map(|n| {
                Node::new(&n.label, n.properties.iter().map(Property::from).collect())
                    .from_source(&n.source_name)
            })
            .collect();
        let relationships = doc
            .relationships
            .iter()
            .map(|r| {
                Relationship::new(
                    &r.rel_type,
                    r.properties.iter().map(Property::from).collect(),
                    &r.source,
                    &r.target,
                )
                .from_source(&r.source_name)
            })
            .collect();
        DataModel::new(nodes, relationships)
    }

    pub fn to_document(&self) -> ModelDocument {
        ModelDocument::from(self)
    }
}
