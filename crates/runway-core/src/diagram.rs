//! Adapter between `DataModel` and the arrows-style diagram JSON used by
//! visual graph editors.
//!
//! Node and relationship properties are encoded as
//! `"<csv_mapping> | <type>[ | unique][ | other=<column>]"` strings. A node
//! loaded from a non-default file carries its file name under the reserved
//! `_source` property key.

use serde::{Deserialize, Serialize};

use crate::error::{ConstructionIssue, ModelError, Result};
use crate::types::{DataModel, GraphEntity, Node, Property, Relationship, DEFAULT_SOURCE};

const SOURCE_KEY: &str = "_source";
const GRID_COLUMNS: usize = 4;
const GRID_DX: f64 = 250.0;
const GRID_DY: f64 = 200.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagramNode {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, with = "ordered_map")]
    pub properties: Vec<(String, String)>,
    #[serde(default)]
    pub style: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagramRelationship {
    pub id: String,
    #[serde(rename = "fromId")]
    pub from_id: String,
    #[serde(rename = "toId")]
    pub to_id: String,
    #[serde(rename = "type", default)]
    pub rel_type: String,
    #[serde(default, with = "ordered_map")]
    pub properties: Vec<(String, String)>,
    #[serde(default)]
    pub style: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagramDocument {
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub relationships: Vec<DiagramRelationship>,
    #[serde(default)]
    pub style: serde_json::Map<String, serde_json::Value>,
}

/// Render a model as a diagram, laying nodes out on a fixed grid.
pub fn to_diagram(model: &DataModel) -> DiagramDocument {
    let nodes = model
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let mut properties = encode_properties(node.properties());
            if node.source_name() != DEFAULT_SOURCE {
                properties.push((SOURCE_KEY.to_string(), node.source_name().to_string()));
            }
            DiagramNode {
                id: format!("n{i}"),
                position: Position {
                    x: (i % GRID_COLUMNS) as f64 * GRID_DX,
                    y: (i / GRID_COLUMNS) as f64 * GRID_DY,
                },
                caption: node.label().to_string(),
                labels: vec![node.label().to_string()],
                properties,
                style: Default::default(),
            }
        })
        .collect();

    let relationships = model
        .relationships()
        .iter()
        .enumerate()
        .map(|(i, rel)| {
            let mut properties = encode_properties(rel.properties());
            if rel.source_name() != DEFAULT_SOURCE {
                properties.push((SOURCE_KEY.to_string(), rel.source_name().to_string()));
            }
            DiagramRelationship {
                id: format!("r{i}"),
                from_id: node_id(model, rel.source()),
                to_id: node_id(model, rel.target()),
                rel_type: rel.rel_type().to_string(),
                properties,
                style: Default::default(),
            }
        })
        .collect();

    DiagramDocument {
        nodes,
        relationships,
        style: Default::default(),
    }
}

/// Build a model from a diagram.
///
/// Relationships pointing at unknown diagram node ids are structural
/// errors; everything else is left for the validator.
pub fn from_diagram(doc: &DiagramDocument) -> Result<DataModel> {
    let mut issues = Vec::new();

    let nodes: Vec<Node> = doc
        .nodes
        .iter()
        .map(|dn| {
            let (properties, source) = decode_properties(&dn.properties);
            let node = Node::new(diagram_label(dn), properties);
            match source {
                Some(source) => node.from_source(&source),
                None => node,
            }
        })
        .collect();

    let mut relationships = Vec::with_capacity(doc.relationships.len());
    for dr in &doc.relationships {
        let from = doc.nodes.iter().find(|n| n.id == dr.from_id);
        let to = doc.nodes.iter().find(|n| n.id == dr.to_id);
        for (end, id) in [(from, &dr.from_id), (to, &dr.to_id)] {
            if end.is_none() {
                issues.push(ConstructionIssue::UnknownDiagramNode {
                    id: dr.id.clone(),
                    node_id: id.clone(),
                });
            }
        }
        let (Some(from), Some(to)) = (from, to) else {
            continue;
        };

        let (properties, source) = decode_properties(&dr.properties);
        let rel = Relationship::new(&dr.rel_type, properties, diagram_label(from), diagram_label(to));
        relationships.push(match source {
            Some(source) => rel.from_source(&source),
            None => rel,
        });
    }

    if !issues.is_empty() {
        return Err(ModelError::Construction(issues));
    }
    DataModel::new(nodes, relationships)
}

fn node_id(model: &DataModel, label: &str) -> String {
    model
        .nodes()
        .iter()
        .position(|n| n.label() == label)
        .map(|i| format!("n{i}"))
        .unwrap_or_default()
}

fn diagram_label(node: &DiagramNode) -> &str {
    if !node.caption.trim().is_empty() {
        return &node.caption;
    }
    node.labels.first().map(String::as_str).unwrap_or_default()
}

fn encode_properties(properties: &[Property]) -> Vec<(String, String)> {
    properties
        .iter()
        .map(|p| {
            let mut value = format!("{} | {}", p.csv_mapping(), p.property_type());
            if p.is_unique() {
                value.push_str(" | unique");
            }
            if let Some(other) = p.csv_mapping_other() {
                value.push_str(&format!(" | other={other}"));
            }
            (p.name().to_string(), value)
        })
        .collect()
}

fn decode_properties(entries: &[(String, String)]) -> (Vec<Property>, Option<String>) {
    let mut properties = Vec::new();
    let mut source = None;

    for (name, value) in entries {
        if name == SOURCE_KEY {
            source = Some(value.trim().to_string());
            continue;
        }

        let mut parts = value.split('|').map(str::trim);
        let column = parts.next().unwrap_or_default();
        let property_type = parts.next().filter(|t| !t.is_empty()).unwrap_or("str");
        let mut prop = Property::new(name, column, property_type);
        for flag in parts {
            if flag == "unique" {
                prop = prop.unique();
            } else if let Some(other) = flag.strip_prefix("other=") {
                prop = prop.with_other_mapping(other);
            } else {
                tracing::warn!(property = %name, flag, "Ignoring unknown diagram property flag");
            }
        }
        properties.push(prop);
    }

    (properties, source)
}

/// Serde helpers keeping diagram property maps in declaration order.
mod ordered_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(entries: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(String, String)>, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property names to strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
