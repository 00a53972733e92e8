//! BLAKE3 fingerprints for model snapshots.
//!
//! The fingerprint covers the model's canonical document form, so two
//! snapshots with equal fingerprints generate byte-identical Cypher.

use crate::types::DataModel;

/// Compute the hex-encoded BLAKE3 hash of a model.
pub fn fingerprint(model: &DataModel) -> String {
    let json = serde_json::to_vec(&model.to_document()).expect("Model serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Node, Property};

    fn model(column: &str) -> DataModel {
        DataModel::new(
            vec![Node::new("Person", vec![Property::new("name", column, "str").unique()])],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint(&model("first_name")), fingerprint(&model("first_name")));
        assert_eq!(fingerprint(&model("first_name")).len(), 64);
    }

    #[test]
    fn fingerprint_tracks_content() {
        assert_ne!(fingerprint(&model("first_name")), fingerprint(&model("given_name")));
    }
}
