//! Append-only version log of accepted data models.
//!
//! Versions are 1-based. Negative versions count back from the latest
//! (`-1` is the current model). Snapshots are never mutated or removed;
//! a corrected model is appended as a new version.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::columns::AllowedColumns;
use crate::document::ModelDocument;
use crate::error::{ModelError, Result};
use crate::hash::fingerprint;
use crate::types::DataModel;
use crate::validation::{validate, ValidatedModel};

/// One accepted model version.
///
/// Only [`ModelHistory`] creates snapshots, either by appending a
/// [`ValidatedModel`] or by re-checking a saved history.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Snapshot {
    version: usize,
    accepted_at: DateTime<Utc>,
    fingerprint: String,
    allowed_columns: AllowedColumns,
    model: DataModel,
}

impl Snapshot {
    pub fn version(&self) -> usize {
        self.version
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    /// BLAKE3 hex digest of the model.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The columns this version was validated against.
    pub fn allowed_columns(&self) -> &AllowedColumns {
        &self.allowed_columns
    }

    pub fn model(&self) -> &DataModel {
        &self.model
    }

    pub fn to_document(&self) -> ModelDocument {
        self.model.to_document()
    }
}

/// Ordered, append-only sequence of accepted model snapshots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelHistory {
    snapshots: Vec<Snapshot>,
}

impl ModelHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an accepted model and return its version number.
    pub fn append(&mut self, validated: ValidatedModel) -> usize {
        let (model, allowed_columns) = validated.into_parts();
        let version = self.snapshots.len() + 1;
        let snapshot = Snapshot {
            version,
            accepted_at: Utc::now(),
            fingerprint: fingerprint(&model),
            allowed_columns,
            model,
        };

        tracing::info!(
            version,
            fingerprint = %snapshot.fingerprint,
            nodes = snapshot.model.nodes().len(),
            relationships = snapshot.model.relationships().len(),
            "Model version accepted"
        );

        self.snapshots.push(snapshot);
        version
    }

    /// Look up a version. `1` is the first, `-1` the latest.
    pub fn get(&self, version: i64) -> Result<&Snapshot> {
        let index = self.resolve(version)?;
        Ok(&self.snapshots[index])
    }

    /// The latest version.
    pub fn current(&self) -> Result<&Snapshot> {
        self.get(-1)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Export a version as ordered node and relationship records.
    pub fn to_structured_document(&self, version: i64) -> Result<ModelDocument> {
        Ok(self.get(version)?.to_document())
    }

    /// Map a signed version onto an index into `snapshots`.
    fn resolve(&self, version: i64) -> Result<usize> {
        let len = self.snapshots.len();
        let out_of_range = || ModelError::VersionOutOfRange { version, len };

        let magnitude = usize::try_from(version.unsigned_abs()).map_err(|_| out_of_range())?;
        if version == 0 || magnitude > len {
            return Err(out_of_range());
        }
        if version > 0 {
            Ok(magnitude - 1)
        } else {
            Ok(len - magnitude)
        }
    }

    // ── Persistence ──────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a saved history, re-checking numbering, fingerprints and
    /// validity of every snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct SavedSnapshot {
            version: usize,
            accepted_at: DateTime<Utc>,
            fingerprint: String,
            allowed_columns: AllowedColumns,
            model: DataModel,
        }

        #[derive(Deserialize)]
        struct Saved {
            snapshots: Vec<SavedSnapshot>,
        }

        let saved: Saved = serde_json::from_str(json)?;
        let mut snapshots = Vec::with_capacity(saved.snapshots.len());
        for (idx, snap) in saved.snapshots.into_iter().enumerate() {
            if snap.version != idx + 1 {
                return Err(ModelError::Corrupt(format!(
                    "snapshot at position {} is numbered {}",
                    idx + 1,
                    snap.version
                )));
            }
            if fingerprint(&snap.model) != snap.fingerprint {
                return Err(ModelError::Corrupt(format!(
                    "version {} does not match its fingerprint",
                    snap.version
                )));
            }
            let violations = validate(&snap.model, &snap.allowed_columns);
            if !violations.is_empty() {
                return Err(ModelError::Corrupt(format!(
                    "version {} no longer validates: {}",
                    snap.version, violations[0]
                )));
            }
            snapshots.push(Snapshot {
                version: snap.version,
                accepted_at: snap.accepted_at,
                fingerprint: snap.fingerprint,
                allowed_columns: snap.allowed_columns,
                model: snap.model,
            });
        }

        Ok(Self { snapshots })
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), versions = self.len(), "History saved");
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Node, Property};
    use crate::validation::accept;

    fn accepted(label: &str) -> ValidatedModel {
        let model = DataModel::new(
            vec![Node::new(label, vec![Property::new("id", "id", "str").unique()])],
            vec![],
        )
        .unwrap();
        accept(model, &AllowedColumns::flat(["id"])).unwrap()
    }

    fn history_of(labels: &[&str]) -> ModelHistory {
        let mut history = ModelHistory::new();
        for label in labels {
            history.append(accepted(label));
        }
        history
    }

    fn first_label(snapshot: &Snapshot) -> &str {
        snapshot.model().nodes()[0].label()
    }

    #[test]
    fn append_returns_increasing_versions() {
        let mut history = ModelHistory::new();
        assert_eq!(history.append(accepted("A")), 1);
        assert_eq!(history.append(accepted("B")), 2);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn positive_and_negative_indexing() {
        let history = history_of(&["A", "B", "C"]);
        assert_eq!(first_label(history.get(1).unwrap()), "A");
        assert_eq!(first_label(history.get(3).unwrap()), "C");
        assert_eq!(first_label(history.get(-1).unwrap()), "C");
        assert_eq!(first_label(history.get(-3).unwrap()), "A");
        assert_eq!(first_label(history.current().unwrap()), "C");
        assert_eq!(history.get(-2).unwrap().version(), 2);
    }

    #[test]
    fn out_of_range_versions_are_errors() {
        let history = history_of(&["A", "B"]);
        for version in [0, 3, -3, i64::MIN, i64::MAX] {
            let err = history.get(version).unwrap_err();
            assert!(
                matches!(err, ModelError::VersionOutOfRange { len: 2, .. }),
                "version {version}: {err}"
            );
        }
        assert!(ModelHistory::new().current().is_err());
    }

    #[test]
    fn structured_document_of_a_version() {
        let history = history_of(&["A", "B"]);
        let doc = history.to_structured_document(1).unwrap();
        assert_eq!(doc.nodes[0].label, "A");
        assert_eq!(doc.nodes[0].properties[0].name, "id");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/history.json");
        let history = history_of(&["A", "B"]);
        history.save_json(&path).unwrap();

        let loaded = ModelHistory::load_json(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(2).unwrap(), history.get(2).unwrap());
    }

    #[test]
    fn saved_snapshot_must_still_validate() {
        let history = history_of(&["A"]);
        let mut saved: serde_json::Value = serde_json::from_str(&history.to_json().unwrap()).unwrap();
        saved["snapshots"][0]["allowed_columns"] = serde_json::json!(["other"]);

        let err = ModelHistory::from_json(&saved.to_string()).unwrap_err();
        match err {
            ModelError::Corrupt(reason) => assert!(reason.contains("no longer validates"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tampered_history_is_rejected() {
        let history = history_of(&["A"]);
        let json = history.to_json().unwrap().replace("\"A\"", "\"Z\"");
        let err = ModelHistory::from_json(&json).unwrap_err();
        assert!(matches!(err, ModelError::Corrupt(_)), "{err}");
    }
}
