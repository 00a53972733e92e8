//! Model construction, validation and history from the public API only.

use runway_core::diagram::{from_diagram, to_diagram};
use runway_core::{
    accept, validate, AllowedColumns, ConstructionIssue, DataModel, ModelDocument, ModelError,
    ModelHistory, SchemaViolation,
};

const PETS_JSON: &str = r#"{
    "nodes": [
        {"label": "Person", "properties": [
            {"name": "name", "csv_mapping": "first_name", "type": "str", "is_unique": true},
            {"name": "age", "csv_mapping": "age", "type": "int"}
        ]},
        {"label": "Pet", "properties": [
            {"name": "name", "csv_mapping": "pet_name", "is_unique": true}
        ]}
    ],
    "relationships": [
        {"type": "HAS_PET", "source": "Person", "target": "Pet"}
    ]
}"#;

fn pets_model() -> DataModel {
    serde_json::from_str(PETS_JSON).unwrap()
}

#[test]
fn valid_model_accepts_any_column_superset() {
    let model = pets_model();
    let exact = AllowedColumns::flat(["first_name", "age", "pet_name"]);
    let wider = AllowedColumns::flat(["first_name", "age", "pet_name", "owner_since", "breed"]);
    assert!(validate(&model, &exact).is_empty());
    assert!(validate(&model, &wider).is_empty());
}

#[test]
fn every_unmapped_column_is_named() {
    let violations = validate(&pets_model(), &AllowedColumns::flat(["pet_name"]));
    let names: Vec<String> = violations.iter().map(ToString::to_string).collect();
    assert!(names.iter().any(|v| v.contains("first_name")), "{names:?}");
    assert!(names.iter().any(|v| v.contains("`age`")), "{names:?}");
    // Missing unique columns are reported under both kinds.
    assert_eq!(
        violations
            .iter()
            .filter(|v| matches!(v, SchemaViolation::UniquePropertyColumnMissing { .. }))
            .count(),
        1
    );
    assert_eq!(violations.len(), 3);
}

#[test]
fn untyped_input_cannot_bypass_construction() {
    let json = r#"{"nodes": [{"label": "Person", "properties": []}],
                   "relationships": [{"type": "KNOWS", "source": "Person", "target": ""}]}"#;
    let err = serde_json::from_str::<DataModel>(json).unwrap_err();
    assert!(err.to_string().contains("KNOWS"), "{err}");

    let doc = ModelDocument::from_json(json).unwrap();
    match DataModel::from_document(&doc).unwrap_err() {
        ModelError::Construction(issues) => assert_eq!(
            issues,
            vec![ConstructionIssue::MissingEndpoint {
                rel_type: "KNOWS".to_string()
            }]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn history_is_one_indexed_from_both_ends() {
    let columns = AllowedColumns::flat(["first_name", "age", "pet_name", "nickname"]);
    let mut history = ModelHistory::new();
    history.append(accept(pets_model(), &columns).unwrap());

    let mut doc = pets_model().to_document();
    doc.nodes[1].properties[0].csv_mapping = "nickname".to_string();
    history.append(accept(DataModel::from_document(&doc).unwrap(), &columns).unwrap());

    assert_eq!(history.get(1).unwrap().model(), &pets_model());
    assert_eq!(history.get(-2).unwrap().version(), 1);
    assert_eq!(history.get(-1).unwrap().to_document(), doc);
    assert_ne!(history.get(1).unwrap().fingerprint(), history.get(2).unwrap().fingerprint());

    for bad in [0, 3, -3] {
        assert!(matches!(
            history.get(bad),
            Err(ModelError::VersionOutOfRange { len: 2, .. })
        ));
    }
}

#[test]
fn structured_document_round_trips() {
    let model = pets_model();
    let json = model.to_document().to_json_pretty().unwrap();
    let back = DataModel::from_document(&ModelDocument::from_json(&json).unwrap()).unwrap();
    assert_eq!(back, model);
    assert_eq!(serde_json::to_string(&back).unwrap(), serde_json::to_string(&model).unwrap());
}

#[test]
fn diagram_round_trips() {
    let model = pets_model();
    assert_eq!(from_diagram(&to_diagram(&model)).unwrap(), model);
}

#[test]
fn persisted_history_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    let mut history = ModelHistory::new();
    history.append(accept(pets_model(), &AllowedColumns::flat(["first_name", "age", "pet_name"])).unwrap());
    history.save_json(&path).unwrap();

    let loaded = ModelHistory::load_json(&path).unwrap();
    assert_eq!(loaded.current().unwrap(), history.current().unwrap());
}
