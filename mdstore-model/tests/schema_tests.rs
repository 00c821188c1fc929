use mdstore_model::{KindSchema, ModelError, ModelKind, Parser, DEFAULT_KEY_ID, DEFAULT_LID_FIELD};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// ── Builder ──────────────────────────────────────────────────────

#[test]
fn builder_defaults() {
    let kind = ModelKind::builder("User").props(["name", "age"]).build().unwrap();
    assert_eq!(kind.name(), "User");
    assert_eq!(kind.props(), ["name".to_string(), "age".to_string()]);
    assert_eq!(kind.key_id(), DEFAULT_KEY_ID);
    assert_eq!(kind.lid_field(), DEFAULT_LID_FIELD);
    assert!(!kind.is_cached());
}

#[test]
fn props_keep_declaration_order() {
    let kind = ModelKind::builder("Note")
        .prop("title")
        .props(["body", "author"])
        .build()
        .unwrap();
    assert_eq!(kind.props(), ["title", "body", "author"].map(String::from));
    assert!(kind.has_prop("body"));
    assert!(!kind.has_prop("id"));
}

#[test]
fn custom_identity_fields() {
    let kind = ModelKind::builder("Doc")
        .prop("title")
        .key_id("_id")
        .lid_field("_lid")
        .cache(true)
        .build()
        .unwrap();
    assert_eq!(kind.key_id(), "_id");
    assert_eq!(kind.lid_field(), "_lid");
    assert!(kind.is_cached());
}

#[test]
fn defaults_fill_missing_props() {
    let kind = ModelKind::builder("User")
        .props(["name", "age"])
        .default_value("age", json!(0))
        .build()
        .unwrap();
    assert_eq!(kind.default_for("age"), json!(0));
    assert_eq!(kind.default_for("name"), Value::Null);
}

#[test]
fn named_parsers_are_resolvable() {
    let kind = ModelKind::builder("Note")
        .prop("title")
        .parser("unwrap", |raw: Value| raw["wrap"].clone())
        .build()
        .unwrap();
    let parser = kind.parser("unwrap").unwrap();
    assert_eq!(parser.parse(json!({"wrap": {"title": "x"}})), json!({"title": "x"}));
    assert!(kind.parser("missing").is_none());
}

#[test]
fn debug_lists_parser_names() {
    let kind = ModelKind::builder("Note")
        .prop("title")
        .parser("b", |raw: Value| raw)
        .parser("a", |raw: Value| raw)
        .build()
        .unwrap();
    let debug = format!("{kind:?}");
    assert!(debug.contains("[\"a\", \"b\"]"), "{debug}");
}

// ── Validation ───────────────────────────────────────────────────

fn invalid(result: Result<ModelKind, ModelError>) -> String {
    match result {
        Err(ModelError::InvalidKind(msg)) => msg,
        other => panic!("expected InvalidKind, got {other:?}"),
    }
}

#[test]
fn empty_name_is_rejected() {
    invalid(ModelKind::builder("  ").prop("a").build());
}

#[test]
fn duplicate_prop_is_rejected() {
    let msg = invalid(ModelKind::builder("User").props(["name", "name"]).build());
    assert!(msg.contains("declared twice"));
}

#[test]
fn prop_shadowing_identity_is_rejected() {
    invalid(ModelKind::builder("User").props(["id", "name"]).build());
    invalid(ModelKind::builder("User").props(["lid"]).build());
}

#[test]
fn same_key_and_lid_field_is_rejected() {
    invalid(ModelKind::builder("User").key_id("k").lid_field("k").build());
}

#[test]
fn default_for_undeclared_prop_is_rejected() {
    let msg = invalid(
        ModelKind::builder("User")
            .prop("name")
            .default_value("age", json!(1))
            .build(),
    );
    assert!(msg.contains("age"));
}

// ── KindSchema ───────────────────────────────────────────────────

#[test]
fn schema_from_json_uses_field_defaults() {
    let schema: KindSchema = serde_json::from_str(r#"{"name": "User", "props": ["name"]}"#).unwrap();
    assert_eq!(schema, KindSchema::new("User", ["name"]));

    let kind = ModelKind::from_schema(schema).unwrap();
    assert_eq!(kind.key_id(), "id");
    assert!(!kind.is_cached());
}

#[test]
fn schema_from_json_with_everything() {
    let json = r#"{
        "name": "Task",
        "props": ["title", "done"],
        "key_id": "uuid",
        "cache": true,
        "defaults": {"done": false}
    }"#;
    let kind = ModelKind::from_schema(serde_json::from_str(json).unwrap()).unwrap();
    assert_eq!(kind.key_id(), "uuid");
    assert_eq!(kind.lid_field(), "lid");
    assert!(kind.is_cached());
    assert_eq!(kind.default_for("done"), json!(false));
}

#[test]
fn schema_serialization_skips_empty_defaults() {
    let json = serde_json::to_value(KindSchema::new("User", ["name"])).unwrap();
    assert!(json.get("defaults").is_none());
    assert_eq!(json["cache"], json!(false));
}

#[test]
fn from_schema_validates() {
    let schema = KindSchema::new("User", ["name", "name"]);
    assert!(matches!(ModelKind::from_schema(schema), Err(ModelError::InvalidKind(_))));
}
