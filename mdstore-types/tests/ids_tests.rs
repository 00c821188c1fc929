use mdstore_types::LocalId;
use std::collections::HashSet;
use std::str::FromStr;

// ── LocalId ───────────────────────────────────────────────────────

#[test]
fn local_id_new_is_unique() {
    let a = LocalId::new();
    let b = LocalId::new();
    assert_ne!(a, b);
}

#[test]
fn local_id_many_are_distinct() {
    let ids: HashSet<_> = (0..1000).map(|_| LocalId::new()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn local_id_converts_to_and_from_uuid() {
    let uuid = uuid::Uuid::now_v7();
    let id = LocalId::from(uuid);
    assert_eq!(uuid::Uuid::from(id), uuid);
}

#[test]
fn local_id_carries_creation_time() {
    let before = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64;
    let created = LocalId::new().created_at_ms().unwrap();
    assert!(created + 1 >= before);
    assert!(created <= before + 60_000);
}

#[test]
fn echoed_non_v7_lid_has_no_creation_time() {
    let id = LocalId::from(uuid::Uuid::new_v4());
    assert_eq!(id.created_at_ms(), None);
}

#[test]
fn local_id_display_and_parse() {
    let id = LocalId::new();
    let parsed = LocalId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn local_id_from_str() {
    let id = LocalId::new();
    let parsed = LocalId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn local_id_parse_invalid() {
    let err = LocalId::parse("not-a-uuid").unwrap_err();
    assert!(err.to_string().starts_with("invalid UUID"));
}

#[test]
fn local_id_is_time_ordered() {
    let a = LocalId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = LocalId::new();
    assert!(a < b);
}

#[test]
fn local_id_serializes_as_plain_string() {
    let id = LocalId::new();
    let json = serde_json::to_value(id).unwrap();
    assert_eq!(json, serde_json::Value::String(id.to_string()));
}
