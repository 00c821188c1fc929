use mdstore_types::{server_id, IdentityKey, LocalId};
use proptest::prelude::*;
use serde_json::json;

// ── Server keys ───────────────────────────────────────────────────

#[test]
fn string_id_is_used_verbatim() {
    assert_eq!(
        IdentityKey::from_server_value(&json!("123")),
        Some(IdentityKey::Server("123".into()))
    );
}

#[test]
fn numeric_and_string_ids_share_a_key() {
    assert_eq!(
        IdentityKey::from_server_value(&json!(123)),
        IdentityKey::from_server_value(&json!("123"))
    );
}

#[test]
fn non_identities_are_rejected() {
    for value in [json!(null), json!(""), json!(true), json!([1]), json!({"id": 1})] {
        assert_eq!(IdentityKey::from_server_value(&value), None, "{value}");
    }
}

#[test]
fn server_id_helper_matches_key() {
    assert_eq!(server_id(&json!(7)), Some("7".to_string()));
    assert_eq!(server_id(&json!(null)), None);
}

// ── Local keys ────────────────────────────────────────────────────

#[test]
fn local_key_parses_lid_string() {
    let lid = LocalId::new();
    assert_eq!(
        IdentityKey::from_local_value(&json!(lid.to_string())),
        Some(IdentityKey::Local(lid))
    );
}

#[test]
fn local_key_rejects_garbage() {
    assert_eq!(IdentityKey::from_local_value(&json!("lid-1")), None);
    assert_eq!(IdentityKey::from_local_value(&json!(5)), None);
}

#[test]
fn key_kind_and_display() {
    let lid = LocalId::new();
    let local = IdentityKey::from(lid);
    assert!(!local.is_server());
    assert_eq!(local.to_string(), format!("lid:{lid}"));

    let server = IdentityKey::Server("u1".into());
    assert!(server.is_server());
    assert_eq!(server.to_string(), "id:u1");
}

proptest! {
    #[test]
    fn integer_ids_normalise_like_their_string_form(n in any::<i64>()) {
        prop_assert_eq!(
            IdentityKey::from_server_value(&json!(n)),
            IdentityKey::from_server_value(&json!(n.to_string()))
        );
    }

    #[test]
    fn non_empty_strings_are_always_identities(s in ".{1,32}") {
        prop_assert_eq!(
            IdentityKey::from_server_value(&json!(s.clone())),
            Some(IdentityKey::Server(s))
        );
    }
}
