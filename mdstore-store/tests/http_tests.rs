use mdstore_model::ModelKind;
use mdstore_store::{HttpTransport, PullOptions, Query, Store, StoreError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> Store {
    Store::builder(HttpTransport::new(server.uri())).build().unwrap()
}

// ── URL handling ────────────────────────────────────────────────

#[test]
fn relative_urls_join_base() {
    let transport = HttpTransport::new("http://api.test/v1/");
    assert_eq!(transport.base_url(), "http://api.test/v1/");
    assert_eq!(transport.url_for("/user"), "http://api.test/v1/user");
    assert_eq!(transport.url_for("user"), "http://api.test/v1/user");
}

#[test]
fn absolute_urls_pass_through() {
    let transport = HttpTransport::new("http://api.test");
    assert_eq!(transport.url_for("https://other.test/x"), "https://other.test/x");
}

// ── GET ─────────────────────────────────────────────────────────

#[tokio::test]
async fn pull_by_ids_sends_positional_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(query_param("0", "idabc"))
        .and(query_param("1", "idxyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "idabc", "name": "A"},
            {"id": "idxyz", "name": "B"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let user = store
        .factory()
        .register(ModelKind::builder("User").props(["name"]).cache(true).build().unwrap())
        .unwrap();

    let users = store
        .pull(&user, "/user", Query::ids(["idabc", "idxyz"]), &PullOptions::default())
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].get_str("name").as_deref(), Some("B"));
}

#[tokio::test]
async fn filter_sends_named_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(query_param("name", "Test"))
        .and(query_param("age", "111"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let out = store
        .get("/user", Query::filter(json!({"name": "Test", "age": 111})), None)
        .await
        .unwrap();
    assert_eq!(out, json!({"ok": true}));
}

#[tokio::test]
async fn content_type_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let out = store_for(&server).get("/ping", json!({}), None).await.unwrap();
    assert_eq!(out, json!("pong"));
}

// ── POST / DELETE ───────────────────────────────────────────────

#[tokio::test]
async fn post_sends_dereferenced_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/comment"))
        .and(body_json(json!({"text": "hi", "author": "u1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "c1"})))
        .expect(1)
        .mount(&server)
        .await;

    let out = store_for(&server)
        .post("/comment", json!({"text": "hi", "author": {"id": "u1", "name": "Foo"}}), None)
        .await
        .unwrap();
    assert_eq!(out, json!({"id": "c1"}));
}

#[tokio::test]
async fn delete_sends_data_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/user"))
        .and(query_param("id", "u1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let out = store_for(&server)
        .destroy("/user", json!({"id": "u1"}), None)
        .await
        .unwrap();
    assert_eq!(out, Value::Null);
}

// ── Errors ──────────────────────────────────────────────────────

#[tokio::test]
async fn non_success_status_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let err = store_for(&server).get("/user", json!({}), None).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(matches!(err, StoreError::Status { ref body, .. } if body == "not here"));
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let store = Store::builder(HttpTransport::new("http://127.0.0.1:9")).build().unwrap();
    let err = store.get("/user", json!({}), None).await.unwrap_err();
    assert!(matches!(err, StoreError::Http(_)));
}
