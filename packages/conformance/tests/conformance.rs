//! End-to-end conformance tests for resdoc servers and clients.
//!
//! Each test spawns an ephemeral in-process server (real TCP, real HTTP) via
//! [`resdoc_conformance::spawn_server`] and drives it either with
//! [`resdoc_client::Client`] or, where exact wire bytes matter, with a raw
//! `reqwest` client.
//!
//! # Coverage
//!
//! | Test | Behaviour |
//! |------|-----------|
//! | `create_without_id_is_assigned_and_returns_201` | exact created body |
//! | `empty_list_returns_empty_array` | `"data": []`, 200 |
//! | `patch_with_mismatched_id_returns_422` | id check before storage |
//! | `create_then_fetch_round_trips_attribute_bytes` | type, id, attribute bytes |
//! | `typed_attributes_unmarshal_and_validate` | typed decode + field checks |
//! | `update_replaces_object` | PATCH then GET |
//! | `delete_returns_204_without_body` | empty document |
//! | `action_replies_with_the_updated_object` | custom action via client |
//! | `action_on_unknown_id_returns_404` | action error path |
//! | `fetch_unknown_returns_404_error_document` | error document shape |
//! | `wrong_content_type_returns_406` | content-type check |
//! | `bulk_collection_without_ids_returns_422` | bulk-id rule |
//! | `oversized_body_returns_413` | payload cap |
//! | `undecodable_body_returns_generic_500` | private diagnostics |
//! | `version_member_can_be_disabled` | `include_version = false` |

use resdoc::{Checks, Config, FieldError, Mode, ResourceObject, Validate};
use resdoc_client::Client;
use resdoc_conformance::{spawn_server, spawn_server_with_config};
use resdoc_axum::Storage;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn raw_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}

async fn raw_post(url: &str, content_type: &str, body: &str) -> reqwest::Response {
    raw_client()
        .post(url)
        .header("content-type", content_type)
        .body(body.to_owned())
        .send()
        .await
        .unwrap()
}

fn user(id: &str, name: &str) -> ResourceObject {
    ResourceObject::new("user", id, &json!({ "name": name })).unwrap()
}

#[derive(Debug, Serialize, Deserialize)]
struct User {
    name: String,
    #[serde(default)]
    role: String,
}

impl Validate for User {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Checks::new()
            .required("name", &self.name)
            .max_len("name", &self.name, 16)
            .one_of("role", &self.role, &["admin", "member"])
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_without_id_is_assigned_and_returns_201() {
    let (base, _storage) = spawn_server("user").await;

    let resp = raw_post(
        &format!("{base}/user"),
        resdoc::CONTENT_TYPE,
        r#"{"data":{"type":"user","attributes":{"name":"Ann"}}}"#,
    )
    .await;

    assert_eq!(resp.status(), 201);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        resdoc::CONTENT_TYPE
    );
    assert_eq!(
        resp.text().await.unwrap(),
        r#"{"data":{"type":"user","id":"1","attributes":{"name":"Ann"}},"jsonapi":{"version":"1.1"}}"#
    );
}

#[tokio::test]
async fn empty_list_returns_empty_array() {
    let (base, _storage) = spawn_server("user").await;

    let resp = raw_client().get(format!("{base}/user")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], json!([]));

    let reply = Client::new(&base).list("user").await.unwrap();
    let document = reply.document.unwrap();
    assert_eq!(document.mode(), Mode::Collection);
    assert!(document.data.is_empty());
}

#[tokio::test]
async fn create_then_fetch_round_trips_attribute_bytes() {
    let (base, _storage) = spawn_server("user").await;
    let client = Client::new(&base);

    let original = ResourceObject::new("user", "", &json!({"name": "Ann", "tags": [1, 2]})).unwrap();
    let created = client.post(&original).await.unwrap();
    assert_eq!(created.status, 201);
    let id = created.document.unwrap().first().unwrap().id.clone();

    let fetched = client.get("user", &id).await.unwrap();
    assert_eq!(fetched.status, 200);
    let document = fetched.document.unwrap();
    let object = document.first().unwrap();
    assert_eq!(object.resource_type, "user");
    assert_eq!(object.id, id);
    assert_eq!(object.raw_attributes(), original.raw_attributes());
}

#[tokio::test]
async fn typed_attributes_unmarshal_and_validate() {
    let (base, storage) = spawn_server("user").await;
    storage
        .create(ResourceObject::new("user", "", &json!({"name": "Ann", "role": "admin"})).unwrap())
        .await
        .unwrap();
    storage
        .create(ResourceObject::new("user", "", &json!({"name": "", "role": "root"})).unwrap())
        .await
        .unwrap();

    let client = Client::new(&base);

    let reply = client.get("user", "1").await.unwrap();
    let document = reply.document.unwrap();
    let ann: User = document.first().unwrap().unmarshal("user").unwrap();
    assert_eq!(ann.name, "Ann");

    let reply = client.get("user", "2").await.unwrap();
    let document = reply.document.unwrap();
    let err = document.first().unwrap().unmarshal::<User>("user").unwrap_err();
    let errors = err.into_list();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.status == 422));
    assert_eq!(
        errors.first().unwrap().source_pointer.as_deref(),
        Some("/data/attributes/name")
    );
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn patch_with_mismatched_id_returns_422() {
    let (base, storage) = spawn_server("user").await;
    storage.create(user("6", "Ann")).await.unwrap();

    let resp = raw_client()
        .patch(format!("{base}/user/6"))
        .header("content-type", resdoc::CONTENT_TYPE)
        .body(r#"{"data":{"type":"user","id":"5","attributes":{"name":"Bob"}}}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["source"]["pointer"], "/data/attributes/id");

    let stored = storage.get("6").await.unwrap();
    assert_eq!(stored.raw_attributes(), Some(r#"{"name":"Ann"}"#));
}

#[tokio::test]
async fn update_replaces_object() {
    let (base, storage) = spawn_server("user").await;
    storage.create(user("5", "Ann")).await.unwrap();
    let client = Client::new(&base);

    let reply = client.patch(&user("5", "Annie")).await.unwrap();
    assert_eq!(reply.status, 200);

    let fetched = client.get("user", "5").await.unwrap();
    let document = fetched.document.unwrap();
    assert_eq!(
        document.first().unwrap().raw_attributes(),
        Some(r#"{"name":"Annie"}"#)
    );
}

#[tokio::test]
async fn delete_returns_204_without_body() {
    let (base, storage) = spawn_server("user").await;
    storage.create(user("3", "Ann")).await.unwrap();

    let reply = Client::new(&base).delete("user", "3").await.unwrap();
    assert_eq!(reply.status, 204);
    assert!(reply.document.is_none());
    assert!(storage.list().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn action_replies_with_the_updated_object() {
    let (base, storage) = spawn_server("user").await;
    storage.create(user("8", "Ann")).await.unwrap();

    let reply = Client::new(&base).action("user", "8", "archive").await.unwrap();
    assert_eq!(reply.status, 200);
    let document = reply.document.unwrap();
    let object = document.first().unwrap();
    assert_eq!(object.id, "8");
    assert_eq!(object.meta, Some(json!({ "archived": true })));
    assert_eq!(object.raw_attributes(), Some(r#"{"name":"Ann"}"#));

    let stored = storage.get("8").await.unwrap();
    assert_eq!(stored.meta, Some(json!({ "archived": true })));
}

#[tokio::test]
async fn action_on_unknown_id_returns_404() {
    let (base, _storage) = spawn_server("user").await;

    let reply = Client::new(&base).action("user", "8", "archive").await.unwrap();
    assert_eq!(reply.status, 404);
    assert_eq!(reply.into_result().unwrap_err().status(), 404);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_unknown_returns_404_error_document() {
    let (base, _storage) = spawn_server("user").await;

    let reply = Client::new(&base).get("user", "404").await.unwrap();
    assert_eq!(reply.status, 404);
    let err = reply.into_result().unwrap_err();
    let error = err.first().unwrap();
    assert_eq!(error.title, "Not Found");
    assert_eq!(error.status, 404);
}

#[tokio::test]
async fn wrong_content_type_returns_406() {
    let (base, _storage) = spawn_server("user").await;

    let resp = raw_post(
        &format!("{base}/user"),
        "application/json",
        r#"{"data":{"type":"user"}}"#,
    )
    .await;

    assert_eq!(resp.status(), 406);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["status"], "406");
    assert!(body["errors"][0]["detail"]
        .as_str()
        .unwrap()
        .contains("got: application/json"));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn bulk_collection_without_ids_returns_422() {
    let (base, storage) = spawn_server("user").await;

    let resp = raw_post(
        &format!("{base}/user"),
        resdoc::CONTENT_TYPE,
        r#"{"data":[{"type":"user","id":"1"},{"type":"user"}]}"#,
    )
    .await;

    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["source"]["pointer"], "/data/attributes/id");
    assert!(storage.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_body_returns_413() {
    let config = Config {
        max_payload_bytes: 32,
        ..Config::default()
    };
    let (base, _storage) = spawn_server_with_config("user", config).await;

    let name = "x".repeat(64);
    let body = format!(r#"{{"data":{{"type":"user","attributes":{{"name":"{name}"}}}}}}"#);
    let resp = raw_post(&format!("{base}/user"), resdoc::CONTENT_TYPE, &body).await;
    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn undecodable_body_returns_generic_500() {
    let (base, _storage) = spawn_server("user").await;

    let resp = raw_post(&format!("{base}/user"), resdoc::CONTENT_TYPE, "{not json").await;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["title"], Config::default().error_title);
    assert_eq!(body["errors"][0]["detail"], Config::default().error_detail);
}

#[tokio::test]
async fn version_member_can_be_disabled() {
    let config = Config {
        include_version: false,
        ..Config::default()
    };
    let (base, _storage) = spawn_server_with_config("user", config).await;

    let resp = raw_client().get(format!("{base}/user")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), r#"{"data":[]}"#);
}
