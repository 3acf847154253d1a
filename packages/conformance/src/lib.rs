//! Shared helpers for the resdoc conformance test suite.
//!
//! Provides [`spawn_server`]: binds a `TcpListener` on an ephemeral port,
//! serves the five resource flows and an `archive` action for one type over
//! `MemoryStorage`, and returns both the base URL and the storage so tests
//! can seed or inspect data without going through HTTP.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use resdoc::{Config, ResourceObject};
use resdoc_axum::{flows, MemoryStorage, ResourceState, Storage, StorageError};

/// Start an ephemeral in-process server for `resource_type` with default
/// configuration and return `(base_url, storage)`.
///
/// Routes:
///
/// | Path | Methods |
/// |------|---------|
/// | `/{type}` | `GET` (list), `POST` (create) |
/// | `/{type}/{id}` | `GET`, `PATCH`, `DELETE` |
/// | `/{type}/{id}/archive` | `GET` (sets `meta.archived`) |
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the server fails to start.
pub async fn spawn_server(resource_type: &str) -> (String, Arc<MemoryStorage>) {
    spawn_server_with_config(resource_type, Config::default()).await
}

/// As [`spawn_server`], with an explicit server configuration.
pub async fn spawn_server_with_config(
    resource_type: &str,
    config: Config,
) -> (String, Arc<MemoryStorage>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let mem_storage = Arc::new(MemoryStorage::new(resource_type));
    let storage: Arc<dyn Storage> = Arc::clone(&mem_storage) as Arc<dyn Storage>;
    let state = ResourceState::new(resource_type, storage).with_config(config);

    let router = Router::new()
        .route(&format!("/{resource_type}"), get(flows::list).post(flows::create))
        .route(
            &format!("/{resource_type}/{{id}}"),
            get(flows::get).patch(flows::update).delete(flows::delete),
        )
        .route(
            &format!("/{resource_type}/{{id}}/archive"),
            get(|state: State<ResourceState>, id: Path<String>| flows::action(state, id, archive)),
        )
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance server error");
    });

    (base_url, mem_storage)
}

/// Mark a stored object archived in its `meta`.
async fn archive(storage: Arc<dyn Storage>, id: String) -> Result<ResourceObject, StorageError> {
    let mut object = storage.get(&id).await?;
    object.meta = Some(serde_json::json!({ "archived": true }));
    storage.update(object).await
}
