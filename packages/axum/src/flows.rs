//! Per-verb request flows over a [`Storage`] backend.
//!
//! Each flow parses the request (where it has a body), calls one storage
//! operation, and sends the result through a [`Sender`]. Any failure along
//! the way, from a bad content type to a missing row, is sent as an error
//! document with its own status.
//!
//! | Flow | Verb | Storage call | Success |
//! |------|------|--------------|---------|
//! | [`create`] | `POST` | `create` | 201 (or the object's accepted status) |
//! | [`get`] | `GET` | `get` | 200 |
//! | [`list`] | `GET` | `list` | 200, `"data": []` when empty |
//! | [`update`] | `PATCH` | `update` | 200 (or the object's accepted status) |
//! | [`delete`] | `DELETE` | `delete` | 204, no body |
//! | [`action`] | `GET` | caller's callback | 200 |
//!
//! Routes are left to the application; see the crate docs for an example.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, State};
use resdoc::{Config, Document, ErrorObject, Payload, ResourceObject, Sender, Verb};

use crate::extract::JsonApiRequest;
use crate::response::JsonApiResponse;
use crate::storage::{Storage, StorageError};

/// Shared state for the flows of one resource type.
#[derive(Clone)]
pub struct ResourceState {
    pub resource_type: String,
    pub storage: Arc<dyn Storage>,
    pub config: Config,
}

impl ResourceState {
    /// State using the process-wide [`Config::global`].
    pub fn new(resource_type: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        Self {
            resource_type: resource_type.into(),
            storage,
            config: Config::global().clone(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    fn sender(&self) -> Sender {
        Sender::new(self.config.clone())
    }

    fn check_type(&self, object: &ResourceObject) -> resdoc::Result<()> {
        if object.resource_type != self.resource_type {
            return Err(ErrorObject::new(
                409,
                "Conflict",
                format!(
                    "Resource type '{}' does not match endpoint type '{}'",
                    object.resource_type, self.resource_type
                ),
            )
            .into());
        }
        Ok(())
    }

    fn reply<P: Into<Payload>>(&self, verb: &Verb, result: resdoc::Result<P>) -> JsonApiResponse {
        let sender = self.sender();
        match result {
            Ok(payload) => sender.send(verb, payload).into(),
            Err(e) => sender.send(verb, e).into(),
        }
    }
}

/// `POST /{type}`: store a new object.
pub async fn create(State(state): State<ResourceState>, request: JsonApiRequest) -> JsonApiResponse {
    let result = create_object(&state, &request).await;
    state.reply(&Verb::Create, result)
}

async fn create_object(
    state: &ResourceState,
    request: &JsonApiRequest,
) -> resdoc::Result<ResourceObject> {
    let object = request.object(&state.config)?;
    state.check_type(&object)?;
    let created = state.storage.create(object).await?;
    tracing::info!("flows: created {} {}", state.resource_type, created.id);
    Ok(created)
}

/// `GET /{type}/{id}`: fetch one object.
pub async fn get(State(state): State<ResourceState>, Path(id): Path<String>) -> JsonApiResponse {
    let result = state.storage.get(&id).await.map_err(resdoc::Error::from);
    state.reply(&Verb::Read, result)
}

/// `GET /{type}`: fetch every object.
pub async fn list(State(state): State<ResourceState>) -> JsonApiResponse {
    let result = state.storage.list().await.map_err(resdoc::Error::from);
    state.reply(&Verb::Read, result)
}

/// `PATCH /{type}/{id}`: replace an object.
///
/// The body's id must match the path id; a mismatch is rejected with a 422
/// before storage is touched.
pub async fn update(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    request: JsonApiRequest,
) -> JsonApiResponse {
    let result = update_object(&state, &id, &request).await;
    state.reply(&Verb::Update, result)
}

async fn update_object(
    state: &ResourceState,
    id: &str,
    request: &JsonApiRequest,
) -> resdoc::Result<ResourceObject> {
    let object = request.object(&state.config)?;
    object.check_id(id)?;
    state.check_type(&object)?;
    let updated = state.storage.update(object).await?;
    tracing::info!("flows: updated {} {}", state.resource_type, updated.id);
    Ok(updated)
}

/// `DELETE /{type}/{id}`: remove an object, replying 204 with no body.
pub async fn delete(State(state): State<ResourceState>, Path(id): Path<String>) -> JsonApiResponse {
    match state.storage.delete(&id).await {
        Ok(()) => {
            tracing::info!("flows: deleted {} {id}", state.resource_type);
            state
                .sender()
                .send_document(&Verb::Delete, Document::empty(204))
                .into()
        }
        Err(e) => state
            .sender()
            .send(&Verb::Delete, resdoc::Error::from(e))
            .into(),
    }
}

/// `GET /{type}/{id}/{action}`: a custom action on one object.
///
/// `run` receives the storage and the path id and answers like a fetch. Bind
/// one action per route:
///
/// ```ignore
/// Router::new().route(
///     "/user/{id}/archive",
///     get(|state: State<ResourceState>, id: Path<String>| flows::action(state, id, archive)),
/// )
/// ```
pub async fn action<F, Fut>(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    run: F,
) -> JsonApiResponse
where
    F: FnOnce(Arc<dyn Storage>, String) -> Fut,
    Fut: Future<Output = Result<ResourceObject, StorageError>>,
{
    let result = run(Arc::clone(&state.storage), id)
        .await
        .map_err(resdoc::Error::from);
    state.reply(&Verb::Read, result)
}
