//! axum integration for [`resdoc`].
//!
//! Provides the pieces an axum application needs to speak JSON:API over a
//! storage backend, without deciding its routes:
//!
//! | Item | Role |
//! |------|------|
//! | [`JsonApiRequest`] | Extractor: method, content type, and size-capped body |
//! | [`JsonApiResponse`] | `IntoResponse` wrapper around a [`resdoc::Sender`] reply |
//! | [`Storage`] | Five-operation persistence collaborator |
//! | [`MemoryStorage`] | In-memory [`Storage`] for tests and demos |
//! | [`flows`] | Per-verb handlers: parse, call storage, send |
//!
//! ```rust,ignore
//! use axum::{routing::get, Router};
//! use resdoc_axum::{flows, MemoryStorage, ResourceState};
//!
//! let state = ResourceState::new("user", Arc::new(MemoryStorage::new("user")));
//! let app = Router::new()
//!     .route("/user", get(flows::list).post(flows::create))
//!     .route("/user/{id}", get(flows::get).patch(flows::update).delete(flows::delete))
//!     .with_state(state);
//! ```

pub mod extract;
pub mod flows;
pub mod response;
pub mod storage;

pub use extract::JsonApiRequest;
pub use flows::ResourceState;
pub use response::JsonApiResponse;
pub use storage::{memory::MemoryStorage, Storage, StorageError};
