//! Converting [`resdoc::Sender`] replies into axum responses.

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;

/// A fully formed JSON:API reply, as produced by [`resdoc::Sender`].
#[derive(Debug)]
pub struct JsonApiResponse(pub Response<Vec<u8>>);

impl JsonApiResponse {
    pub fn status(&self) -> StatusCode {
        self.0.status()
    }
}

impl From<Response<Vec<u8>>> for JsonApiResponse {
    fn from(response: Response<Vec<u8>>) -> Self {
        Self(response)
    }
}

impl IntoResponse for JsonApiResponse {
    fn into_response(self) -> axum::response::Response {
        self.0.map(Body::from)
    }
}
