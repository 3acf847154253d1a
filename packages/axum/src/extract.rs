//! The request extractor used by the [flows](crate::flows).

use axum::body::Bytes;
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use http_body_util::LengthLimitError;
use resdoc::{Config, ErrorObject, Parser, ResourceObject, Sender, Verb};

use crate::flows::ResourceState;
use crate::response::JsonApiResponse;

/// An inbound JSON:API request body, read up to the configured size cap.
///
/// Nothing is decoded at extraction time; call [`JsonApiRequest::object`] or
/// [`JsonApiRequest::collection`] to parse and validate. Bodies over
/// `max_payload_bytes` are rejected with a 413 error document.
#[derive(Debug, Clone)]
pub struct JsonApiRequest {
    verb: Verb,
    content_type: Option<String>,
    body: Bytes,
}

impl JsonApiRequest {
    pub fn new(verb: Verb, content_type: Option<String>, body: Bytes) -> Self {
        Self {
            verb,
            content_type,
            body,
        }
    }

    /// The verb derived from the request method.
    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn parser(&self, config: &Config) -> Parser {
        Parser::new(self.verb.clone(), self.content_type(), config.clone())
    }

    /// Parse the body as a single resource object.
    pub fn object(&self, config: &Config) -> resdoc::Result<ResourceObject> {
        self.parser(config).object(self.body.as_ref())
    }

    /// Parse the body as a sequence of resource objects.
    pub fn collection(&self, config: &Config) -> resdoc::Result<Vec<ResourceObject>> {
        self.parser(config).collection(self.body.as_ref())
    }
}

impl<S> FromRequest<S> for JsonApiRequest
where
    S: Send + Sync,
    ResourceState: FromRef<S>,
{
    type Rejection = JsonApiResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let config = ResourceState::from_ref(state).config;
        let verb = Verb::from(req.method());
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let limit = config.max_payload_bytes;
        let body = axum::body::to_bytes(req.into_body(), limit)
            .await
            .map_err(|e| {
                let error = if e.into_inner().is::<LengthLimitError>() {
                    tracing::warn!("extract: {verb} body exceeds the {limit} byte cap");
                    ErrorObject::payload_too_large(limit)
                } else {
                    ErrorObject::internal_with(&config, "unable to read request body")
                };
                JsonApiResponse::from(Sender::new(config.clone()).send(&verb, error))
            })?;

        Ok(Self::new(verb, content_type, body))
    }
}
