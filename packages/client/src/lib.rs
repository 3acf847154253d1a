//! HTTP client for JSON:API services.
//!
//! [`Client`] builds `/{type}[/{id}[/{action}]]` URLs under a base URL,
//! sends request documents validated on the request path, and decodes
//! replies with a response-path [`Parser`].
//!
//! ```rust,ignore
//! let client = resdoc_client::Client::new("http://localhost:3000");
//! let user = ResourceObject::new("user", "", &json!({"name": "Ann"}))?;
//! let reply = client.post(&user).await?;
//! assert_eq!(reply.status, 201);
//! ```

use resdoc::{Config, Document, ErrorObject, Parser, ResourceObject, Verb};
use thiserror::Error;
use urlencoding::encode;

/// Errors raised while talking to a JSON:API service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A request document failed validation, or a reply could not be parsed.
    #[error(transparent)]
    Document(#[from] resdoc::Error),
}

/// A decoded reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    /// `None` for replies without a body (e.g. 204 after a delete).
    pub document: Option<Document>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The reply's document, or its errors as `Err` when it is an error
    /// document.
    pub fn into_result(self) -> Result<Option<Document>, resdoc::Error> {
        match self.document {
            Some(document) if document.has_errors() => Err(document.errors.into()),
            other => Ok(other),
        }
    }
}

/// A JSON:API client bound to one service.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    config: Config,
}

impl Client {
    /// A client for the service at `base_url`, using [`Config::global`].
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            config: Config::global().clone(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use a preconfigured `reqwest` client (timeouts, proxies, TLS).
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/{segment}/...`, each segment percent-encoded.
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&encode(segment));
        }
        url
    }

    /// `GET /{type}/{id}`
    pub async fn get(&self, resource_type: &str, id: &str) -> Result<Reply, ClientError> {
        let request = self.http.get(self.url(&[resource_type, id]));
        self.execute(&Verb::Read, request).await
    }

    /// `GET /{type}`
    pub async fn list(&self, resource_type: &str) -> Result<Reply, ClientError> {
        let request = self.http.get(self.url(&[resource_type]));
        self.execute(&Verb::Read, request).await
    }

    /// `POST /{type}` with `object` as a single-object document. The id may
    /// be empty.
    pub async fn post(&self, object: &ResourceObject) -> Result<Reply, ClientError> {
        let body = self.request_body(&Verb::Create, object)?;
        let request = self.http.post(self.url(&[&object.resource_type])).body(body);
        self.execute(&Verb::Create, request).await
    }

    /// `PATCH /{type}/{id}` with `object` as a single-object document.
    pub async fn patch(&self, object: &ResourceObject) -> Result<Reply, ClientError> {
        let body = self.request_body(&Verb::Update, object)?;
        let url = self.url(&[&object.resource_type, &object.id]);
        let request = self.http.patch(url).body(body);
        self.execute(&Verb::Update, request).await
    }

    /// `DELETE /{type}/{id}`
    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<Reply, ClientError> {
        let request = self.http.delete(self.url(&[resource_type, id]));
        self.execute(&Verb::Delete, request).await
    }

    /// `GET /{type}/{id}/{action}`: a custom action on one resource.
    pub async fn action(
        &self,
        resource_type: &str,
        id: &str,
        action: &str,
    ) -> Result<Reply, ClientError> {
        if id.is_empty() || action.is_empty() {
            return Err(resdoc::Error::from(ErrorObject::specification(
                "Both an id and an action are required for a custom action",
            ))
            .into());
        }
        let request = self.http.get(self.url(&[resource_type, id, action]));
        self.execute(&Verb::Read, request).await
    }

    fn request_body(&self, verb: &Verb, object: &ResourceObject) -> Result<Vec<u8>, ClientError> {
        let mut document = Document::new();
        document.add_object(object.clone())?;
        document.validate(verb, false)?;
        document.jsonapi = self.config.include_version.then(resdoc::JsonApi::current);

        serde_json::to_vec(&document).map_err(|e| {
            let error = ErrorObject::internal_with(
                &self.config,
                format!("unable to encode request document: {e}"),
            );
            ClientError::Document(error.into())
        })
    }

    async fn execute(
        &self,
        verb: &Verb,
        request: reqwest::RequestBuilder,
    ) -> Result<Reply, ClientError> {
        let response = request
            .header(reqwest::header::CONTENT_TYPE, resdoc::CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, resdoc::CONTENT_TYPE)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;
        tracing::debug!("client: {verb} replied {status} with {} bytes", body.len());

        if body.is_empty() {
            return Ok(Reply {
                status,
                document: None,
            });
        }

        let parser =
            Parser::for_response(verb.clone(), content_type.as_deref(), self.config.clone());
        let document = parser.document(body.as_ref())?;
        Ok(Reply {
            status,
            document: Some(document),
        })
    }
}
