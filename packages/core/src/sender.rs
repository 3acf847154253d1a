//! Outbound serialisation.
//!
//! The [`Sender`] always produces a response. A payload or document that
//! fails validation is replaced by an error document describing the failure;
//! if even that cannot be built, a fixed 500 body is sent instead.

use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Response, StatusCode};

use crate::config::Config;
use crate::document::{Document, JsonApi, Mode, Payload};
use crate::error::{Error, ErrorList, ErrorObject};
use crate::object::Verb;

/// Builds validated `http` responses from payloads and documents.
#[derive(Debug, Clone, Default)]
pub struct Sender {
    config: Config,
}

impl Sender {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Prepare `payload` for `verb` and send it.
    ///
    /// Objects get their status resolved from the verb table; a preparation
    /// failure is sent as an error document instead.
    pub fn send(&self, verb: &Verb, payload: impl Into<Payload>) -> Response<Vec<u8>> {
        let mut payload = payload.into();
        if let Err(e) = payload.prepare(verb, true) {
            match self.degrade(verb, e) {
                Ok(fallback) => payload = fallback,
                Err(e) => return self.unrecoverable(&e),
            }
        }
        self.send_document(verb, Document::build(payload))
    }

    /// Validate `document` and serialise it, degrading to an error document
    /// when validation fails.
    ///
    /// Documents made by [`Document::empty`] are sent with no body.
    pub fn send_document(&self, verb: &Verb, mut document: Document) -> Response<Vec<u8>> {
        if let Err(e) = document.validate(verb, true) {
            document = match self.degrade(verb, e) {
                Ok(fallback) => Document::build(fallback),
                Err(e) => return self.unrecoverable(&e),
            };
            if let Err(e) = document.validate(verb, true) {
                return self.unrecoverable(&e);
            }
        }
        document.jsonapi = self.config.include_version.then(JsonApi::current);

        if document.mode() == Mode::Errors {
            self.log_errors(verb, &document.errors);
        }

        if document.is_empty() {
            return respond(document.status, None);
        }
        match serde_json::to_vec(&document) {
            Ok(body) => respond(document.status, Some(body)),
            Err(e) => {
                let cause: Error = ErrorObject::internal_with(
                    &self.config,
                    format!("unable to encode document: {e}"),
                )
                .into();
                self.unrecoverable(&cause)
            }
        }
    }

    /// Turn a failure into an error payload carrying this sender's public
    /// strings for internal errors.
    fn degrade(&self, verb: &Verb, error: Error) -> crate::Result<Payload> {
        let errors: ErrorList = error
            .into_list()
            .into_iter()
            .map(|mut e| {
                if !e.internal_message().is_empty() {
                    e.title = self.config.error_title.clone();
                    e.detail = self.config.error_detail.clone();
                }
                e
            })
            .collect();
        let mut payload = Payload::Errors(errors);
        payload.prepare(verb, true)?;
        Ok(payload)
    }

    fn log_errors(&self, verb: &Verb, errors: &ErrorList) {
        for e in errors {
            if e.status >= 500 {
                tracing::error!(
                    "sender: {verb} failed with {}: {e} ({})",
                    e.status,
                    e.internal_message()
                );
            } else {
                tracing::debug!("sender: {verb} rejected with {}: {e}", e.status);
            }
        }
    }

    fn unrecoverable(&self, cause: &Error) -> Response<Vec<u8>> {
        let internal = cause.first().map(ErrorObject::internal_message).unwrap_or("");
        tracing::error!("sender: unable to build an error response: {cause} ({internal})");

        let body = serde_json::json!({
            "errors": [{
                "title": self.config.error_title,
                "detail": self.config.error_detail,
                "status": "500",
            }]
        });
        respond(500, Some(serde_json::to_vec(&body).unwrap_or_default()))
    }
}

fn respond(status: u16, body: Option<Vec<u8>>) -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    *response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if let Some(body) = body {
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(crate::CONTENT_TYPE));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        *response.body_mut() = body;
    }
    response
}
