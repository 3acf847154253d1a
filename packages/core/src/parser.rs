//! Inbound body parsing.
//!
//! A [`Parser`] turns a raw body into a validated [`Document`] in four steps:
//!
//! 1. Check the declared content type (406 on mismatch).
//! 2. Read at most `max_payload_bytes` (413 past the cap).
//! 3. Decode (500 on failure; the serde diagnostic stays private).
//! 4. Validate: the bulk-id rule, then every contained object for the verb.

use std::io::Read;

use crate::config::Config;
use crate::document::{Document, Mode};
use crate::error::{Error, ErrorObject, Result};
use crate::object::{ResourceObject, Verb};

/// Parses request bodies (or, via [`Parser::for_response`], reply bodies)
/// for one verb.
#[derive(Debug, Clone)]
pub struct Parser {
    verb: Verb,
    content_type: Option<String>,
    config: Config,
    response: bool,
}

impl Parser {
    /// A parser for an inbound request with the given `Content-Type` header.
    pub fn new(verb: Verb, content_type: Option<&str>, config: Config) -> Self {
        Self {
            verb,
            content_type: content_type.map(str::to_owned),
            config,
            response: false,
        }
    }

    /// A parser for a reply to a request made with `verb`.
    ///
    /// Reply documents may carry errors, and every object in them needs an id.
    pub fn for_response(verb: Verb, content_type: Option<&str>, config: Config) -> Self {
        Self {
            response: true,
            ..Self::new(verb, content_type, config)
        }
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// The declared media type must be exactly [`crate::CONTENT_TYPE`].
    pub fn check_content_type(&self) -> Result<()> {
        let actual = self.content_type.as_deref().unwrap_or("").trim();
        if actual != crate::CONTENT_TYPE {
            return Err(ErrorObject::specification(format!(
                "Expected Content-Type header to be {}, got: {actual}",
                crate::CONTENT_TYPE
            ))
            .into());
        }
        Ok(())
    }

    /// Parse and validate a whole document.
    pub fn document<R: Read>(&self, reader: R) -> Result<Document> {
        self.check_content_type()?;
        let body = self.read(reader)?;

        let mut document: Document = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("parser: unable to decode {} body: {e}", self.verb);
            ErrorObject::internal_with(&self.config, format!("unable to decode document: {e}"))
        })?;

        if !self.response {
            if document.has_errors() {
                return Err(
                    ErrorObject::specification("Request documents must not contain errors").into(),
                );
            }
            if document.mode() == Mode::Single && !document.has_data() {
                return Err(ErrorObject::specification(
                    "Request document must contain a resource object",
                )
                .into());
            }
        }

        self.check_bulk_ids(&document)?;
        document.validate(&self.verb, self.response)?;
        Ok(document)
    }

    /// Parse a document that must hold exactly one resource object.
    ///
    /// The object needs an id unless the verb is [`Verb::Create`] on the
    /// request path. On the response path an error document is returned as
    /// `Err`.
    pub fn object<R: Read>(&self, reader: R) -> Result<ResourceObject> {
        let document = self.document(reader)?;
        let mode = document.mode();
        if mode == Mode::Errors {
            return Err(Error::Multiple(document.errors));
        }

        let mut data = document.into_data();
        if mode != Mode::Single || data.len() != 1 {
            return Err(ErrorObject::specification(
                "Expected a single resource object, got a collection",
            )
            .into());
        }
        data.pop()
            .ok_or_else(|| ErrorObject::specification("Expected a resource object").into())
    }

    /// Parse a document holding any number of resource objects.
    ///
    /// A single-object document yields a one-element sequence. On the
    /// response path an error document is returned as `Err`.
    pub fn collection<R: Read>(&self, reader: R) -> Result<Vec<ResourceObject>> {
        let document = self.document(reader)?;
        if document.mode() == Mode::Errors {
            return Err(Error::Multiple(document.errors));
        }
        Ok(document.into_data())
    }

    fn read<R: Read>(&self, reader: R) -> Result<Vec<u8>> {
        let limit = self.config.max_payload_bytes;
        let mut body = Vec::new();
        reader
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| {
                ErrorObject::internal_with(&self.config, format!("unable to read body: {e}"))
            })?;

        if body.len() > limit {
            tracing::warn!("parser: {} body exceeds the {limit} byte cap", self.verb);
            return Err(ErrorObject::payload_too_large(limit).into());
        }
        Ok(body)
    }

    /// Multi-object collections are only accepted when every member has an
    /// id; creating several objects without ids is unsupported.
    fn check_bulk_ids(&self, document: &Document) -> Result<()> {
        if !self.config.bulk_ids_required || document.mode() != Mode::Collection {
            return Ok(());
        }
        if document.data.len() >= 2 && document.data.iter().any(|o| o.id.is_empty()) {
            return Err(ErrorObject::input(
                "id",
                "Every object in a multi-object collection must have an id",
            )
            .into());
        }
        Ok(())
    }
}
