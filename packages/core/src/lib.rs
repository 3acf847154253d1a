//! Document codec and validator for the JSON:API resource-exchange format.
//!
//! This crate models the three payload shapes a JSON:API exchange can carry
//! (one resource, a collection of resources, or a list of errors) and
//! enforces the format's structural rules while parsing inbound bodies and
//! serialising outbound ones.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Runtime knobs: default error strings, version member, payload cap |
//! | [`link`] | [`Link`] / [`Links`]: bare-string or `{href, meta}` links |
//! | [`relationship`] | [`Relationship`], [`ResourceLinkage`], [`ResourceIdentifier`] |
//! | [`error`] | [`ErrorObject`], [`ErrorList`], and the crate [`Error`] type |
//! | [`object`] | [`ResourceObject`] and the [`Verb`] status table |
//! | [`document`] | [`Document`], its [`Mode`] state machine, and [`Payload`] |
//! | [`parser`] | [`Parser`]: content-type check, size cap, decode, per-object checks |
//! | [`sender`] | [`Sender`]: validate, degrade to an error document, serialise |
//! | [`validation`] | Field-level checks for typed attribute structs |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use resdoc::{Config, Parser, Sender, Verb};
//!
//! let config = Config::from_env();
//! let parser = Parser::new(Verb::Create, Some(resdoc::CONTENT_TYPE), config.clone());
//! let mut object = parser.object(body.as_slice())?;
//!
//! object.id = "42".into();
//! let reply = Sender::new(config).send(&Verb::Create, object);
//! assert_eq!(reply.status(), 201);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod link;
pub mod object;
pub mod parser;
pub mod relationship;
pub mod sender;
pub mod validation;

pub use config::Config;
pub use document::{Document, JsonApi, Mode, Payload};
pub use error::{Error, ErrorList, ErrorObject, Result};
pub use link::{Link, Links};
pub use object::{ResourceObject, Verb};
pub use parser::Parser;
pub use relationship::{Relationship, ResourceIdentifier, ResourceLinkage};
pub use sender::Sender;
pub use validation::{Checks, FieldError, Validate};

/// The media type every request and response body must be labelled with.
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

/// The format version advertised in the top-level `jsonapi` member.
pub const VERSION: &str = "1.1";
