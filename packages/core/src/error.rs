//! Error objects, error lists, and the crate-wide [`Error`] type.
//!
//! Every failure in this crate is expressed as one or more JSON:API error
//! objects so that it can be sent to a client unchanged:
//!
//! ```json
//! { "title": "Invalid Attribute", "detail": "must not be empty",
//!   "status": "422", "source": { "pointer": "/data/attributes/name" } }
//! ```
//!
//! | Constructor | Status | Notes |
//! |-------------|--------|-------|
//! | [`ErrorObject::internal`] | 500 | Public title/detail from [`Config`]; the message is kept private |
//! | [`ErrorObject::specification`] | 406 | Format or verb violations |
//! | [`ErrorObject::input`] | 422 | Pointer derived from the attribute name |
//! | [`ErrorObject::not_found`] | 404 | Names the resource type and id |
//! | [`ErrorObject::payload_too_large`] | 413 | Inbound body over the size cap |

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Config;

/// Result type for every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A single structured error.
///
/// `Display` yields the public `"{title}: {detail}"` string. The private
/// diagnostic passed to [`ErrorObject::internal`] is available only through
/// [`ErrorObject::internal_message`] and is never serialised.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{title}: {detail}")]
pub struct ErrorObject {
    pub title: String,
    pub detail: String,

    /// HTTP status. Must lie in `[400, 600)` to validate.
    pub status: u16,

    /// Application-specific error code.
    pub code: Option<String>,

    /// Slash-path into the request document naming the offending member,
    /// e.g. `/data/attributes/name`. Mandatory when `status == 422`.
    pub source_pointer: Option<String>,

    internal: String,
}

impl ErrorObject {
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
            status,
            ..Self::default()
        }
    }

    /// A 500 error using the process-wide [`Config::global`] strings.
    ///
    /// `message` is recorded as the private diagnostic; clients only ever see
    /// the configured generic title and detail.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::internal_with(Config::global(), message)
    }

    /// A 500 error using the strings from `config`.
    pub fn internal_with(config: &Config, message: impl Into<String>) -> Self {
        Self {
            internal: message.into(),
            ..Self::new(500, config.error_title.clone(), config.error_detail.clone())
        }
    }

    /// A 406 error for requests or responses that break the format's rules.
    pub fn specification(detail: impl Into<String>) -> Self {
        Self::new(406, "JSON API Specification Error", detail)
    }

    /// A 422 error against a single attribute.
    ///
    /// The source pointer is `/data/attributes/<attribute>` with the
    /// attribute name lower-cased.
    pub fn input(attribute: &str, detail: impl Into<String>) -> Self {
        Self::new(422, "Invalid Attribute", detail)
            .with_pointer(format!("/data/attributes/{}", attribute.to_lowercase()))
    }

    /// A 404 error naming the missing resource.
    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new(
            404,
            "Not Found",
            format!("No resource of type '{resource_type}' exists for ID: {id}"),
        )
    }

    /// A 413 error for bodies larger than `limit` bytes.
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            413,
            "Payload Too Large",
            format!("Request body exceeds the maximum of {limit} bytes"),
        )
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.source_pointer = Some(pointer.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The private diagnostic. Empty unless set by [`ErrorObject::internal`].
    pub fn internal_message(&self) -> &str {
        &self.internal
    }

    /// Check the status range and the 422 pointer requirement.
    pub fn validate(&self) -> Result<()> {
        if !(400..600).contains(&self.status) {
            return Err(ErrorObject::internal(format!(
                "error status {} is outside the range [400, 600) for error {:?}",
                self.status, self
            ))
            .into());
        }

        let has_pointer = self.source_pointer.as_deref().is_some_and(|p| !p.is_empty());
        if self.status == 422 && !has_pointer {
            return Err(ErrorObject::internal(format!(
                "422 errors must set a source pointer: {:?}",
                self
            ))
            .into());
        }

        Ok(())
    }
}

// --- wire format -------------------------------------------------------------

#[derive(Serialize)]
struct WireSourceRef<'a> {
    pointer: &'a str,
}

#[derive(Serialize)]
struct WireErrorRef<'a> {
    title: &'a str,
    detail: &'a str,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<WireSourceRef<'a>>,
}

impl Serialize for ErrorObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WireErrorRef {
            title: &self.title,
            detail: &self.detail,
            status: self.status.to_string(),
            code: self.code.as_deref(),
            source: self
                .source_pointer
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|pointer| WireSourceRef { pointer }),
        }
        .serialize(serializer)
    }
}

/// `status` arrives as a string per the format, but numbers are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireStatus {
    Number(u16),
    Text(String),
}

#[derive(Deserialize)]
struct WireSource {
    #[serde(default)]
    pointer: Option<String>,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    status: Option<WireStatus>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    source: Option<WireSource>,
}

impl<'de> Deserialize<'de> for ErrorObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = WireError::deserialize(deserializer)?;

        let status = match wire.status {
            None => 0,
            Some(WireStatus::Number(n)) => n,
            Some(WireStatus::Text(s)) => s.trim().parse().map_err(|_| {
                serde::de::Error::custom(format!("error status {s:?} is not an HTTP status code"))
            })?,
        };

        Ok(ErrorObject {
            title: wire.title,
            detail: wire.detail,
            status,
            code: wire.code,
            source_pointer: wire.source.and_then(|s| s.pointer),
            internal: String::new(),
        })
    }
}

// --- ErrorList ---------------------------------------------------------------

/// An ordered list of errors. The first error's status becomes the response
/// status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorList(Vec<ErrorObject>);

impl ErrorList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: ErrorObject) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&ErrorObject> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorObject> {
        self.0.iter()
    }

    /// Status of the first error, or `0` for an empty list.
    pub fn status(&self) -> u16 {
        self.first().map_or(0, |e| e.status)
    }

    /// Validate every member, stopping at the first invalid one.
    ///
    /// An empty list is itself invalid: there is nothing to send.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ErrorObject::internal("error list must contain at least one error").into());
        }
        self.0.iter().try_for_each(ErrorObject::validate)
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

impl From<Vec<ErrorObject>> for ErrorList {
    fn from(errors: Vec<ErrorObject>) -> Self {
        Self(errors)
    }
}

impl From<ErrorObject> for ErrorList {
    fn from(error: ErrorObject) -> Self {
        Self(vec![error])
    }
}

impl FromIterator<ErrorObject> for ErrorList {
    fn from_iter<I: IntoIterator<Item = ErrorObject>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ErrorList {
    type Item = ErrorObject;
    type IntoIter = std::vec::IntoIter<ErrorObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ErrorObject;
    type IntoIter = std::slice::Iter<'a, ErrorObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// --- Error -------------------------------------------------------------------

/// The error type returned throughout this crate: one error object, or a
/// list of them when several problems are reported together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Single(#[from] ErrorObject),

    #[error(transparent)]
    Multiple(#[from] ErrorList),
}

impl Error {
    /// The HTTP status to respond with: that of the (first) error.
    pub fn status(&self) -> u16 {
        match self {
            Error::Single(e) => e.status,
            Error::Multiple(list) => list.status(),
        }
    }

    /// Whether this represents a server-side failure (status 5xx).
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }

    /// All contained errors, in order.
    pub fn into_list(self) -> ErrorList {
        match self {
            Error::Single(e) => ErrorList::from(e),
            Error::Multiple(list) => list,
        }
    }

    /// The first contained error, if any.
    pub fn first(&self) -> Option<&ErrorObject> {
        match self {
            Error::Single(e) => Some(e),
            Error::Multiple(list) => list.first(),
        }
    }

    /// Validate the contained error(s); see [`ErrorObject::validate`].
    pub fn validate(&self) -> Result<()> {
        match self {
            Error::Single(e) => e.validate(),
            Error::Multiple(list) => list.validate(),
        }
    }
}
