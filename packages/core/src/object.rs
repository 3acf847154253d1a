//! Resource objects and the per-verb validation rules.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{ErrorObject, Result};
use crate::link::Link;
use crate::relationship::Relationship;
use crate::validation::{self, Validate};

// ---------------------------------------------------------------------------
// Verb
// ---------------------------------------------------------------------------

/// The operation a payload belongs to, derived from the HTTP method.
///
/// | Verb | Method | Accepted object statuses | Default |
/// |------|--------|--------------------------|---------|
/// | `Create` | `POST` | 201, 202, 204 | 201 |
/// | `Read` | `GET` | 200 (forced) | 200 |
/// | `Update` | `PATCH` | 200, 202, 204 | 200 |
/// | `Delete` | `DELETE` | no object payloads | |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
    /// Any other method; never valid for a resource object payload.
    Other(String),
}

impl Verb {
    /// Statuses a resource object may carry for this verb.
    pub fn accepted_statuses(&self) -> &'static [u16] {
        match self {
            Verb::Create => &[201, 202, 204],
            Verb::Read => &[200],
            Verb::Update => &[200, 202, 204],
            Verb::Delete | Verb::Other(_) => &[],
        }
    }

    /// The status assumed when a resource object carries none.
    pub fn default_status(&self) -> Option<u16> {
        match self {
            Verb::Create => Some(201),
            Verb::Read | Verb::Update => Some(200),
            Verb::Delete | Verb::Other(_) => None,
        }
    }

    /// The HTTP method name.
    pub fn method(&self) -> &str {
        match self {
            Verb::Create => "POST",
            Verb::Read => "GET",
            Verb::Update => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Other(method) => method,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

impl From<&http::Method> for Verb {
    fn from(method: &http::Method) -> Self {
        match method.as_str() {
            "POST" => Verb::Create,
            "GET" => Verb::Read,
            "PATCH" => Verb::Update,
            "DELETE" => Verb::Delete,
            other => Verb::Other(other.to_owned()),
        }
    }
}

/// Parses either an HTTP method (`POST`) or a verb name (`create`),
/// case-insensitively. Unknown names become [`Verb::Other`].
impl std::str::FromStr for Verb {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "post" | "create" => Verb::Create,
            "get" | "read" => Verb::Read,
            "patch" | "update" => Verb::Update,
            "delete" => Verb::Delete,
            _ => Verb::Other(s.to_ascii_uppercase()),
        })
    }
}

// ---------------------------------------------------------------------------
// ResourceObject
// ---------------------------------------------------------------------------

/// The basic addressable unit: type, id, and opaque attributes.
///
/// Attributes are held as raw JSON text and only given a Rust type when a
/// caller asks for one via [`ResourceObject::unmarshal`]. A decoded object
/// re-serialises its attributes byte-for-byte.
///
/// ```json
/// { "type": "user", "id": "42", "attributes": { "name": "Ann" } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceObject {
    #[serde(rename = "type", default)]
    pub resource_type: String,

    /// Empty means unassigned (allowed only in creation requests).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<Box<RawValue>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, Link>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// HTTP status to send this object with; `0` means unset until
    /// [`ResourceObject::validate`] resolves it.
    #[serde(skip)]
    pub status: u16,
}

impl ResourceObject {
    /// Build an object, serialising `attributes` immediately.
    pub fn new<T: Serialize + ?Sized>(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        attributes: &T,
    ) -> Result<Self> {
        let mut object = Self {
            resource_type: resource_type.into(),
            id: id.into(),
            ..Self::default()
        };
        object.marshal(attributes)?;
        Ok(object)
    }

    /// The attributes exactly as encoded, if present.
    pub fn raw_attributes(&self) -> Option<&str> {
        self.attributes.as_deref().map(RawValue::get)
    }

    /// Replace the attributes with the encoding of `attributes`.
    pub fn marshal<T: Serialize + ?Sized>(&mut self, attributes: &T) -> Result<()> {
        let raw = serde_json::value::to_raw_value(attributes).map_err(|e| {
            ErrorObject::internal(format!(
                "unable to encode attributes for {} object: {e}",
                self.resource_type
            ))
        })?;
        self.attributes = Some(raw);
        Ok(())
    }

    /// Decode the attributes into `T` without running field checks.
    ///
    /// Absent attributes decode as an empty object.
    pub fn decode_attributes<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(self.raw_attributes().unwrap_or("{}")).map_err(|e| {
            ErrorObject::internal(format!(
                "unable to decode attributes of {} object {:?}: {e}",
                self.resource_type, self.id
            ))
            .into()
        })
    }

    /// Decode the attributes into `T` and run its field checks.
    ///
    /// Fails with an internal error if `expected_type` does not match the
    /// object's type or the attributes do not decode. Field failures become
    /// 422 errors pointing at each field: a single failure is returned on its
    /// own, several as an error list.
    pub fn unmarshal<T: DeserializeOwned + Validate>(&self, expected_type: &str) -> Result<T> {
        if self.resource_type != expected_type {
            return Err(ErrorObject::internal(format!(
                "expected type '{expected_type}', got '{}'",
                self.resource_type
            ))
            .into());
        }

        let target: T = self.decode_attributes()?;
        target.validate().map_err(validation::into_error)?;
        Ok(target)
    }

    /// Reject a body whose id differs from the id in the request path.
    pub fn check_id(&self, path_id: &str) -> Result<()> {
        if self.id != path_id {
            return Err(ErrorObject::input(
                "id",
                format!("Request ID '{}' does not match URL ID '{path_id}'", self.id),
            )
            .into());
        }
        Ok(())
    }

    /// Check that `type` and `id` are present, without any verb rules.
    ///
    /// Used for `included` resources, which always need both.
    pub fn validate_identity(&self, response: bool) -> Result<()> {
        if self.resource_type.is_empty() {
            return Err(self.missing("type", response));
        }
        if self.id.is_empty() {
            return Err(self.missing("id", response));
        }
        Ok(())
    }

    /// Validate this object for `verb`, resolving its status.
    ///
    /// - `type` is always required.
    /// - `id` is required except in a creation request (`response == false`
    ///   and `verb == Create`), where the server assigns it.
    /// - A non-zero status must be one the verb accepts; zero resolves to the
    ///   verb's default. Reads always resolve to 200.
    /// - `Delete` and unknown verbs are rejected with a 406.
    pub fn validate(&mut self, verb: &Verb, response: bool) -> Result<()> {
        if self.resource_type.is_empty() {
            return Err(self.missing("type", response));
        }
        if self.id.is_empty() && (response || *verb != Verb::Create) {
            return Err(self.missing("id", response));
        }
        for relationship in self.relationships.values() {
            relationship.validate(response)?;
        }

        let Some(default) = verb.default_status() else {
            return Err(ErrorObject::specification(format!(
                "The JSON API specification does not accept '{verb}' requests for resource objects"
            ))
            .into());
        };

        self.status = match (verb, self.status) {
            (Verb::Read, _) | (_, 0) => default,
            (_, status) if verb.accepted_statuses().contains(&status) => status,
            (_, status) => {
                let accepted: Vec<String> =
                    verb.accepted_statuses().iter().map(u16::to_string).collect();
                return Err(ErrorObject::specification(format!(
                    "{verb} status must be one of {}, got {status}",
                    accepted.join(", ")
                ))
                .into());
            }
        };

        Ok(())
    }

    fn missing(&self, member: &str, response: bool) -> crate::Error {
        if response {
            ErrorObject::internal(format!(
                "{} object {:?} is missing its {member}",
                self.resource_type, self.id
            ))
            .into()
        } else {
            ErrorObject::input(member, "Missing mandatory object attribute").into()
        }
    }
}

impl PartialEq for ResourceObject {
    fn eq(&self, other: &Self) -> bool {
        self.resource_type == other.resource_type
            && self.id == other.id
            && self.raw_attributes() == other.raw_attributes()
            && self.links == other.links
            && self.relationships == other.relationships
            && self.meta == other.meta
            && self.status == other.status
    }
}
