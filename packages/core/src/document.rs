//! The top-level document envelope.
//!
//! A [`Document`] carries either resource data or errors, never both. Its
//! [`Mode`] decides how `data` is written:
//!
//! | Mode | `data` on the wire |
//! |------|--------------------|
//! | [`Mode::Single`] | one object, or `null` when empty |
//! | [`Mode::Collection`] | an array, `[]` when empty |
//! | [`Mode::Errors`] | omitted; `errors` is an array |
//!
//! The mode is chosen from the payload kind when the document is built and
//! is never guessed from the number of objects held, so a one-element
//! collection stays an array.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, ErrorList, ErrorObject, Result};
use crate::link::Links;
use crate::object::{ResourceObject, Verb};

/// The shape of a document's primary data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Single,
    Collection,
    Errors,
}

/// The top-level `jsonapi` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonApi {
    #[serde(default)]
    pub version: String,
}

impl JsonApi {
    /// The version this crate implements.
    pub fn current() -> Self {
        Self {
            version: crate::VERSION.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Anything that can become the primary content of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Object(ResourceObject),
    Collection(Vec<ResourceObject>),
    Error(ErrorObject),
    Errors(ErrorList),
}

impl Payload {
    /// Run the payload's own validation, resolving object statuses for
    /// `verb` along the way.
    pub fn prepare(&mut self, verb: &Verb, response: bool) -> Result<()> {
        match self {
            Payload::Object(object) => object.validate(verb, response),
            Payload::Collection(objects) => objects
                .iter_mut()
                .try_for_each(|o| o.validate(verb, response)),
            Payload::Error(error) => error.validate(),
            Payload::Errors(errors) => errors.validate(),
        }
    }
}

impl From<ResourceObject> for Payload {
    fn from(object: ResourceObject) -> Self {
        Payload::Object(object)
    }
}

impl From<Vec<ResourceObject>> for Payload {
    fn from(objects: Vec<ResourceObject>) -> Self {
        Payload::Collection(objects)
    }
}

impl From<ErrorObject> for Payload {
    fn from(error: ErrorObject) -> Self {
        Payload::Error(error)
    }
}

impl From<ErrorList> for Payload {
    fn from(errors: ErrorList) -> Self {
        Payload::Errors(errors)
    }
}

impl From<Error> for Payload {
    fn from(error: Error) -> Self {
        match error {
            Error::Single(e) => Payload::Error(e),
            Error::Multiple(list) => Payload::Errors(list),
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A top-level document.
///
/// Documents are plain values owned by a single request/response flow; they
/// hold no shared state.
///
/// Decoding uses [`RawValue`] for attributes, so deserialise from text or
/// bytes (`serde_json::from_slice`), not from a `serde_json::Value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub data: Vec<ResourceObject>,
    pub errors: ErrorList,
    pub links: Option<Links>,
    pub included: Vec<ResourceObject>,
    pub meta: Option<Value>,
    /// `None` omits the member from the output.
    pub jsonapi: Option<JsonApi>,
    /// HTTP status to send the document with; `0` until resolved.
    pub status: u16,
    mode: Mode,
    empty: bool,
    validated: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty single-object document.
    pub fn new() -> Self {
        Self::with_mode(Mode::Single)
    }

    /// An empty collection document. Valid as-is: it serialises as
    /// `"data": []`.
    pub fn collection() -> Self {
        Self::with_mode(Mode::Collection)
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            data: Vec::new(),
            errors: ErrorList::new(),
            links: None,
            included: Vec::new(),
            meta: None,
            jsonapi: Config::global().include_version.then(JsonApi::current),
            status: 0,
            mode,
            empty: false,
            validated: false,
        }
    }

    /// A document with no body at all, only a status (e.g. 204 after a
    /// delete). Skips the data/errors checks.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            empty: true,
            ..Self::new()
        }
    }

    /// Wrap an already-validated payload, choosing the mode from its kind.
    ///
    /// Contained objects and errors are trusted and not re-validated by
    /// [`Document::validate`]; the document-level checks still run.
    pub fn build(payload: impl Into<Payload>) -> Self {
        let mut document = match payload.into() {
            Payload::Object(object) => {
                let mut d = Self::new();
                d.status = object.status;
                d.data.push(object);
                d
            }
            Payload::Collection(objects) => {
                let mut d = Self::collection();
                d.status = 200;
                d.data = objects;
                d
            }
            Payload::Error(error) => Self::errored(ErrorList::from(error)),
            Payload::Errors(errors) => Self::errored(errors),
        };
        document.validated = true;
        document
    }

    fn errored(errors: ErrorList) -> Self {
        let mut d = Self::with_mode(Mode::Errors);
        d.status = errors.status();
        d.errors = errors;
        d
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether this is a body-less document made by [`Document::empty`].
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The first data object, if any.
    pub fn first(&self) -> Option<&ResourceObject> {
        self.data.first()
    }

    pub fn into_data(self) -> Vec<ResourceObject> {
        self.data
    }

    /// Append a data object.
    ///
    /// Fails on an errored document, and on a single-object document that
    /// already holds its object. The document adopts the object's status if
    /// it has none yet.
    pub fn add_object(&mut self, object: ResourceObject) -> Result<()> {
        if self.mode == Mode::Errors || self.has_errors() {
            return Err(ErrorObject::internal("cannot add data to an errored document").into());
        }
        if self.mode == Mode::Single && self.has_data() {
            return Err(ErrorObject::internal("single-object mode already populated").into());
        }

        if self.status == 0 {
            self.status = object.status;
        }
        self.data.push(object);
        self.validated = false;
        Ok(())
    }

    /// Append an error, switching the document to [`Mode::Errors`].
    ///
    /// Fails if the document already holds data or `error.status` is unset.
    /// The first error's status becomes the document's status.
    pub fn add_error(&mut self, error: ErrorObject) -> Result<()> {
        if self.has_data() {
            return Err(ErrorObject::internal(
                "cannot add an error to a document already possessing data",
            )
            .into());
        }
        if error.status == 0 {
            return Err(ErrorObject::specification("Status code must be set for an error").into());
        }

        self.mode = Mode::Errors;
        if self.status == 0 {
            self.status = error.status;
        }
        self.errors.push(error);
        self.validated = false;
        Ok(())
    }

    /// Check the document-level invariants, then (unless the document was
    /// built from a trusted payload) every contained object and error.
    ///
    /// 1. Data and errors are mutually exclusive, and one of them is present.
    ///    A collection counts as present even when empty.
    /// 2. A single-object document holds at most one object.
    /// 3. `included` requires non-empty data.
    /// 4. The status lies in `[100, 600)`.
    ///
    /// Documents made by [`Document::empty`] only get the status check.
    pub fn validate(&mut self, verb: &Verb, response: bool) -> Result<()> {
        if self.empty {
            return self.check_status();
        }

        match self.mode {
            Mode::Errors if self.has_data() => {
                return Err(both_set());
            }
            Mode::Errors if !self.has_errors() => {
                return Err(neither_set());
            }
            Mode::Single | Mode::Collection if self.has_errors() => {
                return Err(both_set());
            }
            Mode::Single if self.data.len() > 1 => {
                return Err(ErrorObject::internal(format!(
                    "single-object document holds {} objects",
                    self.data.len()
                ))
                .into());
            }
            Mode::Single if !self.has_data() => {
                return Err(neither_set());
            }
            _ => {}
        }

        if !self.included.is_empty() && !self.has_data() {
            return Err(ErrorObject::internal(
                "'included' should only be set for a response if 'data' is as well",
            )
            .into());
        }

        if !self.validated {
            for object in &mut self.data {
                object.validate(verb, response)?;
            }
            for object in &self.included {
                object.validate_identity(response)?;
            }
            if self.mode == Mode::Errors {
                self.errors.validate()?;
            }
        }

        if self.status == 0 {
            self.status = match self.mode {
                Mode::Single => self.first().map_or(0, |o| o.status),
                Mode::Collection => 200,
                Mode::Errors => self.errors.status(),
            };
        }

        self.check_status()
    }

    fn check_status(&self) -> Result<()> {
        if !(100..600).contains(&self.status) {
            return Err(ErrorObject::internal(format!(
                "Response HTTP Status {} is outside of valid range",
                self.status
            ))
            .into());
        }
        Ok(())
    }
}

fn both_set() -> Error {
    ErrorObject::internal("Both `errors` and `data` cannot be set for a JSON response").into()
}

fn neither_set() -> Error {
    ErrorObject::internal("Both `errors` and `data` cannot be blank for a JSON response").into()
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        if !self.empty {
            match self.mode {
                Mode::Single => map.serialize_entry("data", &self.data.first())?,
                Mode::Collection => map.serialize_entry("data", &self.data)?,
                Mode::Errors => map.serialize_entry("errors", &self.errors)?,
            }
        }
        if let Some(links) = self.links.as_ref().filter(|l| !l.is_empty()) {
            map.serialize_entry("links", links)?;
        }
        if !self.included.is_empty() {
            map.serialize_entry("included", &self.included)?;
        }
        if let Some(meta) = &self.meta {
            map.serialize_entry("meta", meta)?;
        }
        if let Some(jsonapi) = &self.jsonapi {
            map.serialize_entry("jsonapi", jsonapi)?;
        }

        map.end()
    }
}

#[derive(Deserialize)]
struct WireDocument {
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    errors: Option<ErrorList>,
    #[serde(default)]
    links: Option<Links>,
    #[serde(default)]
    included: Option<Vec<ResourceObject>>,
    #[serde(default)]
    meta: Option<Value>,
    #[serde(default)]
    jsonapi: Option<JsonApi>,
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        use serde::de::Error as _;

        let wire = WireDocument::deserialize(deserializer)?;
        let errors = wire.errors.unwrap_or_default();

        let (mode, data) = match wire.data.as_deref().map(RawValue::get) {
            None if !errors.is_empty() => (Mode::Errors, Vec::new()),
            None => (Mode::Single, Vec::new()),
            Some(raw) => match raw.trim_start().as_bytes().first() {
                Some(b'{') => {
                    let object = serde_json::from_str(raw).map_err(D::Error::custom)?;
                    (Mode::Single, vec![object])
                }
                Some(b'[') => {
                    let objects = serde_json::from_str(raw).map_err(D::Error::custom)?;
                    (Mode::Collection, objects)
                }
                _ => {
                    return Err(D::Error::custom(
                        "`data` must be null, a resource object, or an array of resource objects",
                    ))
                }
            },
        };

        Ok(Document {
            data,
            errors,
            links: wire.links,
            included: wire.included.unwrap_or_default(),
            meta: wire.meta,
            jsonapi: wire.jsonapi,
            status: 0,
            mode,
            empty: false,
            validated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(id: &str, status: u16) -> ResourceObject {
        let mut o = ResourceObject::new("test", id, &json!({"foo": "bar"})).unwrap();
        o.status = status;
        o
    }

    fn data_of(document: &Document) -> String {
        let value: serde_json::Map<String, Value> =
            serde_json::from_str(&serde_json::to_string(document).unwrap()).unwrap();
        value.get("data").map(Value::to_string).unwrap_or_default()
    }

    #[test]
    fn new_document_carries_version() {
        assert_eq!(Document::new().jsonapi, Some(JsonApi::current()));
    }

    #[test]
    fn build_infers_mode_and_status() {
        let d = Document::build(object("1", 202));
        assert_eq!(d.mode(), Mode::Single);
        assert_eq!(d.status, 202);

        let d = Document::build(vec![object("1", 0)]);
        assert_eq!(d.mode(), Mode::Collection);
        assert_eq!(d.status, 200);

        let d = Document::build(ErrorObject::new(500, "ISE", "x"));
        assert_eq!(d.mode(), Mode::Errors);
        assert_eq!(d.status, 500);

        let list: ErrorList =
            vec![ErrorObject::new(403, "a", "b"), ErrorObject::new(400, "c", "d")].into();
        assert_eq!(Document::build(list).status, 403);
    }

    #[test]
    fn add_object_enforces_single_mode_cardinality() {
        let mut d = Document::new();
        d.add_object(object("1", 0)).unwrap();
        assert_eq!(d.data.len(), 1);
        let err = d.add_object(object("2", 0)).unwrap_err();
        assert!(err.first().unwrap().internal_message().contains("single-object"));
    }

    #[test]
    fn add_object_appends_to_collections() {
        let mut d = Document::collection();
        d.add_object(object("1", 0)).unwrap();
        d.add_object(object("2", 0)).unwrap();
        assert_eq!(d.data.len(), 2);
    }

    #[test]
    fn add_object_adopts_status_when_unset() {
        let mut d = Document::new();
        d.add_object(object("1", 202)).unwrap();
        assert_eq!(d.status, 202);
    }

    #[test]
    fn add_object_rejected_after_errors() {
        let mut d = Document::new();
        d.add_error(ErrorObject::new(400, "Bad", "x")).unwrap();
        let err = d.add_object(object("1", 0)).unwrap_err();
        assert!(err.first().unwrap().internal_message().contains("errored"));
    }

    #[test]
    fn add_error_switches_mode_and_adopts_first_status() {
        let mut d = Document::collection();
        d.add_error(ErrorObject::new(409, "Conflict", "x")).unwrap();
        d.add_error(ErrorObject::new(400, "Bad", "y")).unwrap();
        assert_eq!(d.mode(), Mode::Errors);
        assert_eq!(d.status, 409);
        assert_eq!(d.errors.len(), 2);
    }

    #[test]
    fn add_error_requires_status() {
        let mut d = Document::new();
        assert!(d.add_error(ErrorObject::new(0, "Invalid", "So badly")).is_err());
        assert!(d.errors.is_empty());
    }

    #[test]
    fn add_error_rejected_with_data() {
        let mut d = Document::new();
        d.add_object(object("1", 0)).unwrap();
        assert!(d.add_error(ErrorObject::new(400, "Bad", "x")).is_err());
    }

    #[test]
    fn validate_rejects_both_data_and_errors() {
        let mut d = Document::build(object("1", 200));
        d.errors.push(ErrorObject::new(400, "Bad", "x"));
        assert!(d.validate(&Verb::Read, true).is_err());
    }

    #[test]
    fn validate_rejects_neither_data_nor_errors() {
        let mut d = Document::new();
        d.status = 200;
        assert!(d.validate(&Verb::Read, true).is_err());
    }

    #[test]
    fn validate_accepts_empty_collection() {
        let mut d = Document::build(Vec::<ResourceObject>::new());
        d.validate(&Verb::Read, true).unwrap();
        assert_eq!(d.status, 200);
    }

    #[test]
    fn validate_rejects_overfull_single_document() {
        let mut d = Document::build(object("1", 200));
        d.data.push(object("2", 200));
        assert!(d.validate(&Verb::Read, true).is_err());
    }

    #[test]
    fn included_requires_data() {
        let mut d = Document::collection();
        d.included.push(object("9", 0));
        assert!(d.validate(&Verb::Read, true).is_err());

        let mut d = Document::build(object("1", 202));
        d.included.push(object("9", 0));
        d.validate(&Verb::Create, true).unwrap();
        assert_eq!(d.status, 202);
    }

    #[test]
    fn validate_checks_status_range() {
        let mut d = Document::build(object("1", 0));
        d.status = 600;
        assert!(d.validate(&Verb::Read, true).is_err());
        d.status = 99;
        assert!(d.validate(&Verb::Read, true).is_err());
    }

    #[test]
    fn validate_recurses_into_untrusted_objects() {
        let mut d = Document::new();
        d.add_object(object("", 0)).unwrap();
        assert!(d.validate(&Verb::Read, true).is_err());

        let mut d = Document::new();
        d.add_object(object("1", 0)).unwrap();
        d.validate(&Verb::Create, true).unwrap();
        assert_eq!(d.status, 201);
    }

    #[test]
    fn validate_recurses_into_untrusted_errors() {
        let mut d = Document::new();
        d.add_error(ErrorObject::new(422, "Invalid", "no pointer")).unwrap();
        assert!(d.validate(&Verb::Create, true).is_err());
    }

    #[test]
    fn empty_document_only_checks_status() {
        let mut d = Document::empty(204);
        d.validate(&Verb::Delete, true).unwrap();
        assert!(Document::empty(0).validate(&Verb::Delete, true).is_err());
    }

    #[test]
    fn single_object_serialises_as_object() {
        let data = data_of(&Document::build(object("1", 202)));
        assert!(data.starts_with('{') && data.ends_with('}'));
    }

    #[test]
    fn one_element_collection_serialises_as_array() {
        let data = data_of(&Document::build(vec![object("1", 0)]));
        assert!(data.starts_with('[') && data.ends_with(']'));
    }

    #[test]
    fn empty_single_serialises_as_null_and_empty_collection_as_array() {
        assert_eq!(data_of(&Document::new()), "null");
        assert_eq!(data_of(&Document::collection()), "[]");
    }

    #[test]
    fn error_document_omits_data() {
        let mut d = Document::new();
        d.add_error(ErrorObject::internal("Test Error")).unwrap();
        let value: Value = serde_json::from_str(&serde_json::to_string(&d).unwrap()).unwrap();
        assert!(value.get("data").is_none());
        assert!(value["errors"].is_array());
    }

    #[test]
    fn version_member_can_be_omitted() {
        let mut d = Document::collection();
        d.jsonapi = None;
        assert_eq!(serde_json::to_string(&d).unwrap(), r#"{"data":[]}"#);
    }

    #[test]
    fn serialises_created_user_exactly() {
        let o = ResourceObject::new("user", "42", &json!({"name": "Ann"})).unwrap();
        let d = Document::build(o);
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"data":{"type":"user","id":"42","attributes":{"name":"Ann"}},"jsonapi":{"version":"1.1"}}"#
        );
    }

    #[test]
    fn decodes_mode_from_data_shape() {
        let d: Document = serde_json::from_str(r#"{"data": {"type": "user", "id": "1"}}"#).unwrap();
        assert_eq!(d.mode(), Mode::Single);
        assert_eq!(d.data.len(), 1);

        let d: Document = serde_json::from_str(r#"{"data": [{"type": "user", "id": "1"}]}"#).unwrap();
        assert_eq!(d.mode(), Mode::Collection);

        let d: Document = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert_eq!(d.mode(), Mode::Collection);
        assert!(d.data.is_empty());

        let d: Document = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert_eq!(d.mode(), Mode::Single);
        assert!(d.data.is_empty());

        let d: Document =
            serde_json::from_str(r#"{"errors": [{"title": "t", "detail": "d", "status": "404"}]}"#)
                .unwrap();
        assert_eq!(d.mode(), Mode::Errors);
        assert_eq!(d.errors.status(), 404);
    }

    #[test]
    fn rejects_scalar_data() {
        assert!(serde_json::from_str::<Document>(r#"{"data": 5}"#).is_err());
    }

    #[test]
    fn round_trip_preserves_identity_and_attribute_bytes() {
        let original = ResourceObject::new("user", "7", &json!({"name": "Ann", "age": 3})).unwrap();
        let wire = serde_json::to_vec(&Document::build(original.clone())).unwrap();
        let back: Document = serde_json::from_slice(&wire).unwrap();
        let o = back.first().unwrap();
        assert_eq!(o.resource_type, original.resource_type);
        assert_eq!(o.id, original.id);
        assert_eq!(o.raw_attributes(), original.raw_attributes());
    }
}
