//! Links: a URL optionally accompanied by metadata.
//!
//! On the wire a link is either a bare string or an object:
//!
//! ```json
//! "https://api.example.com/users/1"
//! { "href": "https://api.example.com/users/1", "meta": { "count": 10 } }
//! ```
//!
//! Both shapes decode into the same [`Link`] value. Encoding picks the bare
//! string whenever there is no metadata to carry.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A single link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    pub href: String,

    /// Non-standard metadata about the link. An empty map is treated the
    /// same as `None`.
    pub meta: Option<Map<String, Value>>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            meta: None,
        }
    }

    pub fn with_meta(href: impl Into<String>, meta: Map<String, Value>) -> Self {
        Self {
            href: href.into(),
            meta: Some(meta),
        }
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Object<'a> {
            href: &'a str,
            meta: &'a Map<String, Value>,
        }

        match self.meta.as_ref().filter(|m| !m.is_empty()) {
            None => serializer.serialize_str(&self.href),
            Some(meta) => Object {
                href: &self.href,
                meta,
            }
            .serialize(serializer),
        }
    }
}

/// Wire shapes, tried in declaration order: string first, then object.
#[derive(Deserialize)]
#[serde(untagged)]
enum LinkRepr {
    Href(String),
    Object(Map<String, Value>),
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let mut object = match LinkRepr::deserialize(deserializer) {
            Ok(LinkRepr::Href(href)) => return Ok(Link::new(href)),
            Ok(LinkRepr::Object(object)) => object,
            Err(_) => {
                return Err(D::Error::custom(
                    "link must be a string or an object with an `href` member",
                ))
            }
        };

        let href = match object.remove("href") {
            Some(Value::String(href)) => href,
            _ => return Err(D::Error::custom("link object requires a string `href` member")),
        };
        let meta = match object.remove("meta") {
            None | Some(Value::Null) => None,
            Some(Value::Object(meta)) => Some(meta),
            Some(_) => return Err(D::Error::custom("link `meta` must be an object")),
        };

        Ok(Link { href, meta })
    }
}

/// The `self` / `related` pair used by documents and relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Link>,
}

impl Links {
    pub fn is_empty(&self) -> bool {
        self.self_link.is_none() && self.related.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_without_meta_is_a_bare_string() {
        let link = Link::new("/users/1");
        assert_eq!(serde_json::to_string(&link).unwrap(), r#""/users/1""#);
    }

    #[test]
    fn link_with_empty_meta_is_a_bare_string() {
        let link = Link::with_meta("/users/1", Map::new());
        assert_eq!(serde_json::to_string(&link).unwrap(), r#""/users/1""#);
    }

    #[test]
    fn link_with_meta_is_an_object() {
        let mut meta = Map::new();
        meta.insert("count".into(), json!(10));
        let link = Link::with_meta("/users", meta);
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value, json!({"href": "/users", "meta": {"count": 10}}));
    }

    #[test]
    fn decodes_both_shapes() {
        let bare: Link = serde_json::from_str(r#""/a""#).unwrap();
        assert_eq!(bare, Link::new("/a"));

        let obj: Link = serde_json::from_str(r#"{"href": "/b", "meta": {"x": 1}}"#).unwrap();
        assert_eq!(obj.href, "/b");
        assert_eq!(obj.meta.unwrap().get("x"), Some(&json!(1)));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(serde_json::from_str::<Link>("42").is_err());
        assert!(serde_json::from_str::<Link>("[\"/a\"]").is_err());
        assert!(serde_json::from_str::<Link>(r#"{"meta": {}}"#).is_err());
    }

    #[test]
    fn links_use_self_member_name() {
        let links = Links {
            self_link: Some(Link::new("/users/1")),
            related: None,
        };
        assert_eq!(
            serde_json::to_value(&links).unwrap(),
            json!({"self": "/users/1"})
        );
    }
}
