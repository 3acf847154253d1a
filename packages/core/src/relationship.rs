//! Relationships and resource linkage.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ErrorObject, Result};
use crate::link::Links;

/// A `(type, id)` pair naming one resource without embedding it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    resource_type: String,
    id: String,
}

impl ResourceIdentifier {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Both members are required for linkage. A fault in a request is the
    /// client's (406); in a response it is the server's (500).
    pub fn validate(&self, response: bool) -> Result<()> {
        let problem = if self.resource_type.is_empty() {
            "resource identifier is missing its type".to_owned()
        } else if self.id.is_empty() {
            format!(
                "resource identifier of type '{}' is missing its id",
                self.resource_type
            )
        } else {
            return Ok(());
        };

        if response {
            Err(ErrorObject::internal(problem).into())
        } else {
            Err(ErrorObject::specification(problem).into())
        }
    }
}

/// Zero, one, or many resource identifiers.
///
/// The wire value may be `null`, a single identifier object, or an array; all
/// three decode to a sequence. Encoding always produces an array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResourceLinkage(Vec<ResourceIdentifier>);

impl ResourceLinkage {
    pub fn new(identifiers: Vec<ResourceIdentifier>) -> Self {
        Self(identifiers)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceIdentifier> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ResourceIdentifier> {
        self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LinkageRepr {
    Many(Vec<ResourceIdentifier>),
    One(ResourceIdentifier),
}

impl<'de> Deserialize<'de> for ResourceLinkage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let identifiers = match Option::<LinkageRepr>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(LinkageRepr::One(identifier)) => vec![identifier],
            Some(LinkageRepr::Many(identifiers)) => identifiers,
        };
        Ok(Self(identifiers))
    }
}

impl From<ResourceIdentifier> for ResourceLinkage {
    fn from(identifier: ResourceIdentifier) -> Self {
        Self(vec![identifier])
    }
}

impl FromIterator<ResourceIdentifier> for ResourceLinkage {
    fn from_iter<I: IntoIterator<Item = ResourceIdentifier>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A reference from a resource object to other resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    #[serde(default, skip_serializing_if = "ResourceLinkage::is_empty")]
    pub data: ResourceLinkage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, Value>>,
}

impl Relationship {
    pub fn to(linkage: impl Into<ResourceLinkage>) -> Self {
        Self {
            data: linkage.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self, response: bool) -> Result<()> {
        self.data.iter().try_for_each(|identifier| identifier.validate(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn linkage_accepts_a_single_object() {
        let rl: ResourceLinkage =
            serde_json::from_str(r#"{"type": "testRelationship", "id": "ID456"}"#).unwrap();
        assert_eq!(rl.len(), 1);
        assert_eq!(rl.iter().next().unwrap().id(), "ID456");
    }

    #[test]
    fn linkage_accepts_a_list() {
        let rl: ResourceLinkage = serde_json::from_str(
            r#"[
                {"type": "testRelationship", "id": "ID456"},
                {"type": "testRelationship", "id": "ID789"}
            ]"#,
        )
        .unwrap();
        assert_eq!(rl.len(), 2);
    }

    #[test]
    fn linkage_accepts_null_as_empty() {
        let rel: Relationship = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(rel.data.is_empty());
    }

    #[test]
    fn linkage_rejects_scalars() {
        assert!(serde_json::from_str::<ResourceLinkage>("\"user\"").is_err());
    }

    #[test]
    fn relationship_encodes_linkage_as_array() {
        let rel = Relationship::to(ResourceIdentifier::new("user", "1"));
        assert_eq!(
            serde_json::to_value(&rel).unwrap(),
            json!({"data": [{"type": "user", "id": "1"}]})
        );
    }

    #[test]
    fn identifiers_need_type_and_id() {
        assert!(Relationship::to(ResourceIdentifier::new("user", "")).validate(false).is_err());
        assert!(Relationship::to(ResourceIdentifier::new("", "1")).validate(false).is_err());
        assert!(Relationship::to(ResourceIdentifier::new("user", "1")).validate(false).is_ok());
    }

    #[test]
    fn identifier_faults_in_responses_are_internal() {
        let rel = Relationship::to(ResourceIdentifier::new("user", ""));
        assert_eq!(rel.validate(false).unwrap_err().status(), 406);
        assert_eq!(rel.validate(true).unwrap_err().status(), 500);
    }
}
