//! JSON:API wire-format types.
//!
//! These model the resource-object shape of the JSON:API specification:
//! `type`, optional `id`, an `attributes` mapping, and pass-through
//! `relationships`. Unrecognized document members (`links`, `meta`, ...)
//! round-trip through flattened extra maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON:API resource object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource type. Always present.
    #[serde(rename = "type")]
    pub kind: String,

    /// Resource id. Absent only for not-yet-created resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Attribute values, passed through unchanged (no coercion).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,

    /// Relationship objects, not deeply modeled beyond pass-through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,

    /// Unrecognized members carried through verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// Create a resource of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Resource {
            kind: kind.into(),
            ..Resource::default()
        }
    }

    /// Set the id (builder pattern).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set an attribute (builder pattern).
    pub fn with_attr(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// The `data` member of a JSON:API document: one resource or an ordered
/// sequence of resources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// A single resource object.
    One(Resource),
    /// An ordered sequence of resource objects.
    Many(Vec<Resource>),
}

/// A JSON:API document body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Primary data. Absent for bodiless responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,

    /// Other top-level members (`meta`, `links`, `included`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
