//! Normalized representation: flat attributes plus reserved metadata.
//!
//! A normalized item is the store-friendly rendition of a JSON:API resource:
//! attribute values at the top level and the identifying metadata tucked
//! under the reserved `_jv` key. Internally the two halves are kept as
//! separate fields so a genuine attribute can never silently collide with
//! the metadata; the flat key-mixed shape exists only at the serialization
//! boundary.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{JsonApiError, JsonApiResult};
use crate::resource::{PrimaryData, Resource};

/// Reserved metadata key in the flat wire form.
///
/// This exact key is a wire-level contract: it must never appear as a
/// genuine attribute name, and unknown sub-keys beneath it round-trip
/// unchanged.
pub const RESERVED_KEY: &str = "_jv";

/// An insertion-ordered mapping from id to normalized item.
pub type Collection = IndexMap<String, NormalizedItem>;

/// Identifying metadata of a normalized item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta {
    /// Resource type. Always present.
    pub kind: String,
    /// Resource id. Absent only for not-yet-created items; never defaulted.
    pub id: Option<String>,
    /// Metadata sub-keys beyond `type`/`id` (e.g. `relationships`).
    pub extra: Map<String, Value>,
}

impl Meta {
    /// Create metadata for the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Meta {
            kind: kind.into(),
            id: None,
            extra: Map::new(),
        }
    }

    /// Set the id (builder pattern).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The metadata object as it appears under the reserved key.
    pub(crate) fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_owned(), Value::String(self.kind.clone()));
        if let Some(id) = &self.id {
            obj.insert("id".to_owned(), Value::String(id.clone()));
        }
        for (key, value) in &self.extra {
            obj.insert(key.clone(), value.clone());
        }
        Value::Object(obj)
    }

    pub(crate) fn from_value(value: &Value) -> JsonApiResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| JsonApiError::malformed_resource("metadata must be an object"))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
            .ok_or_else(|| JsonApiError::malformed_resource("metadata missing `type`"))?
            .to_owned();
        let id = obj.get("id").and_then(Value::as_str).map(str::to_owned);
        let mut extra = Map::new();
        for (key, value) in obj {
            if key != "type" && key != "id" {
                extra.insert(key.clone(), value.clone());
            }
        }
        Ok(Meta { kind, id, extra })
    }
}

impl Serialize for Meta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Meta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Meta::from_value(&value).map_err(D::Error::custom)
    }
}

/// A single normalized item: attributes plus identifying metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedItem {
    /// Identifying metadata (serialized under [`RESERVED_KEY`]).
    pub meta: Meta,
    /// Attribute values, unchanged from the wire.
    pub attributes: Map<String, Value>,
}

impl NormalizedItem {
    /// Create an item of the given type with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        NormalizedItem {
            meta: Meta::new(kind),
            attributes: Map::new(),
        }
    }

    /// Set the id (builder pattern).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.meta.id = Some(id.into());
        self
    }

    /// Set an attribute (builder pattern). Rejects the reserved key.
    pub fn with_attr(mut self, name: impl Into<String>, value: Value) -> JsonApiResult<Self> {
        let name = name.into();
        if name == RESERVED_KEY {
            return Err(JsonApiError::reserved_attribute(name));
        }
        self.attributes.insert(name, value);
        Ok(self)
    }

    /// Normalize a single JSON:API resource.
    ///
    /// Attributes are copied verbatim; `relationships` is preserved into the
    /// extra metadata. A resource without a `type` is malformed, and a
    /// resource without an `id` yields an item without one (create flows
    /// rely on its true absence).
    pub fn from_resource(resource: &Resource) -> JsonApiResult<Self> {
        if resource.kind.is_empty() {
            return Err(JsonApiError::malformed_resource("resource missing `type`"));
        }
        if resource.attributes.contains_key(RESERVED_KEY) {
            return Err(JsonApiError::reserved_attribute(RESERVED_KEY));
        }
        let mut meta = Meta::new(resource.kind.clone());
        meta.id = resource.id.clone();
        if let Some(relationships) = &resource.relationships {
            meta.extra
                .insert("relationships".to_owned(), relationships.clone());
        }
        Ok(NormalizedItem {
            meta,
            attributes: resource.attributes.clone(),
        })
    }

    /// Denormalize back to a JSON:API resource. Exact inverse of
    /// [`from_resource`](Self::from_resource): `id` is emitted only when
    /// present.
    pub fn to_resource(&self) -> Resource {
        Resource {
            kind: self.meta.kind.clone(),
            id: self.meta.id.clone(),
            attributes: self.attributes.clone(),
            relationships: self.meta.extra.get("relationships").cloned(),
            extra: Map::new(),
        }
    }

    /// The flat wire form: attributes at top level, metadata under the
    /// reserved key.
    pub fn to_flat(&self) -> JsonApiResult<Value> {
        if self.attributes.contains_key(RESERVED_KEY) {
            return Err(JsonApiError::reserved_attribute(RESERVED_KEY));
        }
        let mut obj = self.attributes.clone();
        obj.insert(RESERVED_KEY.to_owned(), self.meta.to_value());
        Ok(Value::Object(obj))
    }

    /// Parse the flat wire form.
    pub fn from_flat(value: &Value) -> JsonApiResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| JsonApiError::malformed_resource("normalized item must be an object"))?;
        let meta_value = obj.get(RESERVED_KEY).ok_or_else(|| {
            JsonApiError::malformed_resource("normalized item missing `_jv` metadata")
        })?;
        let meta = Meta::from_value(meta_value)?;
        let mut attributes = Map::new();
        for (key, value) in obj {
            if key != RESERVED_KEY {
                attributes.insert(key.clone(), value.clone());
            }
        }
        Ok(NormalizedItem { meta, attributes })
    }
}

impl Serialize for NormalizedItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_flat().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NormalizedItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        NormalizedItem::from_flat(&value).map_err(D::Error::custom)
    }
}

/// Either a single normalized item or an id-keyed collection.
///
/// The empty collection doubles as the "no data" value: absent document
/// data and missing store lookups both yield it.
#[derive(Clone, Debug, PartialEq)]
pub enum NormalizedData {
    /// A single item, unwrapped.
    Item(NormalizedItem),
    /// A mapping from id to item.
    Collection(Collection),
}

impl NormalizedData {
    /// The empty collection.
    pub fn empty() -> Self {
        NormalizedData::Collection(Collection::new())
    }

    /// True for a collection with no entries.
    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedData::Collection(c) if c.is_empty())
    }

    /// The single item, if this is one.
    pub fn as_item(&self) -> Option<&NormalizedItem> {
        match self {
            NormalizedData::Item(item) => Some(item),
            NormalizedData::Collection(_) => None,
        }
    }

    /// The collection, if this is one.
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            NormalizedData::Item(_) => None,
            NormalizedData::Collection(collection) => Some(collection),
        }
    }

    /// All items, in order.
    pub fn items(&self) -> Vec<&NormalizedItem> {
        match self {
            NormalizedData::Item(item) => vec![item],
            NormalizedData::Collection(collection) => collection.values().collect(),
        }
    }

    /// Normalize a JSON:API document's primary data.
    ///
    /// Absent data yields the empty collection; a single resource yields the
    /// item unwrapped; an array yields a collection keyed by each item's own
    /// id (a collection member without an id is malformed).
    pub fn from_document(data: Option<&PrimaryData>) -> JsonApiResult<Self> {
        match data {
            None => Ok(NormalizedData::empty()),
            Some(PrimaryData::One(resource)) => Ok(NormalizedData::Item(
                NormalizedItem::from_resource(resource)?,
            )),
            Some(PrimaryData::Many(resources)) => {
                let mut collection = Collection::new();
                for resource in resources {
                    let item = NormalizedItem::from_resource(resource)?;
                    let id = item.meta.id.clone().ok_or_else(|| {
                        JsonApiError::malformed_resource("collection resource missing `id`")
                    })?;
                    collection.insert(id, item);
                }
                Ok(NormalizedData::Collection(collection))
            }
        }
    }

    /// Denormalize to a JSON:API document's primary data. Collections emit
    /// resources in map iteration order.
    pub fn to_document(&self) -> PrimaryData {
        match self {
            NormalizedData::Item(item) => PrimaryData::One(item.to_resource()),
            NormalizedData::Collection(collection) => PrimaryData::Many(
                collection.values().map(NormalizedItem::to_resource).collect(),
            ),
        }
    }

    /// Collapse a one-entry collection to the bare item.
    ///
    /// This is the singular-collapse convention inherited from the wire
    /// contract: get-family filter reads return an exactly-one match
    /// directly rather than wrapped in a one-entry mapping.
    pub fn collapsed(self) -> Self {
        match self {
            NormalizedData::Collection(mut collection) if collection.len() == 1 => {
                match collection.pop() {
                    Some((_, item)) => NormalizedData::Item(item),
                    None => NormalizedData::Collection(collection),
                }
            }
            other => other,
        }
    }

    /// The flat wire form: an item's flat object, or an id-keyed map of
    /// flat objects.
    pub fn to_flat(&self) -> JsonApiResult<Value> {
        match self {
            NormalizedData::Item(item) => item.to_flat(),
            NormalizedData::Collection(collection) => {
                let mut obj = Map::new();
                for (id, item) in collection {
                    obj.insert(id.clone(), item.to_flat()?);
                }
                Ok(Value::Object(obj))
            }
        }
    }

    /// Parse the flat wire form. An object carrying its own reserved key is
    /// a single item; anything else is treated as an id-keyed collection.
    pub fn from_flat(value: &Value) -> JsonApiResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| JsonApiError::malformed_resource("normalized data must be an object"))?;
        if obj.contains_key(RESERVED_KEY) {
            return Ok(NormalizedData::Item(NormalizedItem::from_flat(value)?));
        }
        let mut collection = Collection::new();
        for (id, member) in obj {
            collection.insert(id.clone(), NormalizedItem::from_flat(member)?);
        }
        Ok(NormalizedData::Collection(collection))
    }
}

impl From<NormalizedItem> for NormalizedData {
    fn from(item: NormalizedItem) -> Self {
        NormalizedData::Item(item)
    }
}

impl From<Collection> for NormalizedData {
    fn from(collection: Collection) -> Self {
        NormalizedData::Collection(collection)
    }
}

impl Serialize for NormalizedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_flat().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NormalizedData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        NormalizedData::from_flat(&value).map_err(D::Error::custom)
    }
}
