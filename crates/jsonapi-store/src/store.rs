//! The two-level client-side store: mutations and queries.
//!
//! The store keys records by `type` then `id` for O(1) lookup. Record
//! leaves hold attributes plus any extra metadata; `type` and `id` are
//! implied by the two lookup keys and never duplicated at the leaf.
//!
//! Mutations are applied through the [`Mutation`] enum and
//! [`Store::apply`], mirroring the add/update/delete reducer contract.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_json_path::JsonPath;
use tracing::warn;

use crate::error::{JsonApiError, JsonApiResult};
use crate::ident::Identifier;
use crate::norm::{Collection, Meta, NormalizedData, NormalizedItem};

/// A stored record: attributes plus any extra metadata sub-keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Attribute values.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Extra metadata sub-keys (e.g. `relationships`); never `type`/`id`.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

/// A mutation applied by the store reducer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mutation", rename_all = "snake_case")]
pub enum Mutation {
    /// Merge one item or a whole collection; last write per id wins.
    AddRecords {
        /// The normalized input to merge.
        records: NormalizedData,
    },
    /// Shallow-merge a partial item onto `[type][id]`, creating the entry
    /// if absent.
    UpdateRecord {
        /// The patch; attributes it omits survive unchanged.
        record: NormalizedItem,
    },
    /// Remove `[type][id]`; a missing entry is a no-op.
    DeleteRecord {
        /// What to remove.
        target: Identifier,
    },
}

/// The client-side cache: `type → id → record`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(flatten)]
    types: IndexMap<String, IndexMap<String, Record>>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Store::default()
    }

    /// True when no type bucket holds any record.
    pub fn is_empty(&self) -> bool {
        self.types.values().all(IndexMap::is_empty)
    }

    /// Build a store from normalized input. Items of differing types land
    /// in their respective buckets; homogeneity is not assumed.
    pub fn from_normalized(records: &NormalizedData) -> Self {
        let mut store = Store::new();
        store.add_records(records);
        store
    }

    fn insert_item(&mut self, item: &NormalizedItem) {
        let Some(id) = item.meta.id.clone() else {
            warn!(kind = %item.meta.kind, "dropping record without an id");
            return;
        };
        let record = Record {
            attributes: item.attributes.clone(),
            meta: item.meta.extra.clone(),
        };
        self.types
            .entry(item.meta.kind.clone())
            .or_insert_with(IndexMap::new)
            .insert(id, record);
    }

    /// Merge one item or a whole collection into the store.
    ///
    /// Type buckets are created on demand; an existing entry with the same
    /// id is overwritten; sibling ids are untouched. Applying the same
    /// input twice is idempotent.
    pub fn add_records(&mut self, records: &NormalizedData) {
        for item in records.items() {
            self.insert_item(item);
        }
    }

    /// Shallow-merge a partial item onto `[type][id]`.
    ///
    /// Attributes absent from the patch survive. A wholly absent entry is
    /// created rather than rejected, matching `add_records` merge
    /// semantics. A patch without an id cannot address an entry.
    pub fn update_record(&mut self, record: &NormalizedItem) -> JsonApiResult<()> {
        let id = record.meta.id.clone().ok_or_else(|| {
            JsonApiError::invalid_identifier(format!(
                "cannot update a {} record without an id",
                record.meta.kind
            ))
        })?;
        let entry = self
            .types
            .entry(record.meta.kind.clone())
            .or_insert_with(IndexMap::new)
            .entry(id)
            .or_insert_with(Record::default);
        for (key, value) in &record.attributes {
            entry.attributes.insert(key.clone(), value.clone());
        }
        for (key, value) in &record.meta.extra {
            entry.meta.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    /// Remove the entry named by `target`. A missing entry is a no-op.
    pub fn delete_record(&mut self, target: &Identifier) -> JsonApiResult<()> {
        let (kind, id) = target.resolve()?;
        let id = id.ok_or_else(|| {
            JsonApiError::invalid_identifier(format!("cannot delete {kind} without an id"))
        })?;
        if let Some(bucket) = self.types.get_mut(&kind) {
            bucket.shift_remove(&id);
        }
        Ok(())
    }

    /// Apply a mutation.
    pub fn apply(&mut self, mutation: &Mutation) -> JsonApiResult<()> {
        match mutation {
            Mutation::AddRecords { records } => {
                self.add_records(records);
                Ok(())
            }
            Mutation::UpdateRecord { record } => self.update_record(record),
            Mutation::DeleteRecord { target } => self.delete_record(target),
        }
    }

    fn item_of(&self, kind: &str, id: &str, record: &Record) -> NormalizedItem {
        NormalizedItem {
            meta: Meta {
                kind: kind.to_owned(),
                id: Some(id.to_owned()),
                extra: record.meta.clone(),
            },
            attributes: record.attributes.clone(),
        }
    }

    /// The single item at `[kind][id]`, if present.
    pub fn item(&self, kind: &str, id: &str) -> Option<NormalizedItem> {
        self.types
            .get(kind)?
            .get(id)
            .map(|record| self.item_of(kind, id, record))
    }

    /// The collection stored for `kind` (empty if the type is absent).
    pub fn collection(&self, kind: &str) -> Collection {
        self.types
            .get(kind)
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|(id, record)| (id.clone(), self.item_of(kind, id, record)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The entire store re-expressed in normalized form, keyed by type then
    /// id, each item carrying its own metadata.
    pub fn to_normalized(&self) -> IndexMap<String, Collection> {
        self.types
            .keys()
            .map(|kind| (kind.clone(), self.collection(kind)))
            .collect()
    }

    /// Targeted read per the getter contract.
    ///
    /// A `type/id` target yields the single item; a bare `type` target
    /// yields that type's collection, optionally filtered. Missing lookups
    /// yield the empty collection, never an error. The filter argument is
    /// honored only for type-level reads.
    pub fn query(
        &self,
        target: &Identifier,
        filter: Option<&str>,
    ) -> JsonApiResult<NormalizedData> {
        let (kind, id) = target.resolve()?;
        if let Some(id) = id {
            return Ok(self
                .item(&kind, &id)
                .map(NormalizedData::Item)
                .unwrap_or_else(NormalizedData::empty));
        }
        let collection = self.collection(&kind);
        match filter {
            Some(expression) => filter_collection(collection, expression),
            None => Ok(NormalizedData::Collection(collection)),
        }
    }
}

/// Evaluate a JSONPath filter over a collection's flat-form items.
///
/// The expression is applied against the array of items, then matches are
/// re-collapsed into an id-keyed mapping. Zero matches yield the empty
/// collection; exactly one match collapses to the bare item.
pub fn filter_collection(collection: Collection, expression: &str) -> JsonApiResult<NormalizedData> {
    let path = JsonPath::parse(expression)?;
    let candidates = Value::Array(
        collection
            .values()
            .map(NormalizedItem::to_flat)
            .collect::<JsonApiResult<Vec<_>>>()?,
    );
    let mut matches = Collection::new();
    for node in path.query(&candidates).all() {
        let item = NormalizedItem::from_flat(node)?;
        if let Some(id) = item.meta.id.clone() {
            matches.insert(id, item);
        }
    }
    Ok(NormalizedData::Collection(matches).collapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget1() -> NormalizedItem {
        NormalizedItem::new("widget")
            .with_id("1")
            .with_attr("foo", json!(1))
            .unwrap()
            .with_attr("bar", json!("baz"))
            .unwrap()
    }

    fn widget2() -> NormalizedItem {
        NormalizedItem::new("widget")
            .with_id("2")
            .with_attr("foo", json!(2))
            .unwrap()
    }

    fn widget_store() -> Store {
        let mut collection = Collection::new();
        collection.insert("1".to_owned(), widget1());
        collection.insert("2".to_owned(), widget2());
        Store::from_normalized(&NormalizedData::Collection(collection))
    }

    #[test]
    fn test_add_records_single_item() {
        let mut store = Store::new();
        store.add_records(&NormalizedData::Item(widget1()));
        let item = store.item("widget", "1").unwrap();
        assert_eq!(item, widget1());
    }

    #[test]
    fn test_add_records_idempotent() {
        let mut once = Store::new();
        let records = NormalizedData::Item(widget1());
        once.add_records(&records);
        let mut twice = once.clone();
        twice.add_records(&records);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_add_records_last_write_wins() {
        let mut store = widget_store();
        let replacement = NormalizedItem::new("widget")
            .with_id("1")
            .with_attr("foo", json!("new"))
            .unwrap();
        store.add_records(&NormalizedData::Item(replacement.clone()));
        assert_eq!(store.item("widget", "1").unwrap(), replacement);
        // Sibling untouched.
        assert_eq!(store.item("widget", "2").unwrap(), widget2());
    }

    #[test]
    fn test_add_records_mixed_types() {
        let mut collection = Collection::new();
        collection.insert("1".to_owned(), widget1());
        collection.insert(
            "9".to_owned(),
            NormalizedItem::new("gadget").with_id("9"),
        );
        let store = Store::from_normalized(&NormalizedData::Collection(collection));
        assert!(store.item("widget", "1").is_some());
        assert!(store.item("gadget", "9").is_some());
    }

    #[test]
    fn test_add_records_skips_item_without_id() {
        let mut store = Store::new();
        store.add_records(&NormalizedData::Item(NormalizedItem::new("widget")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_record_merges_attributes() {
        let mut store = Store::new();
        store.add_records(&NormalizedData::Item(widget1()));
        let patch = NormalizedItem::new("widget")
            .with_id("1")
            .with_attr("foo", json!("update"))
            .unwrap();
        store.update_record(&patch).unwrap();
        let merged = store.item("widget", "1").unwrap();
        assert_eq!(merged.attributes["foo"], json!("update"));
        // Unspecified attributes survive.
        assert_eq!(merged.attributes["bar"], json!("baz"));
    }

    #[test]
    fn test_update_record_creates_missing_entry() {
        let mut store = Store::new();
        let patch = NormalizedItem::new("widget")
            .with_id("1")
            .with_attr("foo", json!(1))
            .unwrap();
        store.update_record(&patch).unwrap();
        assert_eq!(store.item("widget", "1").unwrap(), patch);
    }

    #[test]
    fn test_update_record_without_id_is_invalid() {
        let mut store = Store::new();
        let err = store
            .update_record(&NormalizedItem::new("widget"))
            .unwrap_err();
        assert!(matches!(err, JsonApiError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_delete_record_by_item() {
        let mut store = widget_store();
        store
            .delete_record(&Identifier::from(&widget1()))
            .unwrap();
        assert!(store.item("widget", "1").is_none());
        assert!(store.item("widget", "2").is_some());
    }

    #[test]
    fn test_delete_record_by_path_with_leading_slash() {
        let mut store = widget_store();
        store.delete_record(&Identifier::from("/widget/1")).unwrap();
        assert!(store.item("widget", "1").is_none());
    }

    #[test]
    fn test_delete_record_missing_entry_is_noop() {
        let mut store = widget_store();
        store.delete_record(&Identifier::from("widget/99")).unwrap();
        store.delete_record(&Identifier::from("gadget/1")).unwrap();
        assert_eq!(store, widget_store());
    }

    #[test]
    fn test_apply_dispatch() {
        let mut store = Store::new();
        store
            .apply(&Mutation::AddRecords {
                records: NormalizedData::Item(widget1()),
            })
            .unwrap();
        store
            .apply(&Mutation::DeleteRecord {
                target: Identifier::from("widget/1"),
            })
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_query_whole_store() {
        let store = widget_store();
        let all = store.to_normalized();
        assert_eq!(all["widget"].len(), 2);
        assert_eq!(all["widget"]["1"], widget1());
    }

    #[test]
    fn test_query_type_collection() {
        let store = widget_store();
        let result = store.query(&Identifier::from("widget"), None).unwrap();
        let collection = result.as_collection().unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection["2"], widget2());
    }

    #[test]
    fn test_query_single_item() {
        let store = widget_store();
        let result = store.query(&Identifier::from("widget/1"), None).unwrap();
        assert_eq!(result.as_item().unwrap(), &widget1());
    }

    #[test]
    fn test_query_missing_lookups_yield_empty() {
        let store = Store::new();
        assert!(store
            .query(&Identifier::from("widget"), None)
            .unwrap()
            .is_empty());
        assert!(widget_store()
            .query(&Identifier::from("widget/99"), None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_filter_single_match_collapses() {
        let store = widget_store();
        let result = store
            .query(&Identifier::from("widget"), Some("$[?(@.bar == \"baz\")]"))
            .unwrap();
        assert_eq!(result.as_item().unwrap(), &widget1());
    }

    #[test]
    fn test_filter_multiple_matches() {
        let store = widget_store();
        let result = store
            .query(&Identifier::from("widget"), Some("$[?(@.foo)]"))
            .unwrap();
        let collection = result.as_collection().unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection["1"], widget1());
        assert_eq!(collection["2"], widget2());
    }

    #[test]
    fn test_filter_no_matches_yields_empty() {
        let store = widget_store();
        let result = store
            .query(&Identifier::from("widget"), Some("$[?(@.nosuchkey)]"))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_filter_bad_expression_is_error() {
        let err = filter_collection(Collection::new(), "$[?").unwrap_err();
        assert!(matches!(err, JsonApiError::Filter(_)));
    }

    #[test]
    fn test_store_serde_shape() {
        let store = Store::from_normalized(&NormalizedData::Item(widget1()));
        let value = serde_json::to_value(&store).unwrap();
        assert_eq!(
            value,
            json!({"widget": {"1": {"attributes": {"foo": 1, "bar": "baz"}}}})
        );
        let parsed: Store = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, store);
    }
}
