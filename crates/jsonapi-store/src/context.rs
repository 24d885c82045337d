//! Hosting-store seam: the commit/getter contract and an in-memory adapter.

use std::sync::RwLock;

use indexmap::IndexMap;

use crate::error::{JsonApiError, JsonApiResult};
use crate::ident::Identifier;
use crate::norm::{Collection, NormalizedData};
use crate::store::{Mutation, Store};

/// Contract the action layer requires from the hosting store.
///
/// Mirrors the reducer and query halves of [`Store`]: `commit` dispatches a
/// mutation, `get` serves targeted reads, and `get_all` re-expresses the
/// entire store in normalized form.
pub trait StoreContext: Send + Sync {
    /// Apply a mutation to the underlying store.
    fn commit(&self, mutation: Mutation) -> JsonApiResult<()>;

    /// Targeted read: `type` collection or `type/id` item, optionally
    /// filtered. Missing lookups yield the empty collection.
    fn get(&self, target: &Identifier, filter: Option<&str>) -> JsonApiResult<NormalizedData>;

    /// The entire store in normalized form, keyed by type then id.
    fn get_all(&self) -> JsonApiResult<IndexMap<String, Collection>>;
}

/// In-memory context for local use and tests.
///
/// Individual commits are serialized behind an `RwLock`; no cross-commit
/// locking is provided, so concurrent actions against the same `type/id`
/// interleave last-commit-wins.
#[derive(Debug, Default)]
pub struct MemoryContext {
    store: RwLock<Store>,
}

impl MemoryContext {
    /// Create a context over an empty store.
    pub fn new() -> Self {
        MemoryContext::default()
    }

    /// Create a context over an existing store.
    pub fn with_store(store: Store) -> Self {
        MemoryContext {
            store: RwLock::new(store),
        }
    }

    /// A snapshot of the raw store.
    pub fn snapshot(&self) -> JsonApiResult<Store> {
        Ok(self
            .store
            .read()
            .map_err(|_| JsonApiError::store("store lock poisoned"))?
            .clone())
    }
}

impl StoreContext for MemoryContext {
    fn commit(&self, mutation: Mutation) -> JsonApiResult<()> {
        let mut store = self
            .store
            .write()
            .map_err(|_| JsonApiError::store("store lock poisoned"))?;
        store.apply(&mutation)
    }

    fn get(&self, target: &Identifier, filter: Option<&str>) -> JsonApiResult<NormalizedData> {
        self.store
            .read()
            .map_err(|_| JsonApiError::store("store lock poisoned"))?
            .query(target, filter)
    }

    fn get_all(&self) -> JsonApiResult<IndexMap<String, Collection>> {
        Ok(self
            .store
            .read()
            .map_err(|_| JsonApiError::store("store lock poisoned"))?
            .to_normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norm::NormalizedItem;
    use serde_json::json;

    #[test]
    fn test_commit_and_get() {
        let ctx = MemoryContext::new();
        let item = NormalizedItem::new("widget")
            .with_id("1")
            .with_attr("foo", json!(1))
            .unwrap();
        ctx.commit(Mutation::AddRecords {
            records: NormalizedData::Item(item.clone()),
        })
        .unwrap();

        let fetched = ctx.get(&Identifier::from("widget/1"), None).unwrap();
        assert_eq!(fetched.as_item().unwrap(), &item);

        let all = ctx.get_all().unwrap();
        assert_eq!(all["widget"]["1"], item);
    }

    #[test]
    fn test_get_missing_type_is_empty() {
        let ctx = MemoryContext::new();
        let fetched = ctx.get(&Identifier::from("widget"), None).unwrap();
        assert!(fetched.is_empty());
    }
}
