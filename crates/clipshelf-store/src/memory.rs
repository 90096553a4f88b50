//! The in-memory record store.

use clipshelf_core::{record_id, BoxFuture, Record, ResourceStore, StoreError, StoreResult, ID_KEY};
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ids start above a visible floor so seeded fixtures and handed-out
/// ids never collide in demos.
const FIRST_ID: u64 = 100;

/// In-memory backing store.
///
/// One record list per resource, insertion-ordered. All trait methods
/// complete synchronously under the lock; the async surface exists so
/// the pipeline treats this store and a document database identically.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(FIRST_ID),
        }
    }

    /// Creates a store pre-populated with fixture records.
    ///
    /// Seed records keep their ids; the id counter is advanced past the
    /// largest seeded id so future inserts never collide.
    #[must_use]
    pub fn with_seed(seed: HashMap<String, Vec<Record>>) -> Self {
        let max_seeded = seed
            .values()
            .flatten()
            .filter_map(record_id)
            .max()
            .unwrap_or(0);

        Self {
            collections: RwLock::new(seed),
            next_id: AtomicU64::new(FIRST_ID.max(max_seeded + 1)),
        }
    }

    /// Returns the number of records in a resource.
    #[must_use]
    pub fn len(&self, resource: &str) -> usize {
        self.collections
            .read()
            .get(resource)
            .map_or(0, Vec::len)
    }

    /// Checks whether a resource holds no records.
    #[must_use]
    pub fn is_empty(&self, resource: &str) -> bool {
        self.len(resource) == 0
    }

    fn not_found(resource: &str, id: u64) -> StoreError {
        StoreError::NotFound {
            resource: resource.to_string(),
            id,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore for MemoryStore {
    fn find<'a>(&'a self, resource: &'a str) -> BoxFuture<'a, StoreResult<Vec<Record>>> {
        Box::pin(async move {
            let collections = self.collections.read();
            Ok(collections.get(resource).cloned().unwrap_or_default())
        })
    }

    fn find_by_id<'a>(
        &'a self,
        resource: &'a str,
        id: u64,
    ) -> BoxFuture<'a, StoreResult<Option<Record>>> {
        Box::pin(async move {
            let collections = self.collections.read();
            Ok(collections
                .get(resource)
                .and_then(|records| records.iter().find(|r| record_id(r) == Some(id)))
                .cloned())
        })
    }

    fn insert<'a>(&'a self, resource: &'a str, record: Record) -> BoxFuture<'a, StoreResult<u64>> {
        Box::pin(async move {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let mut record = record;
            record.insert(ID_KEY.to_string(), json!(id));

            let mut collections = self.collections.write();
            collections.entry(resource.to_string()).or_default().push(record);

            tracing::debug!(resource, id, "record inserted");
            Ok(id)
        })
    }

    fn replace<'a>(
        &'a self,
        resource: &'a str,
        id: u64,
        record: Record,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut record = record;
            record.insert(ID_KEY.to_string(), json!(id));

            let mut collections = self.collections.write();
            let records = collections
                .get_mut(resource)
                .ok_or_else(|| Self::not_found(resource, id))?;
            let slot = records
                .iter_mut()
                .find(|r| record_id(r) == Some(id))
                .ok_or_else(|| Self::not_found(resource, id))?;

            *slot = record;
            Ok(())
        })
    }

    fn remove<'a>(&'a self, resource: &'a str, id: u64) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let mut collections = self.collections.write();
            let records = collections
                .get_mut(resource)
                .ok_or_else(|| Self::not_found(resource, id))?;

            let before = records.len();
            records.retain(|r| record_id(r) != Some(id));
            if records.len() == before {
                return Err(Self::not_found(resource, id));
            }

            tracing::debug!(resource, id, "record removed");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_insert_assigns_monotonic_ids() {
        let store = MemoryStore::new();
        let a = store.insert("videos", record(json!({"title": "a"}))).await.unwrap();
        let b = store.insert("videos", record(json!({"title": "b"}))).await.unwrap();

        assert!(a >= FIRST_ID);
        assert_eq!(b, a + 1);
        assert_eq!(store.len("videos"), 2);
    }

    #[tokio::test]
    async fn test_find_returns_insertion_order() {
        let store = MemoryStore::new();
        for title in ["a", "b", "c"] {
            store.insert("videos", record(json!({"title": title}))).await.unwrap();
        }

        let all = store.find("videos").await.unwrap();
        let titles: Vec<_> = all.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_find_unknown_resource_is_empty() {
        let store = MemoryStore::new();
        assert!(store.find("videos").await.unwrap().is_empty());
        assert!(store.find_by_id("videos", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_callers_get_deep_copies() {
        let store = MemoryStore::new();
        let id = store.insert("videos", record(json!({"title": "a"}))).await.unwrap();

        let mut copy = store.find_by_id("videos", id).await.unwrap().unwrap();
        copy.insert("title".into(), json!("mutated"));

        let stored = store.find_by_id("videos", id).await.unwrap().unwrap();
        assert_eq!(stored["title"], json!("a"));
    }

    #[tokio::test]
    async fn test_replace_keeps_addressed_id() {
        let store = MemoryStore::new();
        let id = store.insert("videos", record(json!({"title": "a"}))).await.unwrap();

        // Even a payload claiming another id is stored under the
        // addressed one.
        store
            .replace("videos", id, record(json!({"title": "b", "id": 9999})))
            .await
            .unwrap();

        let stored = store.find_by_id("videos", id).await.unwrap().unwrap();
        assert_eq!(stored["title"], json!("b"));
        assert_eq!(stored["id"], json!(id));
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .replace("videos", 7, record(json!({"title": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryStore::new();
        let id = store.insert("videos", record(json!({"title": "a"}))).await.unwrap();

        store.remove("videos", id).await.unwrap();
        assert!(store.is_empty("videos"));

        let err = store.remove("videos", id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_seeded_store_advances_counter() {
        let mut seed = HashMap::new();
        seed.insert(
            "videos".to_string(),
            vec![record(json!({"id": 250, "title": "seeded"}))],
        );
        let store = MemoryStore::with_seed(seed);

        let id = store.insert("videos", record(json!({"title": "new"}))).await.unwrap();
        assert_eq!(id, 251);
        assert!(store.find_by_id("videos", 250).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_resources_are_isolated() {
        let store = MemoryStore::new();
        store.insert("videos", record(json!({"title": "v"}))).await.unwrap();
        store.insert("comments", record(json!({"text": "c"}))).await.unwrap();

        assert_eq!(store.len("videos"), 1);
        assert_eq!(store.len("comments"), 1);
    }
}
