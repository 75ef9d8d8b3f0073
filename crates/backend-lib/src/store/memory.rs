//! In-memory document store.
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{unique_conflict, DocumentStore, ID_FIELD};
use crate::error::AppError;

type Docs = BTreeMap<String, Value>;

/// Store keeping every collection in a `DashMap`. Uniqueness checks and
/// writes happen under the collection's shard lock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, Docs>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held in `collection`
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |docs| docs.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn write(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
        is_new: bool,
    ) -> Result<(), AppError> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();

        match (is_new, docs.contains_key(id)) {
            (true, true) => {
                return Err(AppError::DuplicateKey {
                    collection: collection.to_string(),
                    field: ID_FIELD.to_string(),
                })
            },
            (false, false) => return Err(AppError::NotFound(format!("{collection}/{id}"))),
            _ => {},
        }

        if let Some(field) = unique_conflict(docs.iter(), id, &doc, unique) {
            return Err(AppError::DuplicateKey {
                collection: collection.to_string(),
                field,
            });
        }

        docs.insert(id.to_string(), doc);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
    ) -> Result<(), AppError> {
        self.write(collection, id, doc, unique, true)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
    ) -> Result<(), AppError> {
        self.write(collection, id, doc, unique, false)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn find(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, AppError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        Ok(self
            .collections
            .get_mut(collection)
            .is_some_and(|mut docs| docs.remove(id).is_some()))
    }
}
