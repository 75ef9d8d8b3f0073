// ============================
// crates/backend-lib/src/store/mod.rs
// ============================
//! Document store abstraction.
//!
//! Models implement [`Document`] to declare their collection, indexes and
//! pre-save hook. A [`Collection`] wraps any [`DocumentStore`] backend and
//! runs the hook before every write, so a failing hook aborts the write.
use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use bson::oid::ObjectId;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::AppError;

pub mod flat_file;
pub mod memory;

pub use flat_file::FlatFileStorage;
pub use memory::MemoryStore;

/// Name of the identity field inside stored documents
pub const ID_FIELD: &str = "_id";

/// Index declared by a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: &'static str,
    pub unique: bool,
}

impl IndexSpec {
    pub const fn ascending(field: &'static str) -> Self {
        Self { field, unique: false }
    }

    pub const fn unique(field: &'static str) -> Self {
        Self { field, unique: true }
    }
}

/// A model persisted in a named collection
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Collection name
    const COLLECTION: &'static str;

    /// Store identity, `None` until the first save
    fn object_id(&self) -> Option<ObjectId>;

    fn set_object_id(&mut self, id: Option<ObjectId>);

    /// Index declarations; only unique ones are enforced by the store
    fn indexes() -> Vec<IndexSpec> {
        Vec::new()
    }

    /// Runs synchronously before every write. An error aborts the write.
    fn pre_save(&mut self, _is_new: bool) -> Result<(), AppError> {
        Ok(())
    }

    /// Identity rendered as 24 lowercase hex characters
    fn id(&self) -> Option<String> {
        self.object_id().map(|oid| oid.to_hex())
    }
}

/// Storage backend working on raw JSON documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document, enforcing uniqueness of `unique` fields
    async fn insert(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
    ) -> Result<(), AppError>;

    /// Replace an existing document, enforcing uniqueness of `unique` fields
    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
    ) -> Result<(), AppError>;

    /// Get a document by id
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError>;

    /// All documents whose `field` equals `value`, in id order
    async fn find(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, AppError>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError>;
}

/// Name of the first unique field of `doc` whose value is already held by
/// another document. Missing and null values never conflict.
pub(crate) fn unique_conflict<'a, I>(
    existing: I,
    id: &str,
    doc: &Value,
    unique: &[&str],
) -> Option<String>
where
    I: IntoIterator<Item = (&'a String, &'a Value)> + Clone,
{
    unique.iter().find_map(|field| {
        let value = doc.get(*field).filter(|v| !v.is_null())?;
        existing
            .clone()
            .into_iter()
            .any(|(other_id, other)| other_id != id && other.get(*field) == Some(value))
            .then(|| (*field).to_string())
    })
}

/// Typed view over one collection of a [`DocumentStore`]
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    fn unique_fields() -> Vec<&'static str> {
        T::indexes()
            .into_iter()
            .filter(|index| index.unique)
            .map(|index| index.field)
            .collect()
    }

    /// Run the pre-save hook, then insert (first save) or replace the document.
    /// A fresh id is assigned on first save and withdrawn if the write fails.
    pub async fn save(&self, doc: &mut T) -> Result<(), AppError> {
        let is_new = doc.object_id().is_none();
        doc.pre_save(is_new)?;

        let oid = doc.object_id().unwrap_or_else(ObjectId::new);
        doc.set_object_id(Some(oid));
        let id = oid.to_hex();
        debug!(collection = T::COLLECTION, %id, is_new, "saving document");

        let unique = Self::unique_fields();
        let result = match serde_json::to_value(&*doc) {
            Ok(value) if is_new => self.store.insert(T::COLLECTION, &id, value, &unique).await,
            Ok(value) => self.store.replace(T::COLLECTION, &id, value, &unique).await,
            Err(e) => Err(e.into()),
        };

        if result.is_err() && is_new {
            doc.set_object_id(None);
        }
        result
    }

    /// Look up by hex id; malformed ids find nothing
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, AppError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        self.store
            .get(T::COLLECTION, &oid.to_hex())
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(AppError::from)
    }

    /// First document whose `field` equals `value`
    pub async fn find_one(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Option<T>, AppError> {
        Ok(self.find_many(field, value).await?.into_iter().next())
    }

    /// Every document whose `field` equals `value`
    pub async fn find_many(&self, field: &str, value: impl Into<Value>) -> Result<Vec<T>, AppError> {
        let value = value.into();
        self.store
            .find(T::COLLECTION, field, &value)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(AppError::from))
            .collect()
    }

    /// Delete a saved document; unsaved documents are a no-op
    pub async fn delete(&self, doc: &T) -> Result<bool, AppError> {
        match doc.id() {
            Some(id) => self.store.delete(T::COLLECTION, &id).await,
            None => Ok(false),
        }
    }

    /// Delete every document whose `field` equals `value`
    pub async fn delete_many(&self, field: &str, value: impl Into<Value>) -> Result<usize, AppError> {
        let mut removed = 0;
        for doc in self.find_many(field, value).await? {
            if self.delete(&doc).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Serde adapter storing an optional [`ObjectId`] as its hex string
pub mod oid_hex {
    use bson::oid::ObjectId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_some(&id.to_hex()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ObjectId>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| ObjectId::parse_str(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
