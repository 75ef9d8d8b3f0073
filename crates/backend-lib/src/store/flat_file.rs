// ============================
// crates/backend-lib/src/store/flat_file.rs
// ============================
//! Flat-file implementation of the document store.
//!
//! Layout: `<root>/<collection>/<id>.json`, one pretty-printed document per
//! file. Writes go through a temp file and a rename.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{fs as tokio_fs, sync::Mutex};
use tracing::warn;

use super::{unique_conflict, DocumentStore, ID_FIELD};
use crate::error::AppError;

/// Flat-file implementation of the DocumentStore trait
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    // serializes the read-check-write sequence of inserts and replaces
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf, AppError> {
        check_name(collection)?;
        Ok(self.root.join(collection))
    }

    fn doc_path(&self, collection: &str, id: &str) -> Result<PathBuf, AppError> {
        check_name(id)?;
        Ok(self.collection_dir(collection)?.join(format!("{id}.json")))
    }

    /// Load every document of a collection, keyed by id
    async fn read_collection(&self, collection: &str) -> Result<BTreeMap<String, Value>, AppError> {
        let dir = self.collection_dir(collection)?;
        let mut docs = BTreeMap::new();
        if !dir.exists() {
            return Ok(docs);
        }

        let mut entries = tokio_fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let content = tokio_fs::read_to_string(&path).await?;
            match serde_json::from_str(&content) {
                Ok(doc) => {
                    docs.insert(id, doc);
                },
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
            }
        }
        Ok(docs)
    }

    async fn write(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
        is_new: bool,
    ) -> Result<(), AppError> {
        let path = self.doc_path(collection, id)?;
        let _guard = self.write_lock.lock().await;

        match (is_new, path.exists()) {
            (true, true) => {
                return Err(AppError::DuplicateKey {
                    collection: collection.to_string(),
                    field: ID_FIELD.to_string(),
                })
            },
            (false, false) => return Err(AppError::NotFound(format!("{collection}/{id}"))),
            _ => {},
        }

        if !unique.is_empty() {
            let existing = self.read_collection(collection).await?;
            if let Some(field) = unique_conflict(&existing, id, &doc, unique) {
                return Err(AppError::DuplicateKey {
                    collection: collection.to_string(),
                    field,
                });
            }
        }

        // ensure directory exists
        tokio_fs::create_dir_all(self.collection_dir(collection)?).await?;

        let json = serde_json::to_string_pretty(&doc)?;
        let tmp = path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Collection names and ids become path components
fn check_name(name: &str) -> Result<(), AppError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(format!("invalid store path component: {name:?}").into())
    }
}

#[async_trait]
impl DocumentStore for FlatFileStorage {
    async fn insert(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
    ) -> Result<(), AppError> {
        self.write(collection, id, doc, unique, true).await
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        doc: Value,
        unique: &[&str],
    ) -> Result<(), AppError> {
        self.write(collection, id, doc, unique, false).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AppError> {
        let path = self.doc_path(collection, id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn find(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, AppError> {
        Ok(self
            .read_collection(collection)
            .await?
            .into_values()
            .filter(|doc| doc.get(field) == Some(value))
            .collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let path = self.doc_path(collection, id)?;
        let _guard = self.write_lock.lock().await;
        if !path.exists() {
            return Ok(false);
        }
        tokio_fs::remove_file(path).await?;
        Ok(true)
    }
}
