//! JSON-backed record collection shared by the registries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use monitor_common::{AppError, AppResult};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Records keyed by id, optionally snapshotted to a JSON file.
///
/// Every mutation rewrites the whole snapshot. A failed write rolls the
/// in-memory change back so memory and disk never disagree.
pub struct JsonCollection<T> {
    name: &'static str,
    path: Option<PathBuf>,
    records: RwLock<BTreeMap<String, T>>,
}

impl<T> JsonCollection<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Create an empty collection that is never written to disk.
    #[must_use]
    pub fn in_memory(name: &'static str) -> Self {
        Self {
            name,
            path: None,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Open a collection persisted at `path`, loading it if the file exists.
    pub async fn open(name: &'static str, path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::Storage(format!("Unable to parse {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!(collection = name, path = %path.display(), records = records.len(), "Opened collection");

        Ok(Self {
            name,
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// Get a record by id.
    pub async fn get(&self, id: &str) -> Option<T> {
        self.records.read().await.get(id).cloned()
    }

    /// All records, ordered by id.
    pub async fn all(&self) -> Vec<T> {
        self.records.read().await.values().cloned().collect()
    }

    /// Find the first record matching `predicate`.
    pub async fn find_by(&self, predicate: impl Fn(&T) -> bool + Send) -> Option<T> {
        self.records
            .read()
            .await
            .values()
            .find(|record| predicate(record))
            .cloned()
    }

    /// Insert a new record. Fails if the id is taken.
    pub async fn insert(&self, id: &str, record: T) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(AppError::Conflict(format!(
                "{} already contains a record with id {id}",
                self.name
            )));
        }

        records.insert(id.to_string(), record);
        if let Err(e) = self.persist(&records).await {
            records.remove(id);
            return Err(e);
        }
        Ok(())
    }

    /// Replace an existing record. Returns `false` if no record had that id.
    pub async fn replace(&self, id: &str, record: T) -> AppResult<bool> {
        let mut records = self.records.write().await;
        let Some(slot) = records.get_mut(id) else {
            return Ok(false);
        };

        let previous = std::mem::replace(slot, record);
        if let Err(e) = self.persist(&records).await {
            records.insert(id.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Delete a record, returning it if it existed.
    pub async fn delete(&self, id: &str) -> AppResult<Option<T>> {
        let mut records = self.records.write().await;
        let Some(removed) = records.remove(id) else {
            return Ok(None);
        };

        if let Err(e) = self.persist(&records).await {
            records.insert(id.to_string(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    /// Number of records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the collection holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn persist(&self, records: &BTreeMap<String, T>) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(records)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so a crash never leaves a truncated snapshot.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(collection = self.name, records = records.len(), "Persisted collection");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("monitor-db-{label}-{}", std::process::id()))
            .join("records.json")
    }

    #[tokio::test]
    async fn test_insert_conflict() {
        let collection = JsonCollection::<String>::in_memory("strings");
        collection.insert("a", "first".to_string()).await.unwrap();

        let err = collection.insert("a", "second".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(collection.get("a").await.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_replace_and_delete_missing() {
        let collection = JsonCollection::<String>::in_memory("strings");
        assert!(!collection.replace("x", "value".to_string()).await.unwrap());
        assert!(collection.delete("x").await.unwrap().is_none());
        assert!(collection.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let path = temp_path("reopen");
        let _ = tokio::fs::remove_file(&path).await;

        let collection = JsonCollection::<String>::open("strings", &path).await.unwrap();
        collection.insert("a", "alpha".to_string()).await.unwrap();
        collection.insert("b", "beta".to_string()).await.unwrap();
        collection.replace("a", "alpha2".to_string()).await.unwrap();
        collection.delete("b").await.unwrap();

        let reopened = JsonCollection::<String>::open("strings", &path).await.unwrap();
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.get("a").await.as_deref(), Some("alpha2"));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_rejected() {
        let path = temp_path("corrupt");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let result = JsonCollection::<String>::open("strings", &path).await;
        assert!(matches!(result, Err(AppError::Storage(_))));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
