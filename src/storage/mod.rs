//! Payload storage port and its object_store backed implementation

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, path::Path as StoragePath};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Store/fetch/destroy of opaque payloads by uid
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Persist `data` and return its new uid
    async fn store(&self, data: Bytes) -> Result<String>;

    /// Load a payload; [`StorageError::NotFound`] if the uid is unknown
    async fn fetch(&self, uid: &str) -> Result<Bytes>;

    /// Remove a payload. Removing an unknown uid succeeds.
    async fn destroy(&self, uid: &str) -> Result<()>;
}

/// Datastore wrapping any object_store backend
///
/// Objects live under `{namespace}/{uid}` so several instances can share
/// one bucket without seeing each other's payloads.
#[derive(Clone)]
pub struct ObjectStoreDatastore {
    store: Arc<dyn ObjectStore>,
    namespace: String,
}

impl ObjectStoreDatastore {
    pub fn new(store: Arc<dyn ObjectStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// In-memory storage for testing/development
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()), namespace)
    }

    /// Filesystem storage rooted at `root`, created if missing
    pub fn local(root: &std::path::Path, namespace: impl Into<String>) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let store = object_store::local::LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store), namespace))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Object path for a uid. Only uids this store could have issued map to
    /// a path, so tokens cannot steer lookups elsewhere in the bucket.
    fn path_for(&self, uid: &str) -> Option<StoragePath> {
        let parsed = Uuid::try_parse(uid).ok()?;
        if parsed.hyphenated().to_string() != uid {
            return None;
        }
        Some(StoragePath::from(format!("{}/{}", self.namespace, uid)))
    }
}

#[async_trait]
impl Datastore for ObjectStoreDatastore {
    async fn store(&self, data: Bytes) -> Result<String> {
        let uid = Uuid::now_v7().to_string();
        let path = StoragePath::from(format!("{}/{}", self.namespace, uid));
        let size = data.len();

        self.store.put(&path, data.into()).await?;

        tracing::info!(namespace = %self.namespace, uid, size, "Stored payload");

        Ok(uid)
    }

    async fn fetch(&self, uid: &str) -> Result<Bytes> {
        let path = self
            .path_for(uid)
            .ok_or_else(|| StorageError::NotFound(uid.to_string()))?;

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound(uid.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = result.bytes().await?;

        tracing::debug!(namespace = %self.namespace, uid, size = bytes.len(), "Fetched payload");

        Ok(bytes)
    }

    async fn destroy(&self, uid: &str) -> Result<()> {
        let Some(path) = self.path_for(uid) else {
            return Ok(());
        };

        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                tracing::info!(namespace = %self.namespace, uid, "Destroyed payload");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_and_fetch() {
        let store = ObjectStoreDatastore::in_memory("images");
        let uid = store.store(Bytes::from("HELLO THERE")).await.unwrap();

        assert_eq!(store.fetch(&uid).await.unwrap(), Bytes::from("HELLO THERE"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_uid() {
        let store = ObjectStoreDatastore::in_memory("images");
        let missing = Uuid::now_v7().to_string();

        assert!(matches!(
            store.fetch(&missing).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.fetch("../../etc/passwd").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let store = ObjectStoreDatastore::in_memory("images");
        let uid = store.store(Bytes::from("x")).await.unwrap();

        store.destroy(&uid).await.unwrap();
        store.destroy(&uid).await.unwrap();
        store.destroy("not-a-uid").await.unwrap();

        assert!(matches!(store.fetch(&uid).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let shared: Arc<dyn ObjectStore> = Arc::new(object_store::memory::InMemory::new());
        let images = ObjectStoreDatastore::new(shared.clone(), "images");
        let docs = ObjectStoreDatastore::new(shared, "docs");

        let uid = images.store(Bytes::from("x")).await.unwrap();
        assert!(matches!(docs.fetch(&uid).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_filesystem() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("payloads");
        let store = ObjectStoreDatastore::local(&root, "images").unwrap();

        let uid = store.store(Bytes::from("on disk")).await.unwrap();
        assert_eq!(store.fetch(&uid).await.unwrap(), Bytes::from("on disk"));

        store.destroy(&uid).await.unwrap();
        store.destroy(&uid).await.unwrap();
    }
}
