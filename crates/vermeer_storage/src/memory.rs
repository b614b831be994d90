use crate::{ObjectStore, UploadOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use vermeer_error::StorageResult;

/// An object as held by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
    content_disposition: Option<String>,
}

/// In-process [`ObjectStore`] for tests and local development.
///
/// Clones share the same underlying map, so a store handed to the
/// pipeline can be inspected from the test afterwards.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    public_base: String,
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::with_public_base("memory://objects")
    }

    /// Uses `public_base` when composing public URLs.
    pub fn with_public_base(public_base: impl Into<String>) -> Self {
        let public_base: String = public_base.into();
        Self {
            public_base: public_base.trim_end_matches('/').to_string(),
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetches a stored object for assertions.
    pub async fn get(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bytes: &[u8], options: &UploadOptions) -> StorageResult<String> {
        let blob = StoredBlob {
            bytes: bytes.to_vec(),
            content_type: options.content_type().clone(),
            content_disposition: options.content_disposition().clone(),
        };
        let mut blobs = self.blobs.write().await;
        blobs.insert(options.key().clone(), blob);
        Ok(format!("{}/{}", self.public_base, options.key()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UploadOptions;

    #[tokio::test]
    async fn put_stores_bytes_and_metadata() {
        let store = MemoryObjectStore::new();
        let options = UploadOptions::attachment("u/p/1.png", "image/png");
        let url = store.put(b"png-bytes", &options).await.unwrap();
        assert_eq!(url, "memory://objects/u/p/1.png");

        let blob = store.get("u/p/1.png").await.unwrap();
        assert_eq!(blob.bytes(), b"png-bytes");
        assert_eq!(blob.content_type(), "image/png");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn public_url_uses_configured_base() {
        let store = MemoryObjectStore::with_public_base("https://cdn.example.com/");
        assert_eq!(
            store.public_url("u/p/1.webp"),
            "https://cdn.example.com/u/p/1.webp"
        );
    }
}
