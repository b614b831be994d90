use crate::{ObjectStore, UploadOptions};
use std::path::{Component, Path, PathBuf};
use vermeer_error::{StorageError, StorageErrorKind, StorageResult};

/// [`ObjectStore`] writing objects under a local directory.
///
/// Keys map directly to relative paths below the root. Content type and
/// disposition are not persisted; whatever serves the directory is
/// responsible for response headers.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        let public_base: String = public_base.into();
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rejects keys that would escape the root.
    #[track_caller]
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|part| matches!(part, Component::Normal(_)));
        if !safe || key.is_empty() {
            return Err(StorageError::new(StorageErrorKind::Upload(format!(
                "refusing unsafe object key '{key}'"
            ))));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(operation: &str, path: &Path, error: &std::io::Error) -> StorageErrorKind {
    let message = format!("{operation} {}: {error}", path.display());
    match error.kind() {
        std::io::ErrorKind::NotFound => StorageErrorKind::NotFound(message),
        std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied(message),
        _ => StorageErrorKind::Io(message),
    }
}

#[async_trait::async_trait]
impl ObjectStore for FsObjectStore {
    #[tracing::instrument(skip(self, bytes), fields(key = %options.key(), bytes = bytes.len()))]
    async fn put(&self, bytes: &[u8], options: &UploadOptions) -> StorageResult<String> {
        let path = self.resolve(options.key())?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::new(io_error("create", parent, &e)))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::new(io_error("write", &path, &e)))?;
        tracing::debug!("stored object");
        Ok(format!("file://{}", path.display()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "https://cdn.example.com");
        let options = UploadOptions::attachment("user_1/proj/1.png", "image/png");

        let url = store.put(b"png-bytes", &options).await.unwrap();
        assert!(url.starts_with("file://"));

        let written = std::fs::read(dir.path().join("user_1/proj/1.png")).unwrap();
        assert_eq!(written, b"png-bytes");
        assert_eq!(
            store.public_url("user_1/proj/1.png"),
            "https://cdn.example.com/user_1/proj/1.png"
        );
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "https://cdn.example.com");
        let options = UploadOptions::attachment("../outside.png", "image/png");
        let err = store.put(b"x", &options).await.unwrap_err();
        assert!(err.to_string().contains("unsafe object key"));
    }
}
