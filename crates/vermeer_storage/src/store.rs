use vermeer_error::StorageResult;

/// Metadata attached to an uploaded object.
///
/// `content_disposition` is set so browsers download full-size images with
/// a sensible filename instead of rendering them inline.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct UploadOptions {
    /// Object key, e.g. `user_1/3f2a.../1713833628000.png`.
    key: String,
    /// MIME type stored with the object.
    content_type: String,
    /// Content-Disposition header value served with the object.
    #[builder(default)]
    content_disposition: Option<String>,
}

impl UploadOptions {
    /// Options for an attachment download with the filename taken from the
    /// last key segment.
    pub fn attachment(key: impl Into<String>, content_type: impl Into<String>) -> Self {
        let key: String = key.into();
        let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
        Self {
            key,
            content_type: content_type.into(),
            content_disposition: Some(format!("attachment; filename={filename}")),
        }
    }
}

/// Destination for rendered images and their thumbnails.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under the options' key and returns the canonical
    /// storage URL.
    async fn put(&self, bytes: &[u8], options: &UploadOptions) -> StorageResult<String>;

    /// The publicly servable URL for a key, whether or not the object
    /// exists yet.
    fn public_url(&self, key: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_uses_last_key_segment_as_filename() {
        let options = UploadOptions::attachment("user_1/proj/1713833628000.png", "image/png");
        assert_eq!(
            options.content_disposition().as_deref(),
            Some("attachment; filename=1713833628000.png")
        );
        assert_eq!(options.content_type(), "image/png");
    }

    #[test]
    fn builder_defaults_to_inline_disposition() {
        let options = UploadOptionsBuilder::default()
            .key("a/b.webp")
            .content_type("image/webp")
            .build()
            .unwrap();
        assert!(options.content_disposition().is_none());
    }
}
