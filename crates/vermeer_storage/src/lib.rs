//! Object storage and thumbnailing for generated images.
//!
//! The pipeline hands finished renders to an [`ObjectStore`], which is
//! deliberately minimal: put bytes under a key, get a canonical storage
//! URL back, and compose the publicly servable URL for any key. The
//! in-memory store backs tests; [`FsObjectStore`] persists to a local
//! directory for single-node deployments.

mod fs;
mod memory;
mod store;
mod thumbnail;

pub use fs::FsObjectStore;
pub use memory::{MemoryObjectStore, StoredBlob};
pub use store::{ObjectStore, UploadOptions, UploadOptionsBuilder};
pub use thumbnail::{THUMBNAIL_WIDTH, thumbnail_webp};
