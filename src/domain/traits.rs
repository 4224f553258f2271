// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The pipeline talks to object storage only through BlobStore.
//
//   - S3Store    → Amazon S3 via aws-sdk-s3
//   - LocalStore → buckets are directories on disk
//
// The application layer receives a `&dyn BlobStore`, so the
// same preprocessing and training code runs against either.

use anyhow::{Context, Result};
use std::{fs, path::Path};

// ─── BlobStore ────────────────────────────────────────────────────────────────
/// Minimal object-storage surface needed by the pipeline.
pub trait BlobStore {
    /// Every key in `bucket` starting with `prefix`, in lexicographic order.
    /// Folder markers (keys ending in `/`) are returned as-is.
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Full body of one object.
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Create or overwrite one object.
    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// Upload a local file as `key`.
    fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<()> {
        let body = fs::read(path)
            .with_context(|| format!("Cannot read '{}' for upload", path.display()))?;
        self.put_object(bucket, key, body)
    }

    /// Download `key` into a local file, creating parent directories.
    fn download_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = self.get_object(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, body)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }
}
