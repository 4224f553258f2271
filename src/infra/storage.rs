// ============================================================
// Layer 6: Blob Storage Backends
// ============================================================
// Two implementations of the BlobStore trait:
//
//   S3Store    → aws-sdk-s3. The SDK is async, the pipeline is
//                not: every call is driven to completion on a
//                private current-thread tokio runtime.
//
//   LocalStore → <root>/<bucket>/<key> on the local filesystem.
//                Keys are '/'-separated regardless of platform.

use anyhow::{bail, Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Region, primitives::ByteStream, Client};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::runtime::{Builder, Runtime};

use crate::domain::traits::BlobStore;

/// Which backend a command should talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    S3,
    Local,
}

/// Build the configured backend.
/// `root` is only used by the local backend.
pub fn open_store(kind: StorageKind, root: &Path, region: &str) -> Result<Box<dyn BlobStore>> {
    match kind {
        StorageKind::S3 => {
            tracing::info!("Using S3 storage in region {}", region);
            Ok(Box::new(S3Store::connect(region)?))
        }
        StorageKind::Local => {
            tracing::info!("Using local storage rooted at '{}'", root.display());
            Ok(Box::new(LocalStore::new(root)))
        }
    }
}

// ─── S3Store ──────────────────────────────────────────────────────────────────
pub struct S3Store {
    client:  Client,
    runtime: Runtime,
}

impl S3Store {
    /// Resolve credentials through the default AWS provider chain.
    pub fn connect(region: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Cannot start tokio runtime for S3 client")?;

        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load(),
        );

        Ok(Self { client: Client::new(&sdk_config), runtime })
    }
}

impl BlobStore for S3Store {
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        self.runtime.block_on(async {
            let mut keys  = Vec::new();
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .into_paginator()
                .send();

            while let Some(page) = pages.next().await {
                let page = page
                    .with_context(|| format!("Cannot list s3://{bucket}/{prefix}"))?;
                keys.extend(
                    page.contents()
                        .iter()
                        .filter_map(|obj| obj.key().map(str::to_string)),
                );
            }

            tracing::debug!("Listed {} keys under s3://{}/{}", keys.len(), bucket, prefix);
            Ok(keys)
        })
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let resp = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .with_context(|| format!("Cannot download s3://{bucket}/{key}"))?;

            let body = resp
                .body
                .collect()
                .await
                .with_context(|| format!("Cannot read body of s3://{bucket}/{key}"))?;

            Ok(body.into_bytes().to_vec())
        })
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.runtime.block_on(async {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body))
                .send()
                .await
                .with_context(|| format!("Cannot upload s3://{bucket}/{key}"))?;
            tracing::debug!("Uploaded s3://{}/{}", bucket, key);
            Ok(())
        })
    }
}

// ─── LocalStore ───────────────────────────────────────────────────────────────
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.join(bucket), |path, part| path.join(part))
    }
}

impl BlobStore for LocalStore {
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_dir = self.root.join(bucket);
        if !bucket_dir.is_dir() {
            bail!("Bucket directory '{}' does not exist", bucket_dir.display());
        }

        let mut keys = Vec::new();
        collect_keys(&bucket_dir, "", &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key);
        fs::read(&path).with_context(|| format!("Cannot read object '{}'", path.display()))
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key);
        // Folder markers become plain directories
        if key.ends_with('/') {
            fs::create_dir_all(&path)?;
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, body).with_context(|| format!("Cannot write object '{}'", path.display()))
    }
}

/// Recursively gather file paths below `dir` as '/'-joined keys.
fn collect_keys(dir: &Path, key_prefix: &str, keys: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Cannot read '{}'", dir.display()))? {
        let entry = entry?;
        let name  = entry.file_name().to_string_lossy().into_owned();
        let key   = format!("{key_prefix}{name}");

        if entry.file_type()?.is_dir() {
            collect_keys(&entry.path(), &format!("{key}/"), keys)?;
        } else {
            keys.push(key);
        }
    }
    Ok(())
}

// ─── In-memory store for tests ────────────────────────────────────────────────
#[cfg(test)]
pub mod memory {
    use super::*;
    use std::{cell::RefCell, collections::BTreeMap};

    /// BlobStore backed by a map, so tests can add folder-marker keys
    /// and count uploads without touching the filesystem.
    #[derive(Default)]
    pub struct MemoryStore {
        objects: RefCell<BTreeMap<(String, String), Vec<u8>>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
            self.objects
                .borrow_mut()
                .insert((bucket.to_string(), key.to_string()), body);
        }

        pub fn keys(&self, bucket: &str) -> Vec<String> {
            self.objects
                .borrow()
                .keys()
                .filter(|(b, _)| b == bucket)
                .map(|(_, k)| k.clone())
                .collect()
        }
    }

    impl BlobStore for MemoryStore {
        fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
            Ok(self
                .keys(bucket)
                .into_iter()
                .filter(|k| k.starts_with(prefix))
                .collect())
        }

        fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
            self.objects
                .borrow()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .with_context(|| format!("No such object {bucket}/{key}"))
        }

        fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
            self.insert(bucket, key, body);
            Ok(())
        }
    }
}
