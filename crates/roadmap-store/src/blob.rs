//! Blob store for uploaded documents
//!
//! Uploads are stored under an opaque [`FileRef`]. Downloads go through
//! time-limited signed links; issued links are cached so repeated requests
//! for the same document within a short window reuse one URL.

use crate::error::{StoreError, StoreResult};
use crate::record_store::write_atomic;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use moka::future::Cache;
use roadmap_progress::FileRef;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Default validity of a download link
pub const DEFAULT_LINK_VALIDITY: Duration = Duration::from_secs(3600);

/// Upper bound of cached links per signer
const LINK_CACHE_CAPACITY: u64 = 1024;

/// Time-limited download URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedLink {
    /// URL carrying expiry and signature as query parameters
    pub url: String,
    /// Instant after which the link is refused
    pub expires_at: DateTime<Utc>,
}

/// Document storage
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Store `bytes` under a fresh reference derived from `name`
    async fn put(&self, name: &str, bytes: &[u8]) -> StoreResult<FileRef>;

    /// Read a stored document
    async fn get(&self, file: &FileRef) -> StoreResult<Vec<u8>>;

    /// Signed, time-limited link for a stored document
    async fn resolve_download_link(&self, file: &FileRef) -> StoreResult<SignedLink>;
}

/// Issues and checks signed download links
#[derive(Debug, Clone)]
pub struct LinkSigner {
    base_url: String,
    secret: String,
    validity: Duration,
    issued: Cache<FileRef, SignedLink>,
}

impl LinkSigner {
    /// Signer for links under `base_url`
    ///
    /// Issued links are reused for half their validity, so a cached link
    /// always has at least half its window left.
    #[must_use]
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, validity: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            validity,
            issued: Cache::builder()
                .max_capacity(LINK_CACHE_CAPACITY)
                .time_to_live(validity / 2)
                .build(),
        }
    }

    /// Link validity window
    #[inline]
    #[must_use]
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Signed link for `file`, reusing a recently issued one
    pub async fn sign(&self, file: &FileRef) -> SignedLink {
        if let Some(link) = self.issued.get(file).await {
            return link;
        }
        let link = self.sign_at(file, Utc::now());
        self.issued.insert(file.clone(), link.clone()).await;
        link
    }

    /// Fresh signed link expiring one validity window after `now`
    #[must_use]
    pub fn sign_at(&self, file: &FileRef, now: DateTime<Utc>) -> SignedLink {
        let window = chrono::Duration::from_std(self.validity).unwrap_or(chrono::Duration::zero());
        let expires_at = now + window;
        let expires = expires_at.timestamp();
        let signature = self.signature(file, expires);
        SignedLink {
            url: format!(
                "{}/{}?expires={expires}&signature={signature}",
                self.base_url, file
            ),
            expires_at: Utc.timestamp_opt(expires, 0).single().unwrap_or(expires_at),
        }
    }

    /// Whether `signature` was issued for `file` and `expires` is still ahead of `now`
    #[must_use]
    pub fn verify(&self, file: &FileRef, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        now.timestamp() < expires && self.signature(file, expires) == signature
    }

    fn signature(&self, file: &FileRef, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(file.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(expires.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Replace anything outside `[A-Za-z0-9._-]` so the name is a safe path segment
fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn new_ref(name: &str) -> FileRef {
    FileRef::new(format!("{}/{}", Uuid::new_v4(), sanitize_name(name)))
}

/// Disk-backed blob store
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    signer: LinkSigner,
}

impl LocalBlobStore {
    /// Store documents under `root`, signing links with `signer`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, signer: LinkSigner) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    /// Link signer
    #[inline]
    #[must_use]
    pub fn signer(&self) -> &LinkSigner {
        &self.signer
    }

    /// Only references this store could have issued map to a path
    fn path(&self, file: &FileRef) -> StoreResult<PathBuf> {
        let not_found = || StoreError::NotFound(file.to_string());
        let (dir, name) = file.as_str().split_once('/').ok_or_else(not_found)?;
        Uuid::parse_str(dir).map_err(|_| not_found())?;
        if sanitize_name(name) != name {
            return Err(not_found());
        }
        Ok(self.root.join(dir).join(name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> StoreResult<FileRef> {
        let file = new_ref(name);
        let path = self.path(&file)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_atomic(&path, bytes).await?;
        tracing::debug!(file = %file, size = bytes.len(), "blob stored");
        Ok(file)
    }

    async fn get(&self, file: &FileRef) -> StoreResult<Vec<u8>> {
        match tokio::fs::read(self.path(file)?).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(file.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_download_link(&self, file: &FileRef) -> StoreResult<SignedLink> {
        if !tokio::fs::try_exists(self.path(file)?).await? {
            return Err(StoreError::NotFound(file.to_string()));
        }
        Ok(self.signer.sign(file).await)
    }
}

/// In-process blob store
#[derive(Debug)]
pub struct MemoryBlobStore {
    blobs: DashMap<FileRef, Vec<u8>>,
    signer: LinkSigner,
}

impl MemoryBlobStore {
    /// Empty store signing links with `signer`
    #[must_use]
    pub fn new(signer: LinkSigner) -> Self {
        Self {
            blobs: DashMap::new(),
            signer,
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(LinkSigner::new(
            "memory://blobs",
            "memory",
            DEFAULT_LINK_VALIDITY,
        ))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> StoreResult<FileRef> {
        let file = new_ref(name);
        self.blobs.insert(file.clone(), bytes.to_vec());
        Ok(file)
    }

    async fn get(&self, file: &FileRef) -> StoreResult<Vec<u8>> {
        self.blobs
            .get(file)
            .map(|b| b.value().clone())
            .ok_or_else(|| StoreError::NotFound(file.to_string()))
    }

    async fn resolve_download_link(&self, file: &FileRef) -> StoreResult<SignedLink> {
        if !self.blobs.contains_key(file) {
            return Err(StoreError::NotFound(file.to_string()));
        }
        Ok(self.signer.sign(file).await)
    }
}
