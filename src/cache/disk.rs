//! Cache storage on the local filesystem, so cached assets survive restarts.
//!
//! Layout: one directory per cache under the root. Each entry is a pair of
//! files named by the SHA-256 of the request path: `<hash>.body` holds the
//! bytes and `<hash>.toml` the replay metadata. The metadata file is written
//! last, so an entry without one is incomplete and never matched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::{AssetRequest, AssetResponse, CacheStorage};
use crate::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    path: String,
    status: u16,
    content_type: Option<String>,
    stored_at: DateTime<Utc>,
}

/// Cache storage rooted at a directory.
///
/// Clones share one lock: a body and its metadata are replaced together and
/// never read half-replaced.
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
    entries: Arc<RwLock<()>>,
}

impl DiskCacheStorage {
    /// Creates storage rooted at `root`. Nothing is created until first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Arc::new(RwLock::new(())),
        }
    }

    /// Returns the default cache root under the user cache directory.
    #[must_use]
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gold-melt")
            .join("caches")
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }

    fn cache_dir(&self, name: &str) -> Result<PathBuf> {
        if Self::is_valid_name(name) {
            Ok(self.root.join(name))
        } else {
            Err(Error::Cache(format!("invalid cache name {name:?}")))
        }
    }

    fn entry_stem(path: &str) -> String {
        format!("{:x}", Sha256::digest(path.as_bytes()))
    }
}

/// Writes through a temp file unique to this process and call, then renames.
async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    static NEXT_TMP: AtomicU64 = AtomicU64::new(0);
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        NEXT_TMP.fetch_add(1, Ordering::Relaxed)
    ));
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(e) = tokio::fs::write(&tmp_path, contents).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.cache_dir(name)?).await?;
        Ok(())
    }

    async fn match_request(
        &self,
        name: &str,
        request: &AssetRequest,
    ) -> Result<Option<AssetResponse>> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        let dir = self.cache_dir(name)?;
        let stem = Self::entry_stem(&request.path);
        let _guard = self.entries.read().await;

        let meta = match tokio::fs::read_to_string(dir.join(format!("{stem}.toml"))).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta = toml::from_str(&meta)?;
        if meta.path != request.path {
            log::warn!("Hash collision in cache {name}: {} vs {}", meta.path, request.path);
            return Ok(None);
        }

        let body = tokio::fs::read(dir.join(format!("{stem}.body"))).await?;
        Ok(Some(AssetResponse {
            status: meta.status,
            content_type: meta.content_type,
            body: Bytes::from(body),
        }))
    }

    async fn put(
        &self,
        name: &str,
        request: &AssetRequest,
        response: &AssetResponse,
    ) -> Result<()> {
        if !request.is_cacheable() {
            return Err(Error::Cache(format!(
                "refusing to store {} {}",
                request.method, request.path
            )));
        }
        let dir = self.cache_dir(name)?;
        let stem = Self::entry_stem(&request.path);
        let meta = EntryMeta {
            path: request.path.clone(),
            status: response.status,
            content_type: response.content_type.clone(),
            stored_at: Utc::now(),
        };

        let _guard = self.entries.write().await;
        tokio::fs::create_dir_all(&dir).await?;
        write_atomic(&dir.join(format!("{stem}.body")), &response.body).await?;
        write_atomic(
            &dir.join(format!("{stem}.toml")),
            toml::to_string(&meta)?.as_bytes(),
        )
        .await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.cache_dir(name)?;
        let _guard = self.entries.write().await;
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut read_dir = match tokio::fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                if Self::is_valid_name(name) {
                    names.push(name.to_string());
                } else {
                    log::debug!("Ignoring foreign directory {name:?} in cache root");
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
