//! In-process cache storage.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AssetRequest, AssetResponse, CacheStorage};
use crate::{Error, Result};

type Entries = HashMap<String, AssetResponse>;

/// Cache storage held in memory; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<BTreeMap<String, Entries>>,
}

impl MemoryCacheStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the cache called `name`, if it exists.
    pub async fn entry_count(&self, name: &str) -> Option<usize> {
        self.caches.read().await.get(name).map(HashMap::len)
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_default();
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
        Ok(self
            .caches
            .read()
            .await
            .get(name)
            .and_then(|entries| entries.get(&request.path))
            .cloned())
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
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(request.path.clone(), response.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.caches.write().await.remove(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }
}
