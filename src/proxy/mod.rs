//! Cache-first offline proxy.
//!
//! The lifecycle is encoded in types: an [`OfflineProxy`] must be installed
//! and then activated before it becomes an [`ActiveProxy`] that can serve
//! requests.

#[cfg(feature = "proxy")]
pub mod server;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use crate::cache::{AssetRequest, AssetResponse, CacheManifest, CacheStorage, Fetcher, InstallProgress};
use crate::{Error, Result};

/// A proxy that has not populated its cache yet.
#[derive(Debug)]
pub struct OfflineProxy<C, F> {
    manifest: CacheManifest,
    storage: C,
    fetcher: F,
}

/// A proxy whose cache holds every manifest asset.
#[derive(Debug)]
pub struct InstalledProxy<C, F> {
    inner: OfflineProxy<C, F>,
}

/// A proxy serving requests cache-first.
#[derive(Debug)]
pub struct ActiveProxy<C, F> {
    inner: OfflineProxy<C, F>,
    claimed_at: DateTime<Utc>,
}

impl<C: CacheStorage, F: Fetcher> OfflineProxy<C, F> {
    pub const fn new(manifest: CacheManifest, storage: C, fetcher: F) -> Self {
        Self {
            manifest,
            storage,
            fetcher,
        }
    }

    #[must_use]
    pub const fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    /// Fetches every manifest asset and stores them all, or none.
    ///
    /// If the origin cannot deliver the full set but a complete cache of the
    /// same version already exists from an earlier run, that cache is kept
    /// and install succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or storage failure. The cache for this version
    /// is removed when storing fails part-way.
    pub async fn install(self, progress: &dyn InstallProgress) -> Result<InstalledProxy<C, F>> {
        let name = self.manifest.name.clone();
        progress.on_start(&name, self.manifest.assets.len());
        log::info!("Installing cache {name} ({} assets)", self.manifest.assets.len());

        let fetched = match self.fetch_assets(progress).await {
            Ok(fetched) => fetched,
            Err(e) => {
                if self.is_populated().await {
                    log::warn!("Install fetch failed ({e}); keeping existing cache {name}");
                    progress.on_complete(&name);
                    return Ok(InstalledProxy { inner: self });
                }
                progress.on_error(&e.to_string());
                return Err(e);
            }
        };

        if let Err(e) = self.populate(&fetched).await {
            if let Err(cleanup) = self.storage.delete(&name).await {
                log::warn!("Could not remove partial cache {name}: {cleanup}");
            }
            progress.on_error(&e.to_string());
            return Err(e);
        }

        progress.on_complete(&name);
        log::info!("Installed cache {name}");
        Ok(InstalledProxy { inner: self })
    }

    async fn fetch_assets(
        &self,
        progress: &dyn InstallProgress,
    ) -> Result<Vec<(AssetRequest, AssetResponse)>> {
        let fetches = self.manifest.assets.iter().map(|path| async move {
            let request = AssetRequest::get(path.clone());
            let response = self.fetcher.fetch(&request).await?;
            if !response.is_ok() {
                return Err(Error::Install {
                    path: path.clone(),
                    status: response.status,
                });
            }
            progress.on_asset(path, response.body.len());
            Ok((request, response))
        });
        try_join_all(fetches).await
    }

    async fn populate(&self, fetched: &[(AssetRequest, AssetResponse)]) -> Result<()> {
        let name = &self.manifest.name;
        self.storage.open(name).await?;
        for (request, response) in fetched {
            self.storage.put(name, request, response).await?;
        }
        Ok(())
    }

    /// Whether the current cache already holds every manifest asset.
    async fn is_populated(&self) -> bool {
        for path in &self.manifest.assets {
            let request = AssetRequest::get(path.clone());
            match self.storage.match_request(&self.manifest.name, &request).await {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => return false,
            }
        }
        true
    }
}

impl<C: CacheStorage, F: Fetcher> InstalledProxy<C, F> {
    /// Deletes every cache from another version, then takes control.
    ///
    /// Cleanup finishes before the proxy claims anything.
    ///
    /// # Errors
    ///
    /// Returns an error if caches cannot be listed or a stale cache cannot
    /// be deleted.
    pub async fn activate(self) -> Result<ActiveProxy<C, F>> {
        let current = self.inner.manifest.name.as_str();
        let storage = &self.inner.storage;

        let stale: Vec<String> = storage
            .keys()
            .await?
            .into_iter()
            .filter(|k| k != current)
            .collect();
        try_join_all(stale.iter().map(|key| storage.delete(key))).await?;
        for key in &stale {
            log::info!("Deleted stale cache {key}");
        }

        let claimed_at = Utc::now();
        log::info!("Activated cache {current}; claiming clients");
        Ok(ActiveProxy {
            inner: self.inner,
            claimed_at,
        })
    }
}

impl<C: CacheStorage, F: Fetcher> ActiveProxy<C, F> {
    #[must_use]
    pub const fn manifest(&self) -> &CacheManifest {
        &self.inner.manifest
    }

    #[must_use]
    pub const fn storage(&self) -> &C {
        &self.inner.storage
    }

    /// When this proxy took control.
    #[must_use]
    pub const fn claimed_at(&self) -> DateTime<Utc> {
        self.claimed_at
    }

    /// Serves a request cache-first.
    ///
    /// A cached response is returned without touching the network. On a
    /// miss the origin is fetched, and successful GET responses are stored
    /// before being returned.
    ///
    /// # Errors
    ///
    /// A network failure on a cache miss is returned unchanged.
    pub async fn handle(&self, request: &AssetRequest) -> Result<AssetResponse> {
        let name = &self.inner.manifest.name;
        match self.inner.storage.match_request(name, request).await {
            Ok(Some(cached)) => {
                log::debug!("Cache hit {}", request.path);
                return Ok(cached);
            }
            Ok(None) => log::debug!("Cache miss {} {}", request.method, request.path),
            Err(e) => log::warn!("Cache lookup failed for {}: {e}", request.path),
        }

        let response = self.inner.fetcher.fetch(request).await?;
        if request.is_cacheable()
            && response.is_ok()
            && let Err(e) = self.inner.storage.put(name, request, &response).await
        {
            log::warn!("Could not cache {}: {e}", request.path);
        }
        Ok(response)
    }
}

/// Request handling for the HTTP front: offline-capable when install
/// succeeded, otherwise plain pass-through to the origin.
#[derive(Debug)]
pub enum Gateway<C, F> {
    Offline(ActiveProxy<C, F>),
    OnlineOnly(F),
}

impl<C: CacheStorage, F: Fetcher + Clone> Gateway<C, F> {
    /// Installs and activates a proxy, degrading to online-only on failure.
    pub async fn start(
        manifest: CacheManifest,
        storage: C,
        fetcher: F,
        progress: &dyn InstallProgress,
    ) -> Self {
        let fallback = fetcher.clone();
        let proxy = OfflineProxy::new(manifest, storage, fetcher);
        let active = match proxy.install(progress).await {
            Ok(installed) => installed.activate().await,
            Err(e) => Err(e),
        };
        match active {
            Ok(active) => Self::Offline(active),
            Err(e) => {
                log::warn!("Offline cache unavailable, serving online only: {e}");
                Self::OnlineOnly(fallback)
            }
        }
    }
}

impl<C: CacheStorage, F: Fetcher> Gateway<C, F> {
    /// Handles a request according to the current mode.
    ///
    /// # Errors
    ///
    /// Returns the network error when the origin cannot be reached and no
    /// cached copy exists.
    pub async fn handle(&self, request: &AssetRequest) -> Result<AssetResponse> {
        match self {
            Self::Offline(proxy) => proxy.handle(request).await,
            Self::OnlineOnly(fetcher) => fetcher.fetch(request).await,
        }
    }

    /// Short label for logs and the health endpoint.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Offline(_) => "offline-capable",
            Self::OnlineOnly(_) => "online-only",
        }
    }

    /// Name of the cache being served, if any.
    #[must_use]
    pub fn cache_name(&self) -> Option<&str> {
        match self {
            Self::Offline(proxy) => Some(&proxy.manifest().name),
            Self::OnlineOnly(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DiskCacheStorage, MemoryCacheStorage, NoProgress};
    use async_trait::async_trait;
    use reqwest::Method;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Origin double with a switchable network.
    #[derive(Debug, Default)]
    struct FakeOrigin {
        assets: Mutex<HashMap<String, AssetResponse>>,
        offline: AtomicBool,
        fetches: AtomicUsize,
    }

    impl FakeOrigin {
        fn serving(paths: &[&str]) -> Arc<Self> {
            let origin = Self::default();
            for path in paths {
                origin.serve(path, AssetResponse::new(200, format!("body of {path}")));
            }
            Arc::new(origin)
        }

        fn serve(&self, path: &str, response: AssetResponse) {
            self.assets.lock().unwrap().insert(path.to_string(), response);
        }

        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for FakeOrigin {
        async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::Network("connection refused".to_string()));
            }
            Ok(self
                .assets
                .lock()
                .unwrap()
                .get(&request.path)
                .cloned()
                .unwrap_or_else(|| AssetResponse::new(404, "not found")))
        }
    }

    fn manifest() -> CacheManifest {
        CacheManifest::new("melt-v2", ["/", "/app.js", "/styles.css"])
    }

    async fn active(
        storage: Arc<MemoryCacheStorage>,
        origin: Arc<FakeOrigin>,
    ) -> ActiveProxy<Arc<MemoryCacheStorage>, Arc<FakeOrigin>> {
        OfflineProxy::new(manifest(), storage, origin)
            .install(&NoProgress)
            .await
            .unwrap()
            .activate()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn install_populates_every_asset() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);
        OfflineProxy::new(manifest(), Arc::clone(&storage), origin)
            .install(&NoProgress)
            .await
            .unwrap();
        assert_eq!(storage.entry_count("melt-v2").await, Some(3));
    }

    #[tokio::test]
    async fn install_is_all_or_nothing() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js"]);

        let err = OfflineProxy::new(manifest(), Arc::clone(&storage), origin)
            .install(&NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Install { ref path, status: 404 } if path == "/styles.css"));
        assert_eq!(storage.entry_count("melt-v2").await, None);
    }

    #[tokio::test]
    async fn install_keeps_complete_cache_when_origin_is_down() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);
        active(Arc::clone(&storage), Arc::clone(&origin)).await;

        origin.go_offline();
        let proxy = active(Arc::clone(&storage), Arc::clone(&origin)).await;
        let cached = proxy.handle(&AssetRequest::get("/app.js")).await.unwrap();
        assert_eq!(cached.body, "body of /app.js");
    }

    #[tokio::test]
    async fn activate_removes_other_versions() {
        let storage = Arc::new(MemoryCacheStorage::new());
        storage.open("melt-v1").await.unwrap();
        storage.open("unrelated-v9").await.unwrap();
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);

        let proxy = active(Arc::clone(&storage), origin).await;
        assert_eq!(storage.keys().await.unwrap(), vec!["melt-v2"]);
        assert!(proxy.claimed_at() <= Utc::now());
    }

    #[tokio::test]
    async fn activate_on_disk_leaves_foreign_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".stray")).unwrap();
        let storage = DiskCacheStorage::new(dir.path());
        storage.open("melt-v1").await.unwrap();
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);

        let proxy = OfflineProxy::new(manifest(), storage.clone(), origin)
            .install(&NoProgress)
            .await
            .unwrap()
            .activate()
            .await
            .unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["melt-v2"]);
        assert!(dir.path().join(".stray").is_dir());
        let cached = proxy.handle(&AssetRequest::get("/styles.css")).await.unwrap();
        assert_eq!(cached.body, "body of /styles.css");
    }

    #[tokio::test]
    async fn manifest_assets_served_while_offline() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);
        let proxy = active(storage, Arc::clone(&origin)).await;
        let after_install = origin.fetch_count();

        origin.go_offline();
        for path in &proxy.manifest().assets {
            let response = proxy.handle(&AssetRequest::get(path.clone())).await.unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(response.body, format!("body of {path}"));
        }
        assert_eq!(origin.fetch_count(), after_install);
    }

    #[tokio::test]
    async fn miss_is_fetched_then_cached() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css", "/extra.png"]);
        let proxy = active(storage, Arc::clone(&origin)).await;

        let first = proxy.handle(&AssetRequest::get("/extra.png")).await.unwrap();
        assert_eq!(first.status, 200);

        origin.go_offline();
        let second = proxy.handle(&AssetRequest::get("/extra.png")).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn failed_responses_are_not_cached() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);
        let proxy = active(Arc::clone(&storage), Arc::clone(&origin)).await;

        let missing = proxy.handle(&AssetRequest::get("/missing")).await.unwrap();
        assert_eq!(missing.status, 404);
        assert_eq!(storage.entry_count("melt-v2").await, Some(3));
    }

    #[tokio::test]
    async fn non_get_is_never_cached() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css", "/submit"]);
        let proxy = active(Arc::clone(&storage), Arc::clone(&origin)).await;

        let post = AssetRequest::new(Method::POST, "/submit").with_body("x=1");
        assert_eq!(proxy.handle(&post).await.unwrap().status, 200);
        assert_eq!(storage.entry_count("melt-v2").await, Some(3));

        origin.go_offline();
        assert!(proxy.handle(&post).await.is_err());
    }

    #[tokio::test]
    async fn network_failure_on_miss_propagates() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);
        let proxy = active(storage, Arc::clone(&origin)).await;

        origin.go_offline();
        let err = proxy.handle(&AssetRequest::get("/uncached")).await.unwrap_err();
        assert!(matches!(err, Error::Network(ref msg) if msg == "connection refused"));
    }

    #[tokio::test]
    async fn gateway_degrades_to_online_only() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/"]);

        let gateway = Gateway::start(manifest(), storage, Arc::clone(&origin), &NoProgress).await;
        assert_eq!(gateway.mode(), "online-only");
        assert_eq!(gateway.handle(&AssetRequest::get("/")).await.unwrap().status, 200);

        origin.go_offline();
        assert!(gateway.handle(&AssetRequest::get("/")).await.is_err());
    }

    #[tokio::test]
    async fn gateway_offline_mode() {
        let storage = Arc::new(MemoryCacheStorage::new());
        let origin = FakeOrigin::serving(&["/", "/app.js", "/styles.css"]);

        let gateway = Gateway::start(manifest(), storage, Arc::clone(&origin), &NoProgress).await;
        assert_eq!(gateway.mode(), "offline-capable");
        origin.go_offline();
        assert_eq!(gateway.handle(&AssetRequest::get("/")).await.unwrap().status, 200);
    }
}
