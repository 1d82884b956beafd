//! Versioned asset caching: the manifest, request/response values, and the
//! storage and network capabilities the offline proxy is built on.

mod disk;
mod http;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;

use crate::Result;

pub use disk::DiskCacheStorage;
pub use http::HttpFetcher;
pub use memory::MemoryCacheStorage;

/// Identifier of the current cache version.
pub const CACHE_NAME: &str = "gold-melt-pwa-v1";

/// Assets pre-populated on install.
pub const ASSETS: [&str; 7] = [
    "/",
    "/index.html",
    "/styles.css",
    "/app.js",
    "/manifest.webmanifest",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
];

/// A cache identifier and the fixed list of paths it must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheManifest {
    pub name: String,
    pub assets: Vec<String>,
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self::new(CACHE_NAME, ASSETS)
    }
}

impl CacheManifest {
    /// Creates a manifest for `name` holding `assets`.
    #[must_use]
    pub fn new<I, A>(name: impl Into<String>, assets: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            name: name.into(),
            assets: assets.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `path` is one of the manifest assets.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.assets.iter().any(|a| a == path)
    }
}

/// A request as seen by the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub method: Method,
    /// Path plus query, e.g. `/app.js?v=2`.
    pub path: String,
    pub body: Bytes,
}

impl AssetRequest {
    /// Creates a request with an empty body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Attaches a request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Only GET requests are ever matched or stored.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }
}

/// A response body with the metadata needed to replay it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl AssetResponse {
    /// Creates a response without a content type.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Named response caches.
///
/// Lookups are exact matches on the request path and never match non-GET
/// requests.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the cache called `name`, creating it if needed.
    async fn open(&self, name: &str) -> Result<()>;

    /// Looks up `request` in the cache called `name`.
    async fn match_request(&self, name: &str, request: &AssetRequest)
    -> Result<Option<AssetResponse>>;

    /// Stores `response` for `request` in the cache called `name`.
    async fn put(&self, name: &str, request: &AssetRequest, response: &AssetResponse)
    -> Result<()>;

    /// Deletes the cache called `name`. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of every existing cache.
    async fn keys(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: CacheStorage + ?Sized> CacheStorage for Arc<T> {
    async fn open(&self, name: &str) -> Result<()> {
        (**self).open(name).await
    }

    async fn match_request(
        &self,
        name: &str,
        request: &AssetRequest,
    ) -> Result<Option<AssetResponse>> {
        (**self).match_request(name, request).await
    }

    async fn put(
        &self,
        name: &str,
        request: &AssetRequest,
        response: &AssetResponse,
    ) -> Result<()> {
        (**self).put(name, request, response).await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        (**self).delete(name).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        (**self).keys().await
    }
}

/// Network access for cache misses and install.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs `request` against the origin.
    ///
    /// A non-2xx answer is a successful fetch; only transport failures are
    /// errors.
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
        (**self).fetch(request).await
    }
}

/// Progress callbacks for the install step.
pub trait InstallProgress: Send + Sync {
    /// Called once before any asset is fetched.
    fn on_start(&self, _cache: &str, _assets: usize) {}

    /// Called when an asset has been fetched successfully.
    fn on_asset(&self, _path: &str, _bytes: usize) {}

    /// Called when install completes.
    fn on_complete(&self, _cache: &str) {}

    /// Called when install fails.
    fn on_error(&self, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl InstallProgress for NoProgress {}
