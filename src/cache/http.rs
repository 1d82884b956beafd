//! Network fetcher backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;

use super::{AssetRequest, AssetResponse, Fetcher};
use crate::{Error, Result};

/// Fetches request paths relative to a fixed origin.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl HttpFetcher {
    /// Creates a fetcher for `origin` (e.g. `http://127.0.0.1:8080/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the origin is not an absolute http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(origin: &str) -> Result<Self> {
        let mut origin = Url::parse(origin)
            .map_err(|e| Error::Config(format!("invalid origin {origin:?}: {e}")))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "origin must be http or https, got {}",
                origin.scheme()
            )));
        }
        // Joining relative paths needs a trailing slash on the base
        if !origin.path().ends_with('/') {
            let path = format!("{}/", origin.path());
            origin.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, origin })
    }

    /// The origin requests are resolved against.
    #[must_use]
    pub const fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolves a request path (which may carry a query) against the origin.
    ///
    /// The result always stays on the origin: same scheme, host and port, and
    /// a path under the origin path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined onto the origin or would
    /// leave it.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let url = self
            .origin
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("cannot resolve {path:?}: {e}")))?;
        let same_origin = url.scheme() == self.origin.scheme()
            && url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
            && url.path().starts_with(self.origin.path());
        if same_origin {
            Ok(url)
        } else {
            Err(Error::Config(format!("{path:?} resolves outside the origin")))
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
        let url = self.resolve(&request.path)?;
        let mut builder = self.client.request(request.method.clone(), url);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        log::debug!("Fetched {} {} -> {status}", request.method, request.path);

        Ok(AssetResponse {
            status,
            content_type,
            body,
        })
    }
}
