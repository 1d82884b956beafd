//! HTTP front for the offline proxy.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use super::Gateway;
use crate::Result;
use crate::cache::{AssetRequest, AssetResponse, CacheStorage, Fetcher};

/// Largest request body forwarded to the origin.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    mode: &'static str,
    cache: Option<String>,
}

async fn api_health<C, F>(State(gateway): State<Arc<Gateway<C, F>>>) -> impl IntoResponse
where
    C: CacheStorage + 'static,
    F: Fetcher + 'static,
{
    axum::Json(HealthResponse {
        status: "ok",
        mode: gateway.mode(),
        cache: gateway.cache_name().map(str::to_string),
    })
}

async fn forward<C, F>(State(gateway): State<Arc<Gateway<C, F>>>, request: Request) -> Response
where
    C: CacheStorage + 'static,
    F: Fetcher + 'static,
{
    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => return (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()).into_response(),
    };

    let request = AssetRequest::new(parts.method, path).with_body(body);
    match gateway.handle(&request).await {
        Ok(asset) => asset_response(asset),
        Err(e) => {
            log::warn!("{} {} failed: {e}", request.method, request.path);
            (StatusCode::BAD_GATEWAY, format!("origin unavailable: {e}")).into_response()
        }
    }
}

fn asset_response(asset: AssetResponse) -> Response {
    let status = StatusCode::from_u16(asset.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::new(Body::from(asset.body));
    *response.status_mut() = status;
    if let Some(content_type) = asset.content_type
        && let Ok(value) = HeaderValue::from_str(&content_type)
    {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

/// Builds the router: `/api/health` is answered locally, everything else
/// goes through the gateway.
pub fn router<C, F>(gateway: Arc<Gateway<C, F>>) -> Router
where
    C: CacheStorage + 'static,
    F: Fetcher + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(api_health::<C, F>))
        .fallback(forward::<C, F>)
        .layer(cors)
        .with_state(gateway)
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve<C, F>(
    gateway: Arc<Gateway<C, F>>,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> Result<()>
where
    C: CacheStorage + 'static,
    F: Fetcher + 'static,
{
    let listener = TcpListener::bind((host, port)).await?;
    serve_listener(listener, gateway, shutdown).await
}

/// Serves on an already bound listener until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve_listener<C, F>(
    listener: TcpListener,
    gateway: Arc<Gateway<C, F>>,
    shutdown: CancellationToken,
) -> Result<()>
where
    C: CacheStorage + 'static,
    F: Fetcher + 'static,
{
    log::info!(
        "Proxy listening on http://{} ({})",
        listener.local_addr()?,
        gateway.mode()
    );
    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    log::info!("Proxy stopped");
    Ok(())
}
