// HTTP gate in front of the relay: request logging, the shared-credential
// basic-auth challenge and embedded static assets for the web clients.

use crate::interface_adapters::state::AppState;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(RustEmbed)]
#[folder = "web"]
struct WebAssets;

/// Single account accepted by the basic-auth gate; the password comes from
/// configuration.
const BASIC_AUTH_USER: &str = "admin";

/// Logs every request and challenges it for the shared credential. Sits in
/// front of all routes, the WebSocket upgrade included.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let identity = client_identity(request.headers(), peer, state.config.trust_proxy);
    info!(%identity, method = %request.method(), path = %request.uri().path(), "request");

    if credentials_valid(request.headers(), &state.config.password) {
        return next.run(request).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"teleprompter\"")],
        "authentication required",
    )
        .into_response()
}

/// Best-effort originating address: prefers `X-Forwarded-For` when running
/// behind a trusted reverse proxy, otherwise the peer address.
pub fn client_identity(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> String {
    if trust_proxy
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
    {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    peer.to_string()
}

fn credentials_valid(headers: &HeaderMap, password: &str) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(pair) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((user, pass)) = pair.split_once(':') else {
        return false;
    };
    user == BASIC_AUTH_USER && constant_time_eq(pass.as_bytes(), password.as_bytes())
}

/// Constant-time comparison using the `subtle` crate.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

/// Serves embedded web client assets with an index.html fallback.
pub async fn serve_web_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let file = if path.is_empty() { "index.html" } else { path };

    match WebAssets::get(file) {
        Some(content) => serve_embedded_file(file, content),
        None => match WebAssets::get("index.html") {
            Some(content) => serve_embedded_file("index.html", content),
            None => (StatusCode::NOT_FOUND, "web client not available").into_response(),
        },
    }
}

fn serve_embedded_file(path: &str, file: rust_embed::EmbeddedFile) -> Response {
    let mime = match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    };

    ([(header::CONTENT_TYPE, mime)], file.data).into_response()
}
