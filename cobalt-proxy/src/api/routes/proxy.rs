//! The cobalt front door.
//!
//! Forwards the client's request to cobalt, retries empty Facebook fetches
//! with the fallback extractor, and rewrites tunnel urls into signed buffer
//! links before answering.

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::error::Error;
use crate::rewrite::{buffer_link, rewrite};
use crate::upstream::UpstreamResponse;

/// `{scheme}://{host}` the client used to reach this proxy.
///
/// The scheme comes from `X-Forwarded-Proto` and defaults to https, since the
/// proxy normally sits behind a TLS terminator. The host comes from `Host`,
/// then the request target's authority (HTTP/2, absolute-form requests).
pub fn proxy_origin(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("https");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

fn json_response(status: StatusCode, body: &Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body.to_string(),
    )
        .into_response()
}

fn log_outcome(body: &Value) {
    let status = body.get("status").and_then(Value::as_str).unwrap_or_default();
    let detail = body
        .get("filename")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/error/code").and_then(Value::as_str))
        .unwrap_or_default();
    info!(status = %status, detail = %detail, "Proxied request");
}

/// Run the fallback extractor for an empty fetch, if a platform claims the
/// requested url. Returns the synthesized redirect body on success.
async fn try_fallback(state: &AppState, request: &Value, origin: &str) -> Option<Value> {
    let source_url = request.get("url").and_then(Value::as_str)?;
    let extractor = state.extractors.create_extractor(source_url)?;
    let platform = extractor.get_extractor().platform_name.to_lowercase();

    info!(platform = %platform, url = %source_url, "Upstream fetch came back empty; trying fallback");
    let Some(found) = extractor.extract().await else {
        info!(platform = %platform, url = %source_url, "Fallback exhausted");
        return None;
    };

    let link = state.signer.issue(&found.media.url);
    Some(json!({
        "status": "redirect",
        "url": buffer_link(origin, &link),
        "filename": format!("{platform}_{}.mp4", found.video_id),
    }))
}

pub async fn proxy_request(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let request: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Request body is not JSON: {e}")))?;
    let origin = proxy_origin(&headers, &uri);

    let mut upstream_request = state
        .clients
        .upstream
        .post(state.config.upstream_url.clone())
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "application/json")
        .body(body);
    // cobalt does its own API key check
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        upstream_request = upstream_request.header(header::AUTHORIZATION, auth.clone());
    }

    let upstream = upstream_request.send().await.map_err(Error::from)?;
    let status = upstream.status();
    let data: Value = upstream.json().await.map_err(Error::from)?;
    debug!(status = %status, "Upstream responded");

    let response = UpstreamResponse::from_json(data);
    if response.is_fetch_empty()
        && let Some(redirect) = try_fallback(&state, &request, &origin).await
    {
        log_outcome(&redirect);
        return Ok(json_response(StatusCode::OK, &redirect));
    }

    let body = rewrite(response, &origin, &state.signer).into_json();
    log_outcome(&body);
    Ok(json_response(status, &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn test_proxy_origin_defaults_to_https() {
        assert_eq!(
            proxy_origin(&headers(&[("host", "proxy.example.com")]), &Uri::from_static("/")),
            "https://proxy.example.com"
        );
    }

    #[test]
    fn test_proxy_origin_forwarded_proto() {
        assert_eq!(
            proxy_origin(&headers(&[
                ("host", "127.0.0.1:3000"),
                ("x-forwarded-proto", "http, https")
            ]), &Uri::from_static("/")),
            "http://127.0.0.1:3000"
        );
    }

    #[test]
    fn test_proxy_origin_without_host() {
        assert_eq!(
            proxy_origin(&HeaderMap::new(), &Uri::from_static("/")),
            "https://localhost"
        );
    }

    #[test]
    fn test_proxy_origin_uses_request_authority_without_host() {
        let uri = Uri::from_static("https://proxy.example.com:8443/");
        assert_eq!(
            proxy_origin(&HeaderMap::new(), &uri),
            "https://proxy.example.com:8443"
        );
        // an explicit Host still wins
        assert_eq!(
            proxy_origin(&headers(&[("host", "front.example.com")]), &uri),
            "https://front.example.com"
        );
    }
}
