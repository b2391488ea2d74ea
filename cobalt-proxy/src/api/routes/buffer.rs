//! Buffer gateway.
//!
//! Redeems a signed link: verifies it, checks the target host against the
//! allowlist, downloads the whole target and serves it with an explicit
//! `Content-Length`. Clients that cannot handle chunked tunnel responses get
//! a plain sized download this way.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use platforms_parser::extractor::DEFAULT_UA;
use platforms_parser::extractor::platforms::facebook::{is_cdn_host, is_media_host};

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;

/// Facebook's CDN refuses generic browser agents for some assets but serves
/// its own link preview crawler.
pub const FACEBOOK_CDN_UA: &str =
    "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)";
const FACEBOOK_REFERER: &str = "https://www.facebook.com/";
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Deserialize)]
pub struct BufferQuery {
    pub url: Option<String>,
    pub exp: Option<String>,
    pub sig: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Whether a signed link may be fetched from `host`.
///
/// The signature only proves this proxy minted the link; the host check
/// keeps even a valid link from reaching anything but the upstream API and
/// Facebook.
///
/// This is an exact host comparison rather than a substring test on the
/// whole url, so `cobalt.example.com.evil.test` does not pass.
pub fn is_allowed_host(host: &str, upstream_host: &str) -> bool {
    (!upstream_host.is_empty() && host.eq_ignore_ascii_case(upstream_host)) || is_media_host(host)
}

pub async fn buffer_get(
    State(state): State<AppState>,
    query: Result<Query<BufferQuery>, QueryRejection>,
) -> ApiResult<Response> {
    // repeated or malformed keys get the same answer as missing ones
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed buffer query");
            return Err(ApiError::missing_params("url, exp and sig are required"));
        }
    };

    let (Some(target_url), Some(exp), Some(sig)) = (
        non_empty(query.url),
        non_empty(query.exp),
        non_empty(query.sig),
    ) else {
        return Err(ApiError::missing_params("url, exp and sig are required"));
    };

    if !state.signer.verify(&target_url, &exp, &sig) {
        warn!(exp = %exp, "Rejected buffer link with invalid or expired signature");
        return Err(ApiError::forbidden("Invalid or expired signature"));
    }

    let target = Url::parse(&target_url)
        .map_err(|_| ApiError::forbidden_host(format!("Unparseable target: {target_url}")))?;
    let host = target.host_str().unwrap_or_default().to_string();
    if !is_allowed_host(&host, state.config.upstream_host()) {
        warn!(host = %host, "Rejected signed buffer link to a host outside the allowlist");
        return Err(ApiError::forbidden_host(host));
    }

    let preview: String = target_url.chars().take(80).collect();
    info!(target = %preview, "Buffering download");

    let request = if is_cdn_host(&host) {
        state
            .clients
            .platform_buffer
            .get(target)
            .header(header::USER_AGENT, FACEBOOK_CDN_UA)
            .header(header::REFERER, FACEBOOK_REFERER)
    } else {
        state
            .clients
            .buffer
            .get(target)
            .header(header::USER_AGENT, DEFAULT_UA)
    };

    let upstream = request.send().await.map_err(|e| {
        warn!(host = %host, error = %e, "Buffer fetch failed");
        ApiError::bad_gateway("Buffer download failed")
    })?;

    let status = upstream.status();
    if !status.is_success() {
        warn!(host = %host, status = %status, "Buffer target returned an error status");
        return Err(ApiError::bad_gateway(format!("Upstream returned {status}")));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let content_disposition = upstream.headers().get(header::CONTENT_DISPOSITION).cloned();

    let body = upstream.bytes().await.map_err(|e| {
        warn!(host = %host, error = %e, "Buffer body read failed");
        ApiError::bad_gateway("Buffer download failed")
    })?;

    info!(
        size_mb = %format!("{:.1}", body.len() as f64 / 1024.0 / 1024.0),
        "Buffered download"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    if let Some(disposition) = content_disposition {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((StatusCode::OK, headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cobalt.example.com", true)]
    #[case("COBALT.example.com", true)]
    #[case("video.xx.fbcdn.net", true)]
    #[case("www.facebook.com", true)]
    #[case("cobalt.example.com.evil.test", false)]
    #[case("evil.test", false)]
    #[case("fbcdn.net.evil.test", false)]
    fn test_allowlist(#[case] host: &str, #[case] allowed: bool) {
        assert_eq!(is_allowed_host(host, "cobalt.example.com"), allowed);
    }

    #[test]
    fn test_empty_upstream_host_allows_nothing_extra() {
        assert!(!is_allowed_host("", ""));
    }
}
