//! Swap cobalt tunnel urls for signed buffer links on this proxy.

use chrono::Utc;
use serde_json::Value;

use crate::signing::{LinkSigner, SignedLink};
use crate::upstream::UpstreamResponse;

/// Picker items whose url contains this are cobalt tunnels.
const TUNNEL_MARKER: &str = "/tunnel";

/// `{origin}/buffer?url=..&exp=..&sig=..` for a signed link.
pub fn buffer_link(origin: &str, link: &SignedLink) -> String {
    format!(
        "{}/buffer?url={}&exp={}&sig={}",
        origin.trim_end_matches('/'),
        urlencoding::encode(&link.target_url),
        link.expires_at,
        link.signature
    )
}

pub fn rewrite(response: UpstreamResponse, origin: &str, signer: &LinkSigner) -> UpstreamResponse {
    rewrite_at(response, origin, signer, Utc::now().timestamp())
}

/// Rewrite `response` with links issued at `now`.
///
/// A tunnel becomes a redirect to the buffer endpoint. In a picker, only
/// items pointing at a tunnel are replaced; order and length are kept.
/// Every other response comes back unchanged.
pub fn rewrite_at(
    response: UpstreamResponse,
    origin: &str,
    signer: &LinkSigner,
    now: i64,
) -> UpstreamResponse {
    match response {
        UpstreamResponse::Tunnel { url, rest } => UpstreamResponse::Redirect {
            url: buffer_link(origin, &signer.issue_at(&url, now)),
            rest,
        },
        UpstreamResponse::Picker { mut items, rest } => {
            for item in &mut items {
                let Some(Value::String(url)) = item.get_mut("url") else {
                    continue;
                };
                if url.contains(TUNNEL_MARKER) {
                    *url = buffer_link(origin, &signer.issue_at(url, now));
                }
            }
            UpstreamResponse::Picker { items, rest }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORIGIN: &str = "https://proxy.example.com";
    const NOW: i64 = 1_700_000_000;

    fn signer() -> LinkSigner {
        LinkSigner::new("secret")
    }

    #[test]
    fn test_buffer_link_encodes_target() {
        let link = SignedLink {
            target_url: "https://c.example/tunnel?id=a&exp=1".to_string(),
            expires_at: 42,
            signature: "0123456789abcdef".to_string(),
        };
        assert_eq!(
            buffer_link("https://proxy.example.com/", &link),
            "https://proxy.example.com/buffer?url=https%3A%2F%2Fc.example%2Ftunnel%3Fid%3Da%26exp%3D1&exp=42&sig=0123456789abcdef"
        );
    }

    #[test]
    fn test_tunnel_becomes_signed_redirect() {
        let response = UpstreamResponse::from_json(json!({
            "status": "tunnel",
            "url": "https://c.example/tunnel?id=a",
            "filename": "clip.mp4"
        }));

        let rewritten = rewrite_at(response, ORIGIN, &signer(), NOW).into_json();
        let expected_link = signer().issue_at("https://c.example/tunnel?id=a", NOW);

        assert_eq!(rewritten["status"], "redirect");
        assert_eq!(rewritten["filename"], "clip.mp4");
        assert_eq!(rewritten["url"], buffer_link(ORIGIN, &expected_link));
    }

    #[test]
    fn test_picker_rewrites_only_tunnel_items() {
        let response = UpstreamResponse::from_json(json!({
            "status": "picker",
            "picker": [
                { "type": "video", "url": "https://c.example/tunnel?id=1", "thumb": "t1" },
                { "type": "photo", "url": "https://cdn.example/photo.jpg" },
                { "type": "video" },
                { "type": "video", "url": "https://c.example/tunnel?id=2" }
            ]
        }));

        let rewritten = rewrite_at(response, ORIGIN, &signer(), NOW).into_json();
        let items = rewritten["picker"].as_array().unwrap();

        assert_eq!(rewritten["status"], "picker");
        assert_eq!(items.len(), 4);
        assert_eq!(
            items[0]["url"],
            buffer_link(ORIGIN, &signer().issue_at("https://c.example/tunnel?id=1", NOW))
        );
        assert_eq!(items[0]["thumb"], "t1");
        assert_eq!(items[1]["url"], "https://cdn.example/photo.jpg");
        assert_eq!(items[2], json!({ "type": "video" }));
        assert_eq!(
            items[3]["url"],
            buffer_link(ORIGIN, &signer().issue_at("https://c.example/tunnel?id=2", NOW))
        );
    }

    #[test]
    fn test_other_responses_unchanged() {
        for body in [
            json!({ "status": "redirect", "url": "https://c.example/tunnel?id=1" }),
            json!({ "status": "error", "error": { "code": "error.api.link.invalid" } }),
            json!({ "status": "local-processing", "tunnel": ["https://c.example/tunnel?id=1"] }),
        ] {
            let response = UpstreamResponse::from_json(body.clone());
            assert_eq!(rewrite_at(response, ORIGIN, &signer(), NOW).into_json(), body);
        }
    }
}
