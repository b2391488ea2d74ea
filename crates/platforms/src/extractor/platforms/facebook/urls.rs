use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::utils::capture_group_1_owned;

/// Facebook page urls the fallback can work with: watch pages, reels, share
/// links, `fb.watch` short links, video and post permalinks, `story.php`.
pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:(?:www|m|web|mbasic)\.)?(?:facebook\.com/(?:watch\b|reel/|share/|story\.php|videos/|[^/?#]+/videos/|[^/?#]+/posts/)|fb\.watch/[A-Za-z0-9_-]+)",
    )
    .unwrap()
});

static SHORT_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:(?:www|m|web)\.)?(?:fb\.watch/|facebook\.com/share/)")
        .unwrap()
});

// Order matters: the first pattern that matches wins.
static VIDEO_ID_PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        Regex::new(r"[?&]v=(\d+)").unwrap(),
        Regex::new(r"/videos/(?:[^/?#]+/)?(\d+)").unwrap(),
        Regex::new(r"/reel/(\d+)").unwrap(),
        Regex::new(r"/share/[vr]/([A-Za-z0-9_-]+)").unwrap(),
        Regex::new(r"[?&]story_fbid=(\d+)").unwrap(),
    ]
});

pub fn is_short_link(url: &str) -> bool {
    SHORT_LINK_REGEX.is_match(url)
}

pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| capture_group_1_owned(re, url))
}

fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.');
    host.eq_ignore_ascii_case(domain)
        || (host.len() > domain.len()
            && host.is_char_boundary(host.len() - domain.len() - 1)
            && host[host.len() - domain.len() - 1..].eq_ignore_ascii_case(&format!(".{domain}")))
}

/// Facebook's video CDN.
pub fn is_cdn_host(host: &str) -> bool {
    host_matches(host, "fbcdn.net")
}

/// Every host the fallback extractor may hand out or fetch media from.
pub fn is_media_host(host: &str) -> bool {
    is_cdn_host(host) || host_matches(host, "facebook.com") || host_matches(host, "fb.watch")
}

/// Keep the path and query of `url` but move it onto `base`'s origin.
///
/// Used to turn a desktop or short-link-resolved url into its mobile-web
/// equivalent.
pub fn rewrite_origin(url: &str, base: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let mut out = base.trim_end_matches('/').to_string();
    out.push_str(parsed.path());
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    Some(out)
}
