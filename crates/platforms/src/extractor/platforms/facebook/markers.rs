//! HTML scanners used by the Facebook strategies.
//!
//! All scanners work on raw page source; nothing here touches the network.

use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::utils::{capture_group_1, unescape_html_amp, unescape_json_str};
use crate::media::CandidateMediaUrl;

static HD_FIELD_MARKERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#""browser_native_hd_url":"([^"]+)""#).unwrap(),
        Regex::new(r#""playable_url_quality_hd":"([^"]+)""#).unwrap(),
        Regex::new(r#"hd_src"?\s*:\s*"([^"]+)""#).unwrap(),
    ]
});

static SD_FIELD_MARKERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#""browser_native_sd_url":"([^"]+)""#).unwrap(),
        Regex::new(r#""playable_url":"([^"]+)""#).unwrap(),
        Regex::new(r#"sd_src"?\s*:\s*"([^"]+)""#).unwrap(),
    ]
});

static ESCAPED_CDN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https:\\/\\/[^"\s<>']*?fbcdn\.net\\/[^"\s<>']*?\.mp4[^"\s<>']*"#).unwrap()
});

static UNESCAPED_CDN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://[^"\s<>'\\]*?fbcdn\.net/[^"\s<>'\\]*?\.mp4[^"\s<>'\\]*"#).unwrap()
});

static BITRATE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"bitrate=(\d+)").unwrap());

static VIDEO_REDIRECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="[^"]*?/video_redirect/\?src=([^"&]+)"#).unwrap()
});

const HD_URL_MARKERS: [&str; 2] = ["quality=hd", "_hd"];

fn first_field(markers: &[Regex], html: &str) -> Option<String> {
    markers.iter().find_map(|re| {
        capture_group_1(re, html)
            .map(unescape_json_str)
            .filter(|url| url.starts_with("http"))
    })
}

/// Scan for the known embedded-url fields.
///
/// Every HD field is checked before any SD field, so an HD url anywhere in
/// the document beats an SD url that appears earlier.
pub fn scan_field_markers(html: &str) -> Option<CandidateMediaUrl> {
    if let Some(url) = first_field(HD_FIELD_MARKERS.as_slice(), html) {
        return Some(CandidateMediaUrl::hd(url));
    }
    first_field(SD_FIELD_MARKERS.as_slice(), html).map(CandidateMediaUrl::sd)
}

fn bitrate_of(url: &str) -> u64 {
    capture_group_1(&BITRATE_REGEX, url)
        .and_then(|b| b.parse().ok())
        .unwrap_or(0)
}

/// Scan JSON-escaped CDN video urls (`https:\/\/...fbcdn.net\/...mp4`).
///
/// The first url carrying an HD marker wins; otherwise the one with the
/// highest `bitrate=` value, ties going to the earliest. `None` only when
/// the page has no escaped CDN urls at all.
pub fn scan_escaped_cdn(html: &str) -> Option<CandidateMediaUrl> {
    let urls: Vec<String> = ESCAPED_CDN_REGEX
        .find_iter(html)
        .map(|m| unescape_json_str(m.as_str().trim_end_matches('\\')))
        .collect();

    if let Some(hd) = urls
        .iter()
        .find(|url| HD_URL_MARKERS.iter().any(|marker| url.contains(marker)))
    {
        return Some(CandidateMediaUrl::hd(hd.clone()));
    }

    let mut best: Option<(&String, u64)> = None;
    for url in &urls {
        let bitrate = bitrate_of(url);
        if best.is_none_or(|(_, b)| bitrate > b) {
            best = Some((url, bitrate));
        }
    }
    best.map(|(url, _)| CandidateMediaUrl::sd(url.clone()))
}

/// Scan plain CDN video urls and keep the longest one, which tends to be the
/// one with the most quality parameters attached.
pub fn scan_unescaped_cdn(html: &str) -> Option<CandidateMediaUrl> {
    let mut best: Option<&str> = None;
    for m in UNESCAPED_CDN_REGEX.find_iter(html) {
        if best.is_none_or(|b| m.as_str().len() > b.len()) {
            best = Some(m.as_str());
        }
    }
    best.map(|url| CandidateMediaUrl::sd(unescape_html_amp(url)))
}

/// Full desktop scan: field markers, then escaped CDN urls, then (only if no
/// escaped url exists) plain CDN urls.
pub fn scan_desktop_page(html: &str) -> Option<CandidateMediaUrl> {
    scan_field_markers(html)
        .or_else(|| scan_escaped_cdn(html))
        .or_else(|| scan_unescaped_cdn(html))
}

/// Pull the direct url out of the basic site's `/video_redirect/?src=` link.
/// That page only ever links standard definition.
pub fn scan_video_redirect(html: &str) -> Option<CandidateMediaUrl> {
    let encoded = capture_group_1(&VIDEO_REDIRECT_REGEX, html)?;
    let decoded = urlencoding::decode(encoded).ok()?;
    decoded
        .starts_with("http")
        .then(|| CandidateMediaUrl::sd(decoded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Quality;

    #[test]
    fn test_hd_field_beats_earlier_sd_field() {
        let html = r#"{"playable_url":"https:\/\/video.fbcdn.net\/sd.mp4","x":1,"playable_url_quality_hd":"https:\/\/video.fbcdn.net\/hd.mp4"}"#;
        let candidate = scan_field_markers(html).unwrap();
        assert_eq!(candidate.quality, Quality::Hd);
        assert_eq!(candidate.url, "https://video.fbcdn.net/hd.mp4");
    }

    #[test]
    fn test_sd_field_when_no_hd() {
        let html = r#"<script>var v = {sd_src:"https://video.fbcdn.net/sd.mp4?a=1&amp;b=2",hd_src:null};</script>"#;
        let candidate = scan_field_markers(html).unwrap();
        assert_eq!(candidate, CandidateMediaUrl::sd("https://video.fbcdn.net/sd.mp4?a=1&b=2"));
    }

    #[test]
    fn test_browser_native_fields() {
        let html = r#""browser_native_sd_url":"https:\/\/a.fbcdn.net\/s.mp4","browser_native_hd_url":"https:\/\/a.fbcdn.net\/h.mp4""#;
        assert_eq!(
            scan_field_markers(html),
            Some(CandidateMediaUrl::hd("https://a.fbcdn.net/h.mp4"))
        );
    }

    #[test]
    fn test_no_field_markers() {
        assert_eq!(scan_field_markers("<html>nothing here</html>"), None);
    }

    #[test]
    fn test_escaped_cdn_prefers_hd_marker() {
        let html = r#"
            "src":"https:\/\/video.xx.fbcdn.net\/v\/low.mp4?bitrate=900000"
            "src":"https:\/\/video.xx.fbcdn.net\/v\/a_hd.mp4?bitrate=100"
        "#;
        let candidate = scan_escaped_cdn(html).unwrap();
        assert_eq!(candidate.quality, Quality::Hd);
        assert_eq!(candidate.url, "https://video.xx.fbcdn.net/v/a_hd.mp4?bitrate=100");
    }

    #[test]
    fn test_escaped_cdn_highest_bitrate_first_on_tie() {
        let html = r#"
            "https:\/\/video.fbcdn.net\/v\/one.mp4?bitrate=300"
            "https:\/\/video.fbcdn.net\/v\/two.mp4?bitrate=800"
            "https:\/\/video.fbcdn.net\/v\/three.mp4?bitrate=800"
        "#;
        let candidate = scan_escaped_cdn(html).unwrap();
        assert_eq!(candidate.url, "https://video.fbcdn.net/v/two.mp4?bitrate=800");
        assert_eq!(candidate.quality, Quality::Sd);
    }

    #[test]
    fn test_unescaped_cdn_longest_wins() {
        let html = r#"
            <video src="https://video.fbcdn.net/v/a.mp4?x=1"></video>
            <a href="https://video.fbcdn.net/v/a.mp4?x=1&amp;efg=longer"></a>
        "#;
        let candidate = scan_unescaped_cdn(html).unwrap();
        assert_eq!(candidate.url, "https://video.fbcdn.net/v/a.mp4?x=1&efg=longer");
    }

    #[test]
    fn test_desktop_skips_unescaped_when_escaped_exists() {
        let html = r#"
            "https:\/\/video.fbcdn.net\/v\/escaped.mp4"
            <a href="https://video.fbcdn.net/v/unescaped-and-much-longer.mp4?padding=xxxxxxxx"></a>
        "#;
        assert_eq!(
            scan_desktop_page(html).unwrap().url,
            "https://video.fbcdn.net/v/escaped.mp4"
        );
    }

    #[test]
    fn test_desktop_field_markers_first() {
        let html = r#"
            "playable_url":"https:\/\/video.fbcdn.net\/field.mp4"
            "https:\/\/video.fbcdn.net\/v\/a_hd.mp4"
        "#;
        assert_eq!(
            scan_desktop_page(html),
            Some(CandidateMediaUrl::sd("https://video.fbcdn.net/field.mp4"))
        );
    }

    #[test]
    fn test_video_redirect() {
        let html = r#"<a href="/video_redirect/?src=https%3A%2F%2Fvideo.fbcdn.net%2Fv%2Fb.mp4%3Foh%3D1&amp;source=media_collage">Watch</a>"#;
        assert_eq!(
            scan_video_redirect(html),
            Some(CandidateMediaUrl::sd("https://video.fbcdn.net/v/b.mp4?oh=1"))
        );
        assert_eq!(scan_video_redirect("<a href=\"/home\">Home</a>"), None);
    }
}
