use regex::Regex;

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[inline]
pub fn capture_group_1_owned(re: &Regex, input: &str) -> Option<String> {
    capture_group_1(re, input).map(ToOwned::to_owned)
}

/// Undo JSON string escaping on a value lifted out of raw HTML.
///
/// Values are matched without their surrounding quotes, so they are re-quoted
/// and handed to serde_json. Anything it rejects falls back to the common
/// `\/` replacement.
pub fn unescape_json_str(raw: &str) -> String {
    let quoted = format!("\"{raw}\"");
    let unescaped = serde_json::from_str::<String>(&quoted)
        .unwrap_or_else(|_| raw.replace("\\/", "/"));
    unescape_html_amp(&unescaped)
}

#[inline]
pub fn unescape_html_amp(raw: &str) -> String {
    raw.replace("&amp;", "&")
}
