use crate::extractor::default::DEFAULT_UA;
use crate::media::FallbackMedia;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Base extractor shared by every platform.
///
/// Holds the page url being recovered, the (possibly relayed) client, the
/// platform's default headers and an optional cookie store built from the
/// configured platform credential. Every request created through it carries
/// those headers and cookies.
#[derive(Debug, Clone)]
pub struct Extractor {
    // url to extract from, e.g., "https://www.facebook.com/watch/?v=123"
    pub url: String,
    // name of the platform, e.g., "Facebook"
    pub platform_name: String,
    pub client: Client,
    platform_headers: HeaderMap,
    pub cookies: FxHashMap<String, String>,
}

impl Extractor {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        platform_name: S1,
        platform_url: S2,
        client: Client,
    ) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(DEFAULT_UA),
        );
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        Self {
            platform_name: platform_name.into(),
            url: platform_url.into(),
            client,
            platform_headers: default_headers,
            cookies: FxHashMap::default(),
        }
    }

    /// Set cookies from a cookie string (format: "name1=value1; name2=value2").
    ///
    /// Accepts both `;` (Cookie header) and newline (copy/paste) separators.
    /// Pairs with an empty name or value are dropped.
    pub fn set_cookies_from_string(&mut self, cookie_string: &str) {
        for part in cookie_string.split(&[';', '\n'][..]).map(str::trim) {
            if part.is_empty() {
                continue;
            }

            let Some((name, value)) = part.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }

            self.cookies.insert(name.to_owned(), value.to_owned());
        }
    }

    fn build_cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let mut cookie_string = String::with_capacity(
            self.cookies
                .iter()
                .map(|(k, v)| k.len() + 1 + v.len() + 2)
                .sum(),
        );

        for (name, value) in &self.cookies {
            if !cookie_string.is_empty() {
                cookie_string.push_str("; ");
            }
            cookie_string.push_str(name);
            cookie_string.push('=');
            cookie_string.push_str(value);
        }

        Some(cookie_string)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Create a request on `client` with the platform headers and cookies
    /// applied. Used for the redirect-less short link client.
    pub fn request_with(&self, client: &Client, method: Method, url: &str) -> RequestBuilder {
        let mut headers = self.platform_headers.clone();

        if let Some(cookie_header) = self.build_cookie_header() {
            match HeaderValue::from_str(&cookie_header) {
                Ok(value) => {
                    headers.insert(reqwest::header::COOKIE, value);
                }
                Err(e) => {
                    debug!(error = %e, "Failed to build Cookie header");
                }
            }
        }

        client.request(method, url).headers(headers)
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.request_with(&self.client, method, url)
    }
}

#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn get_extractor(&self) -> &Extractor;

    /// Try to recover a direct media url for the extractor's page url.
    ///
    /// Never fails: every network or parse problem degrades to `None`.
    async fn extract(&self) -> Option<FallbackMedia>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::default::create_client_builder;

    fn client() -> Client {
        create_client_builder().build().unwrap()
    }

    #[test]
    fn test_set_cookies_from_string() {
        let mut extractor = Extractor::new("Test", "https://example.com", client());
        extractor.set_cookies_from_string("c_user=1; xs=abc\n=skip; empty=; datr=zz");

        assert_eq!(extractor.cookies.len(), 3);
        assert_eq!(extractor.cookies.get("xs").map(String::as_str), Some("abc"));
        assert!(!extractor.cookies.contains_key("empty"));
    }

    #[test]
    fn test_request_carries_cookie_header() {
        let mut extractor = Extractor::new("Test", "https://example.com", client());
        extractor.set_cookies_from_string("c_user=1");

        let request = extractor.get("https://example.com/page").build().unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::COOKIE).unwrap(),
            "c_user=1"
        );
        assert_eq!(
            request.headers().get(reqwest::header::USER_AGENT).unwrap(),
            DEFAULT_UA
        );
    }

    #[test]
    fn test_request_without_cookies_has_no_cookie_header() {
        let extractor = Extractor::new("Test", "https://example.com", client());
        let request = extractor.get("https://example.com/page").build().unwrap();
        assert!(request.headers().get(reqwest::header::COOKIE).is_none());
    }
}
