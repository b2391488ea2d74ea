use std::sync::LazyLock;

use super::platform_extractor::PlatformExtractor;
use crate::extractor::platforms::{
    self,
    facebook::{Facebook, FacebookEndpoints},
};
use regex::Regex;
use reqwest::Client;

/// Everything a platform constructor gets from the factory.
struct ExtractorParts<'a> {
    url: String,
    client: Client,
    no_redirect_client: Client,
    cookies: Option<String>,
    facebook_endpoints: &'a FacebookEndpoints,
}

// A type alias for a thread-safe constructor function.
type ExtractorConstructor = fn(ExtractorParts<'_>) -> Box<dyn PlatformExtractor>;

struct PlatformEntry {
    regex: &'static LazyLock<Regex>,
    constructor: ExtractorConstructor,
}

macro_rules! platform_registry {
    ( $( $regex:path => $builder:expr ),+ $(,)? ) => {
        &[
            $(
                PlatformEntry {
                    regex: &$regex,
                    constructor: |parts| Box::new($builder(parts)) as Box<dyn PlatformExtractor>,
                },
            )+
        ]
    };
}

fn facebook(parts: ExtractorParts<'_>) -> Facebook {
    Facebook::new(
        parts.url,
        parts.client,
        parts.no_redirect_client,
        parts.cookies,
        parts.facebook_endpoints.clone(),
    )
}

// Static platform registry.
static PLATFORMS: &[PlatformEntry] = platform_registry![
    platforms::facebook::URL_REGEX => facebook,
];

/// A factory for creating platform-specific fallback extractors.
#[derive(Clone)]
pub struct ExtractorFactory {
    client: Client,
    no_redirect_client: Client,
    cookies: Option<String>,
    facebook_endpoints: FacebookEndpoints,
}

impl ExtractorFactory {
    /// `client` is used for page fetches, `no_redirect_client` for one-hop
    /// short link resolution. Both should share the same relay settings.
    pub fn new(client: Client, no_redirect_client: Client) -> Self {
        Self {
            client,
            no_redirect_client,
            cookies: None,
            facebook_endpoints: FacebookEndpoints::default(),
        }
    }

    /// Platform session cookies sent with every extractor request.
    pub fn with_cookies(mut self, cookies: Option<String>) -> Self {
        self.cookies = cookies.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_facebook_endpoints(mut self, endpoints: FacebookEndpoints) -> Self {
        self.facebook_endpoints = endpoints;
        self
    }

    /// Build the extractor for `url`, or `None` if no platform claims it.
    pub fn create_extractor(&self, url: &str) -> Option<Box<dyn PlatformExtractor>> {
        let platform = PLATFORMS.iter().find(|p| p.regex.is_match(url))?;
        Some((platform.constructor)(ExtractorParts {
            url: url.to_string(),
            client: self.client.clone(),
            no_redirect_client: self.no_redirect_client.clone(),
            cookies: self.cookies.clone(),
            facebook_endpoints: &self.facebook_endpoints,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::default::{create_client_builder, create_no_redirect_client_builder};
    use rstest::rstest;

    fn factory() -> ExtractorFactory {
        ExtractorFactory::new(
            create_client_builder().build().unwrap(),
            create_no_redirect_client_builder().build().unwrap(),
        )
        .with_cookies(Some("c_user=1; xs=2".to_string()))
    }

    #[rstest]
    #[case("https://www.facebook.com/watch/?v=123", true)]
    #[case("https://fb.watch/abcDEF/", true)]
    #[case("https://m.facebook.com/reel/987", true)]
    #[case("https://www.youtube.com/watch?v=123", false)]
    #[case("https://example.com/facebook.com/watch", false)]
    fn test_create_extractor(#[case] url: &str, #[case] supported: bool) {
        let extractor = factory().create_extractor(url);
        assert_eq!(extractor.is_some(), supported);
        if let Some(extractor) = extractor {
            let base = extractor.get_extractor();
            assert_eq!(base.platform_name, Facebook::PLATFORM_NAME);
            assert_eq!(base.url, url);
            assert_eq!(base.cookies.len(), 2);
        }
    }

    #[test]
    fn test_blank_cookies_are_ignored() {
        let factory = factory().with_cookies(Some("   ".to_string()));
        let extractor = factory
            .create_extractor("https://www.facebook.com/watch/?v=1")
            .unwrap();
        assert!(extractor.get_extractor().cookies.is_empty());
    }
}
