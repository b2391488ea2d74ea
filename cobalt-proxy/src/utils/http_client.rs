use std::time::Duration;

use reqwest::redirect::Policy;
use tracing::warn;

use crate::config::{AppConfig, RelayConfig};
use crate::error::Result;
use platforms_parser::extractor::create_client_builder;

/// Apply `relay` to an existing `reqwest::ClientBuilder`.
///
/// - `enabled = false` => no relay, and env/system proxies are ignored too
/// - `enabled = true` + `url = Some(..)` => explicit relay (optionally with auth)
/// - an invalid relay url logs a warning and disables the relay
pub fn apply_relay_config(
    builder: reqwest::ClientBuilder,
    relay: &RelayConfig,
) -> reqwest::ClientBuilder {
    let url = match (relay.enabled, relay.url.as_deref()) {
        (true, Some(url)) => url,
        _ => return builder.no_proxy(),
    };

    match reqwest::Proxy::all(url) {
        Ok(mut proxy) => {
            if let (Some(username), Some(password)) =
                (relay.username.as_ref(), relay.password.as_ref())
            {
                proxy = proxy.basic_auth(username, password);
            }
            builder.proxy(proxy)
        }
        Err(error) => {
            warn!(
                relay_url = %url,
                error = %error,
                "Invalid relay URL; disabling relay"
            );
            builder.no_proxy()
        }
    }
}

/// Outbound clients, built once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct HttpClients {
    /// Calls to the upstream cobalt API.
    pub upstream: reqwest::Client,
    /// Direct buffer fetches (cobalt tunnels).
    pub buffer: reqwest::Client,
    /// Relay-aware client for Facebook pages and CDN redemption.
    pub platform: reqwest::Client,
    /// Same relay as `platform`, but never follows redirects.
    pub platform_no_redirect: reqwest::Client,
    /// Relay-aware client with the long buffer timeout, for CDN redemption.
    pub platform_buffer: reqwest::Client,
}

impl HttpClients {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let upstream = timed(config.upstream_timeout).no_proxy().build()?;
        let buffer = timed(config.buffer_timeout).no_proxy().build()?;

        let platform = apply_relay_config(timed(config.upstream_timeout), &config.relay).build()?;
        let platform_no_redirect = apply_relay_config(
            timed(config.upstream_timeout).redirect(Policy::none()),
            &config.relay,
        )
        .build()?;
        let platform_buffer =
            apply_relay_config(timed(config.buffer_timeout), &config.relay).build()?;

        Ok(Self {
            upstream,
            buffer,
            platform,
            platform_no_redirect,
            platform_buffer,
        })
    }
}

fn timed(timeout: Duration) -> reqwest::ClientBuilder {
    let builder = create_client_builder();
    if timeout > Duration::ZERO {
        builder.timeout(timeout)
    } else {
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn config() -> AppConfig {
        AppConfig::new(Url::parse("https://cobalt.example.com").unwrap(), "secret")
    }

    #[test]
    fn test_clients_build_without_relay() {
        assert!(HttpClients::from_config(&config()).is_ok());
    }

    #[test]
    fn test_clients_build_with_relay() {
        let mut config = config();
        config.relay = RelayConfig::with_url("http://127.0.0.1:8080").with_auth("u", "p");
        assert!(HttpClients::from_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_relay_is_disabled_not_fatal() {
        let mut config = config();
        config.relay = RelayConfig::with_url("::not a url::");
        assert!(HttpClients::from_config(&config).is_ok());
    }
}
