//! Process configuration, loaded once at startup from the environment.

mod relay;

pub use relay::RelayConfig;

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BUFFER_TIMEOUT_SECS: u64 = 300;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Immutable application configuration.
///
/// Supported env vars:
/// - `COBALT_URL` (required) upstream cobalt API url
/// - `BUFFER_SECRET` (required) signing secret for buffer links
/// - `FACEBOOK_COOKIE` session cookies sent by the fallback extractor
/// - `FALLBACK_PROXY_URL`, `FALLBACK_PROXY_USERNAME`, `FALLBACK_PROXY_PASSWORD`
/// - `BIND_ADDRESS`, `PORT`
/// - `UPSTREAM_TIMEOUT_SECS`, `BUFFER_TIMEOUT_SECS`
/// - `LOG_FORMAT` (`json` or `pretty`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upstream_url: Url,
    pub signing_secret: String,
    pub platform_credential: Option<String>,
    pub relay: RelayConfig,
    pub bind_address: String,
    pub port: u16,
    pub upstream_timeout: Duration,
    pub buffer_timeout: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Minimal config with every optional value at its default.
    pub fn new(upstream_url: Url, signing_secret: impl Into<String>) -> Self {
        Self {
            upstream_url,
            signing_secret: signing_secret.into(),
            platform_credential: None,
            relay: RelayConfig::disabled(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            buffer_timeout: Duration::from_secs(DEFAULT_BUFFER_TIMEOUT_SECS),
            log_format: LogFormat::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_upstream = get("COBALT_URL").ok_or_else(|| Error::config("COBALT_URL is required"))?;
        let upstream_url = Url::parse(raw_upstream.trim())
            .map_err(|e| Error::config(format!("COBALT_URL is not a valid url: {e}")))?;
        if upstream_url.host_str().is_none() {
            return Err(Error::config("COBALT_URL has no host"));
        }

        let signing_secret =
            get("BUFFER_SECRET").ok_or_else(|| Error::config("BUFFER_SECRET is required"))?;

        let mut config = Self::new(upstream_url, signing_secret);
        config.platform_credential = get("FACEBOOK_COOKIE");

        if let Some(url) = get("FALLBACK_PROXY_URL") {
            let mut relay = RelayConfig::with_url(url.trim());
            if let (Some(username), Some(password)) =
                (get("FALLBACK_PROXY_USERNAME"), get("FALLBACK_PROXY_PASSWORD"))
            {
                relay = relay.with_auth(username, password);
            }
            config.relay = relay;
        }

        if let Some(bind_address) = get("BIND_ADDRESS") {
            config.bind_address = bind_address;
        }

        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("PORT is not a valid port: {port}")))?;
        }

        if let Some(secs) = get("UPSTREAM_TIMEOUT_SECS") {
            config.upstream_timeout = parse_secs("UPSTREAM_TIMEOUT_SECS", &secs)?;
        }

        if let Some(secs) = get("BUFFER_TIMEOUT_SECS") {
            config.buffer_timeout = parse_secs("BUFFER_TIMEOUT_SECS", &secs)?;
        }

        if let Some(format) = get("LOG_FORMAT") {
            config.log_format = match format.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }

        Ok(config)
    }

    /// Host of the upstream API, used by the buffer allowlist.
    pub fn upstream_host(&self) -> &str {
        self.upstream_url.host_str().unwrap_or_default()
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::config(format!("{key} must be a whole number of seconds: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("COBALT_URL", "https://cobalt.example.com/"),
            ("BUFFER_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.upstream_host(), "cobalt.example.com");
        assert_eq!(config.signing_secret, "s3cret");
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.buffer_timeout, Duration::from_secs(300));
        assert_eq!(config.relay, RelayConfig::disabled());
        assert_eq!(config.platform_credential, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_lookup(lookup(&[
            ("COBALT_URL", "http://cobalt:9000"),
            ("BUFFER_SECRET", "s3cret"),
            ("FACEBOOK_COOKIE", "c_user=1; xs=2"),
            ("FALLBACK_PROXY_URL", "http://relay:8080"),
            ("FALLBACK_PROXY_USERNAME", "u"),
            ("FALLBACK_PROXY_PASSWORD", "p"),
            ("PORT", "8080"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.platform_credential.as_deref(), Some("c_user=1; xs=2"));
        assert_eq!(
            config.relay,
            RelayConfig::with_url("http://relay:8080").with_auth("u", "p")
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_required() {
        let err = AppConfig::from_lookup(lookup(&[("BUFFER_SECRET", "s")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = AppConfig::from_lookup(lookup(&[("COBALT_URL", "https://c.example")])).unwrap_err();
        assert!(err.to_string().contains("BUFFER_SECRET"));

        let err = AppConfig::from_lookup(lookup(&[
            ("COBALT_URL", "https://c.example"),
            ("BUFFER_SECRET", "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("BUFFER_SECRET"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(
            AppConfig::from_lookup(lookup(&[("COBALT_URL", "not a url"), ("BUFFER_SECRET", "s")]))
                .is_err()
        );
        assert!(
            AppConfig::from_lookup(lookup(&[
                ("COBALT_URL", "https://c.example"),
                ("BUFFER_SECRET", "s"),
                ("PORT", "eighty"),
            ]))
            .is_err()
        );
    }
}
