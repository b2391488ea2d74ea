//! Outbound relay (HTTP proxy) configuration value object.

/// Relay used for Facebook page fetches and CDN redemption.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelayConfig {
    /// Whether the relay is enabled.
    pub enabled: bool,
    /// Relay URL (e.g., "http://relay.example.com:8080").
    pub url: Option<String>,
    /// Username for relay authentication.
    pub username: Option<String>,
    /// Password for relay authentication.
    pub password: Option<String>,
}

impl RelayConfig {
    /// Create a disabled relay config.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Create a relay config with a URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: Some(url.into()),
            username: None,
            password: None,
        }
    }

    /// Add authentication credentials.
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_disabled() {
        let config = RelayConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.url, None);
    }

    #[test]
    fn test_relay_with_auth() {
        let config = RelayConfig::with_url("http://relay.example.com:8080").with_auth("user", "pass");
        assert!(config.enabled);
        assert_eq!(config.url.as_deref(), Some("http://relay.example.com:8080"));
        assert_eq!(config.username.as_deref(), Some("user"));
        assert_eq!(config.password.as_deref(), Some("pass"));
    }

    #[test]
    fn test_relay_without_auth() {
        let config = RelayConfig::with_url("socks5://127.0.0.1:1080");
        assert!(config.enabled);
        assert_eq!(config.username, None);
        assert_eq!(config.password, None);
    }
}
