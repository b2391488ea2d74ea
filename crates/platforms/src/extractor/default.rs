use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Install the aws-lc-rs rustls provider once per process.
///
/// reqwest is built without a bundled provider, so this must run before any
/// client is constructed.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate got there first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Base client builder shared by every platform fetch.
///
/// Callers layer their own timeout and proxy settings on top.
pub fn create_client_builder() -> ClientBuilder {
    install_rustls_provider();

    Client::builder()
        .user_agent(DEFAULT_UA)
        .connect_timeout(Duration::from_secs(10))
        .tcp_nodelay(true)
}

/// Same as [`create_client_builder`] but never follows redirects, for
/// resolving short links one hop at a time.
pub fn create_no_redirect_client_builder() -> ClientBuilder {
    create_client_builder().redirect(Policy::none())
}

