//! API server setup and configuration.

use axum::Router;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::Span;

use platforms_parser::extractor::factory::ExtractorFactory;
use platforms_parser::extractor::platforms::facebook::FacebookEndpoints;

use crate::api::routes;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::signing::LinkSigner;
use crate::utils::http_client::HttpClients;

/// Shared application state.
///
/// Everything in here is read-only for the life of the process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub signer: Arc<LinkSigner>,
    pub clients: HttpClients,
    /// Fallback extractors, sharing the relay-aware platform clients
    pub extractors: Arc<ExtractorFactory>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let clients = HttpClients::from_config(&config)?;
        let extractors = ExtractorFactory::new(
            clients.platform.clone(),
            clients.platform_no_redirect.clone(),
        )
        .with_cookies(config.platform_credential.clone());

        Ok(Self {
            signer: Arc::new(LinkSigner::new(&config.signing_secret)),
            config: Arc::new(config),
            clients,
            extractors: Arc::new(extractors),
        })
    }

    /// Point the Facebook extractor at different hosts.
    pub fn with_facebook_endpoints(mut self, endpoints: FacebookEndpoints) -> Self {
        let factory = (*self.extractors).clone().with_facebook_endpoints(endpoints);
        self.extractors = Arc::new(factory);
        self
    }
}

/// API server.
pub struct ApiServer {
    bind_address: String,
    port: u16,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self {
            bind_address: state.config.bind_address.clone(),
            port: state.config.port,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes.
    pub fn build_router(&self) -> Router {
        routes::create_router(self.state.clone()).layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    if is_health_probe(req) {
                        Span::none()
                    } else {
                        let mut make_span =
                            tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                        use tower_http::trace::MakeSpan;
                        make_span.make_span(req)
                    }
                })
                .on_request(|req: &Request, span: &Span| {
                    if span.is_disabled() || is_health_probe(req) {
                        return;
                    }
                    let mut on_request =
                        tower_http::trace::DefaultOnRequest::new().level(tracing::Level::INFO);
                    use tower_http::trace::OnRequest;
                    on_request.on_request(req, span);
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let on_response =
                            tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO);
                        use tower_http::trace::OnResponse;
                        on_response.on_response(res, latency, span);
                    },
                )
                .on_failure(
                    |class: tower_http::classify::ServerErrorsFailureClass,
                     latency: Duration,
                     span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let mut on_failure =
                            tower_http::trace::DefaultOnFailure::new().level(tracing::Level::ERROR);
                        use tower_http::trace::OnFailure;
                        on_failure.on_failure(class, latency, span);
                    },
                ),
        )
    }

    /// Start the server.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {e}")))?;

        let router = self.build_router();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Proxy listening on http://{}", addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("Proxy shutting down...");
            })
            .await?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

fn is_health_probe(req: &Request) -> bool {
    req.method() == axum::http::Method::GET && matches!(req.uri().path(), "/" | "/health")
}
