use cobalt_proxy::api::{ApiServer, AppState};
use cobalt_proxy::config::AppConfig;
use cobalt_proxy::logging;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // logging is not up yet; the filter needs the config's format
            eprintln!("{e}");
            return Err(e.into());
        }
    };

    logging::init_logging(config.log_format)?;

    tracing::info!(
        upstream = %config.upstream_url,
        relay = config.relay.enabled,
        credential = config.platform_credential.is_some(),
        "cobalt-proxy starting"
    );

    let state = AppState::from_config(config)?;
    let server = ApiServer::new(state);
    spawn_shutdown_listener(server.cancel_token());

    server.run().await?;
    tracing::info!("cobalt-proxy stopped");
    Ok(())
}

fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate => {}
        }

        tracing::info!("Shutdown signal received");
        token.cancel();
    });
}
