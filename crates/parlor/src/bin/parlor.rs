//! Parlor server binary.

use parlor::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cancels `token` on Ctrl+C or SIGTERM.
fn setup_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                    tracing::error!(error = %e, "failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
            _ = terminate => tracing::info!("received SIGTERM, shutting down"),
        }
        token.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<(), ParlorError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let tokens = TokenTable::parse(&std::env::var("PARLOR_TOKENS").unwrap_or_default())?;
    if tokens.is_empty() {
        tracing::warn!("PARLOR_TOKENS is empty, every connection will be rejected");
    }

    let server = ParlorServerBuilder::new().config(config).build(tokens).await?;
    let shutdown = CancellationToken::new();
    setup_shutdown_signal(shutdown.clone());
    server.run_until(shutdown).await
}
