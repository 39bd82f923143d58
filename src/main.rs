//! `sms-relay` server: loads configuration, builds the SNS notifier and serves
//! the relay endpoint until interrupted.

use sms_relay::{build_handler, build_sns_client, logging, AppConfig};
use sms_web_axum::{router, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    logging::init(&config.logging);

    info!(
        region = %config.aws_sns.region,
        max_attempts = config.aws_sns.max_attempts,
        "Building AWS SNS client"
    );
    let client = build_sns_client(&config.aws_sns).await;
    let handler = build_handler(&config, Arc::new(client));

    let state = AppState {
        handler: Arc::new(handler),
    };
    let app = router(state, config.security.max_body_size);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
