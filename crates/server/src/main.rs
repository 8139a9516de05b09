use viewer_server::config::ServerConfig;
use viewer_server::static_server::StartOutcome;
use viewer_server::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viewer_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let state = AppState::new(&config);
    state.intake.ensure_upload_dir().await?;

    match state.static_server.start().await? {
        StartOutcome::Started(addr) => {
            tracing::info!("Assets available under http://{}/{}", addr, config.uploads_subpath)
        }
        StartOutcome::AlreadyRunning => tracing::info!(
            "Reusing static server already listening on port {}",
            config.static_port
        ),
    }

    let static_server = state.static_server.clone();
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.api_port)).await?;
    tracing::info!("Host API running on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    static_server.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
