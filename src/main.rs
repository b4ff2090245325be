use anyhow::{Context, Result};
use clap::Parser;
use drowsiness_stream::{create_router, AppState, Config, InferenceHandle, OpenAiVisionClient};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Real-time drowsiness analysis over a websocket frame stream
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/drowsiness-stream")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    // One client per process, shared read-only by every session
    let inference = match OpenAiVisionClient::from_settings(&cfg.inference) {
        Ok(client) => InferenceHandle::ready(Arc::new(client)),
        Err(e) => {
            warn!("Inference client unavailable, sessions will be refused: {}", e);
            InferenceHandle::unavailable(e)
        }
    };

    let state = AppState::new(inference, cfg.session.clone()).with_service_name(&cfg.service.name);
    let sessions = state.sessions.clone();
    let app = create_router(state);

    let bind = args.bind.unwrap_or(cfg.service.http.bind);
    let port = args.port.unwrap_or(cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;

    info!("Listening on {}", listener.local_addr()?);
    info!("Websocket endpoint: ws://{}:{}/ws/video-analysis/", bind, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
            sessions.close_all().await;
        })
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}
