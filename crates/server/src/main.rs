//! Entry point: load settings, build the shared state, start the HTTP
//! server with graceful shutdown on Ctrl+C/SIGTERM.

use std::net::SocketAddr;

use axum::routing::get;
use txrag_config::load_settings;
use txrag_server::telemetry::init_metrics;
use txrag_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_settings()?;

    init_tracing(&config);

    tracing::info!(
        environment = %config.environment,
        "starting transaction-RAG server"
    );

    let metrics_handle = init_metrics();
    tracing::info!("Prometheus metrics exporter installed");

    let port = config.server.port;
    let state = AppState::new(config).await?;
    let app = create_router(state).route(
        "/metrics",
        get(move || {
            let handle = metrics_handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(config: &txrag_config::Settings) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "txrag_server=info,txrag_rag=info,txrag_llm=info,tower_http=info".into());

    let fmt_layer = if config.environment.is_production() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}
