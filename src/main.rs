mod config;
mod routes;
mod state;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::ProxyConfig::from_env().expect("invalid proxy configuration");
    let addr = std::net::SocketAddr::new(config.bind_addr, config.port);
    let backend = config.backend_url.clone();
    let static_dir = config.static_dir.display().to_string();
    if !config.static_dir.join("index.html").is_file() {
        tracing::warn!(%static_dir, "index.html not found; SPA fallback will return 404");
    }

    let state = state::AppState::new(config).expect("upstream client init failed");
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, %backend, %static_dir, "aria proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
