//! Web server setup and routing

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::api;
use crate::config::TlsConfig;
use crate::state::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let models_dir = &state.config.viewer.assets.root;

    Router::new()
        // API routes
        .route("/api/catalog", get(api::get_catalog))
        .route("/api/health", get(api::health))
        // Serve models and marker patterns
        .nest_service("/models", ServeDir::new(models_dir))
        .nest_service("/patterns", ServeDir::new(&server.patterns_dir))
        // Static files (WASM frontend) - must be fallback for root
        .fallback_service(ServeDir::new(&server.web_dir))
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // State
        .with_state(state.clone())
}

/// Run the web server (HTTP or HTTPS depending on config)
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bind = state.config.server.bind.clone();
    let tls = state.config.server.tls.clone();
    let app = router(state);

    // Start server with or without TLS
    if let Some(tls_config) = tls {
        run_https(app, &bind, &tls_config).await
    } else {
        run_http(app, &bind).await
    }
}

/// Run plain HTTP server
async fn run_http(app: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run HTTPS server with TLS
async fn run_https(app: Router, bind: &str, tls: &TlsConfig) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::path::PathBuf;

    let cert_path = PathBuf::from(&tls.cert);
    let key_path = PathBuf::from(&tls.key);

    // Verify files exist
    if !cert_path.exists() {
        anyhow::bail!("TLS certificate file not found: {}", tls.cert);
    }
    if !key_path.exists() {
        anyhow::bail!("TLS key file not found: {}", tls.key);
    }

    let rustls_config = RustlsConfig::from_pem_file(&cert_path, &key_path).await?;

    let addr: std::net::SocketAddr = bind.parse()?;
    info!(address = %bind, protocol = "HTTPS", cert = %tls.cert, "Starting web server with TLS");

    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
