//! Places Web Server binary

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use places_map::ViewerConfig;
use places_web_server::{build_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "places_web_server=debug,places_map=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Places Web Server");

    let mut config = ViewerConfig::from_env().context("Failed to load configuration")?;
    if std::env::var("STATIC_DIR").is_err() && !config.static_dir.exists() {
        config.static_dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"));
    }
    tracing::info!("Upstream GIS API: {}", config.upstream_url);
    tracing::info!("Serving static files from: {}", config.static_dir.display());

    let port = config.server_port;
    let state = AppState::new(config).context("Failed to build upstream gateway")?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("");
    tracing::info!("===========================================");
    tracing::info!("  Places Web Server running on http://{}", addr);
    tracing::info!("===========================================");
    tracing::info!("");
    tracing::info!("UI: http://localhost:{}", port);
    tracing::info!("");
    tracing::info!("API Endpoints:");
    tracing::info!("  /api/places             - Upstream list relay");
    tracing::info!("  /api/places/:id         - Upstream detail relay");
    tracing::info!("  /api/places/types       - Known place types");
    tracing::info!("  /api/view               - Filtered view model");
    tracing::info!("  /api/cache/invalidate   - Drop cached place lists");
    tracing::info!("");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Port {} is already in use. Try: lsof -ti:{} | xargs kill -9",
                    port,
                    port
                );
            }
            return Err(e).with_context(|| format!("Failed to bind to {}", addr));
        }
    };

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
